//! Integer tile coordinates.

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::math::{fixed_sqrt, Fixed, SQRT2_MINUS_ONE};

/// Integer 2D tile coordinate.
///
/// [`Coord::INVALID`] stands for "no location found" and is distinct from
/// every valid tile. The origin is valid as a tile but is also the value the
/// bot's cached geometry starts with, so [`Coord::is_origin`] is used to
/// detect "not yet computed".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coord {
    /// Tile column.
    pub x: i32,
    /// Tile row.
    pub y: i32,
}

impl Coord {
    /// The "no location" sentinel.
    pub const INVALID: Self = Self { x: -1, y: -1 };

    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True unless either axis is negative.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    /// True for `(0, 0)`.
    #[must_use]
    pub const fn is_origin(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Chebyshev distance (king moves).
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Block distance: straight steps cost 1, diagonal steps cost `sqrt(2)`.
    #[must_use]
    pub fn block_distance(self, other: Self) -> Fixed {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
        Fixed::from_num(long) + SQRT2_MINUS_ONE * Fixed::from_num(short)
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        fixed_sqrt(Fixed::saturating_from_num(dx * dx + dy * dy))
    }

    /// One step toward `target` in any of the eight directions.
    #[must_use]
    pub fn step_toward(self, target: Self) -> Self {
        Self {
            x: self.x + (target.x - self.x).signum(),
            y: self.y + (target.y - self.y).signum(),
        }
    }
}

impl Add for Coord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Coord {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<i32> for Coord {
    type Output = Self;

    fn div(self, rhs: i32) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}
