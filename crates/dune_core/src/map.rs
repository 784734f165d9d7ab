//! Tile map: terrain plus structure and ground-unit occupancy.

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::objects::ObjectId;

/// Terrain of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainType {
    /// Open desert.
    #[default]
    Sand,
    /// Dunes (slow).
    Dunes,
    /// Buildable rock.
    Rock,
    /// Concrete slab on rock.
    Slab,
    /// Impassable to vehicles.
    Mountain,
    /// Harvestable spice.
    Spice,
    /// Dense harvestable spice.
    ThickSpice,
}

impl TerrainType {
    /// Structures may stand on this terrain.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Rock | Self::Slab)
    }

    /// Rock-like ground (rock, slab, mountain).
    #[must_use]
    pub const fn is_rock(self) -> bool {
        matches!(self, Self::Rock | Self::Slab | Self::Mountain)
    }

    /// Harvesters collect here.
    #[must_use]
    pub const fn is_spice(self) -> bool {
        matches!(self, Self::Spice | Self::ThickSpice)
    }
}

/// One map tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain type.
    pub terrain: TerrainType,
    /// Spice left on the tile.
    pub spice: i32,
    /// Structure covering the tile.
    pub structure: Option<ObjectId>,
    /// Ground units standing on the tile.
    pub units: Vec<ObjectId>,
}

/// Rectangular tile grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Map {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Map {
    /// Spice placed on a fresh spice tile.
    pub const SPICE_PER_TILE: i32 = 200;
    /// Spice placed on a fresh thick-spice tile.
    pub const THICK_SPICE_PER_TILE: i32 = 400;

    /// Create an all-sand map.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
        }
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Width times height.
    #[must_use]
    pub const fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Tile lies on the map.
    #[must_use]
    pub const fn contains(&self, c: Coord) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    /// Tile lies on the outermost ring.
    #[must_use]
    pub const fn is_edge(&self, c: Coord) -> bool {
        c.x == 0 || c.y == 0 || c.x == self.width - 1 || c.y == self.height - 1
    }

    fn index(&self, c: Coord) -> Option<usize> {
        self.contains(c).then(|| (c.y * self.width + c.x) as usize)
    }

    /// Tile at a coordinate.
    #[must_use]
    pub fn tile(&self, c: Coord) -> Option<&Tile> {
        self.index(c).and_then(|i| self.tiles.get(i))
    }

    /// Mutable tile at a coordinate.
    pub fn tile_mut(&mut self, c: Coord) -> Option<&mut Tile> {
        self.index(c).and_then(|i| self.tiles.get_mut(i))
    }

    /// Terrain at a coordinate.
    #[must_use]
    pub fn terrain(&self, c: Coord) -> Option<TerrainType> {
        self.tile(c).map(|t| t.terrain)
    }

    /// Set terrain, seeding spice amounts for spice tiles.
    pub fn set_terrain(&mut self, c: Coord, terrain: TerrainType) {
        if let Some(tile) = self.tile_mut(c) {
            tile.terrain = terrain;
            tile.spice = match terrain {
                TerrainType::Spice => Self::SPICE_PER_TILE,
                TerrainType::ThickSpice => Self::THICK_SPICE_PER_TILE,
                _ => 0,
            };
        }
    }

    /// Fill a rectangle with one terrain type.
    pub fn fill(&mut self, origin: Coord, width: i32, height: i32, terrain: TerrainType) {
        for y in origin.y..origin.y + height {
            for x in origin.x..origin.x + width {
                self.set_terrain(Coord::new(x, y), terrain);
            }
        }
    }

    /// Structure standing on the tile.
    #[must_use]
    pub fn structure_at(&self, c: Coord) -> Option<ObjectId> {
        self.tile(c).and_then(|t| t.structure)
    }

    /// Some ground unit stands on the tile.
    #[must_use]
    pub fn has_ground_unit(&self, c: Coord) -> bool {
        self.tile(c).is_some_and(|t| !t.units.is_empty())
    }

    /// Tile is on the map and its terrain takes structures.
    #[must_use]
    pub fn is_buildable(&self, c: Coord) -> bool {
        self.terrain(c).is_some_and(TerrainType::is_buildable)
    }

    /// Remove up to `amount` spice from a tile, turning it to sand when empty.
    pub fn harvest(&mut self, c: Coord, amount: i32) -> i32 {
        let Some(tile) = self.tile_mut(c) else {
            return 0;
        };
        if !tile.terrain.is_spice() {
            return 0;
        }
        let taken = amount.min(tile.spice);
        tile.spice -= taken;
        if tile.spice <= 0 {
            tile.terrain = TerrainType::Sand;
            tile.spice = 0;
        }
        taken
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| Coord::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_edges() {
        let map = Map::new(16, 8);
        assert_eq!(map.area(), 128);
        assert!(map.contains(Coord::new(15, 7)));
        assert!(!map.contains(Coord::new(16, 0)));
        assert!(!map.contains(Coord::INVALID));
        assert!(map.is_edge(Coord::new(0, 3)));
        assert!(map.is_edge(Coord::new(5, 7)));
        assert!(!map.is_edge(Coord::new(5, 5)));
    }

    #[test]
    fn test_buildable_terrain() {
        let mut map = Map::new(8, 8);
        map.fill(Coord::new(2, 2), 3, 3, TerrainType::Rock);
        map.set_terrain(Coord::new(3, 3), TerrainType::Mountain);
        assert!(map.is_buildable(Coord::new(2, 2)));
        assert!(!map.is_buildable(Coord::new(3, 3)));
        assert!(!map.is_buildable(Coord::new(0, 0)));
        assert!(map.terrain(Coord::new(3, 3)).is_some_and(TerrainType::is_rock));
    }

    #[test]
    fn test_harvest_depletes_tile() {
        let mut map = Map::new(4, 4);
        let c = Coord::new(1, 1);
        map.set_terrain(c, TerrainType::Spice);
        assert_eq!(map.harvest(c, 150), 150);
        assert_eq!(map.harvest(c, 150), 50);
        assert_eq!(map.terrain(c), Some(TerrainType::Sand));
        assert_eq!(map.harvest(c, 10), 0);
    }

    #[test]
    fn test_coords_row_major() {
        let map = Map::new(3, 2);
        let coords: Vec<Coord> = map.coords().collect();
        assert_eq!(coords[1], Coord::new(1, 0));
        assert_eq!(coords[3], Coord::new(0, 1));
    }
}
