//! Harvester and army ceilings.
//!
//! The table is tuned per mode and difficulty and is kept literal.

use dune_core::items::{ItemCounts, ItemId};

use crate::config::{Difficulty, GameMode};

/// Ceilings the planner builds toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Maximum harvesters (at least one).
    pub harvester_limit: i32,
    /// Military value the bot stops producing at.
    pub military_value_limit: i32,
}

/// Compute the ceilings.
///
/// `initial` and `initial_military_value` come from the campaign snapshot
/// and are ignored in custom games.
#[must_use]
pub fn compute_limits(
    mode: GameMode,
    difficulty: Difficulty,
    tech_level: u8,
    map_area: i32,
    initial: Option<&ItemCounts>,
    initial_military_value: i32,
) -> Limits {
    let (harvester_limit, military_value_limit) = match mode {
        GameMode::Campaign => {
            let refineries = initial.map_or(0, |c| c.get(ItemId::Refinery)) as i32;
            match difficulty {
                Difficulty::Easy => {
                    let value = if tech_level >= 8 {
                        4000
                    } else {
                        initial_military_value
                    };
                    (refineries, value)
                }
                Difficulty::Medium => ((refineries * 2).max(4), initial_military_value * 3 / 2),
                Difficulty::Hard => (refineries * 3, initial_military_value * 2),
                Difficulty::Brutal => (map_area / 512, 100_000),
                Difficulty::Defend => (refineries * 2, initial_military_value * 9 / 5),
            }
        }
        GameMode::Custom => match difficulty {
            Difficulty::Easy => (map_area / 1024, 4000),
            Difficulty::Medium | Difficulty::Defend => (map_area / 640, 10_000),
            Difficulty::Hard => (map_area / 480, 20_000),
            Difficulty::Brutal => (map_area / 320, 100_000),
        },
    };
    Limits {
        harvester_limit: harvester_limit.max(1),
        military_value_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_limits_scale_with_area() {
        let area = 128 * 128;
        let limits = compute_limits(GameMode::Custom, Difficulty::Brutal, 8, area, None, 0);
        assert_eq!(limits.harvester_limit, area / 320);
        assert_eq!(limits.military_value_limit, 100_000);

        let limits = compute_limits(GameMode::Custom, Difficulty::Easy, 8, area, None, 0);
        assert_eq!(limits.harvester_limit, 16);
        assert_eq!(limits.military_value_limit, 4000);
    }

    #[test]
    fn test_campaign_easy_uses_snapshot() {
        let mut initial = ItemCounts::new();
        initial.set(ItemId::Refinery, 2);
        let limits = compute_limits(
            GameMode::Campaign,
            Difficulty::Easy,
            5,
            64 * 64,
            Some(&initial),
            2500,
        );
        assert_eq!(limits.harvester_limit, 2);
        assert_eq!(limits.military_value_limit, 2500);

        let limits = compute_limits(
            GameMode::Campaign,
            Difficulty::Easy,
            8,
            64 * 64,
            Some(&initial),
            2500,
        );
        assert_eq!(limits.military_value_limit, 4000);
    }

    #[test]
    fn test_campaign_medium_has_harvester_floor() {
        let mut initial = ItemCounts::new();
        initial.set(ItemId::Refinery, 1);
        let limits = compute_limits(
            GameMode::Campaign,
            Difficulty::Medium,
            4,
            64 * 64,
            Some(&initial),
            1000,
        );
        assert_eq!(limits.harvester_limit, 4);
        assert_eq!(limits.military_value_limit, 1500);
    }

    #[test]
    fn test_harvester_limit_never_zero() {
        let limits = compute_limits(GameMode::Custom, Difficulty::Easy, 8, 16 * 16, None, 0);
        assert_eq!(limits.harvester_limit, 1);
        let limits = compute_limits(GameMode::Campaign, Difficulty::Hard, 8, 16 * 16, None, 0);
        assert_eq!(limits.harvester_limit, 1);
    }
}
