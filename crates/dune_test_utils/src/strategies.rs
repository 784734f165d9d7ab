//! Proptest strategies.
//!
//! Generate random but reproducible inputs for property-based tests of
//! geometry, placement and the planner.

use dune_core::coord::Coord;
use dune_core::house::HouseId;
use dune_core::items::ItemId;
use dune_core::settings::{GameSettings, GameType};
use proptest::prelude::*;

/// A coordinate inside a `width` x `height` map.
pub fn arb_coord(width: i32, height: i32) -> impl Strategy<Value = Coord> {
    (0..width, 0..height).prop_map(|(x, y)| Coord::new(x, y))
}

/// Any coordinate, including negative ones.
pub fn arb_any_coord() -> impl Strategy<Value = Coord> {
    (-256i32..256, -256i32..256).prop_map(|(x, y)| Coord::new(x, y))
}

/// Any playable house.
pub fn arb_house() -> impl Strategy<Value = HouseId> {
    prop::sample::select(HouseId::ALL.to_vec())
}

/// Any structure type.
pub fn arb_structure() -> impl Strategy<Value = ItemId> {
    prop::sample::select(
        ItemId::ALL
            .iter()
            .copied()
            .filter(|i| i.is_structure())
            .collect::<Vec<_>>(),
    )
}

/// Any unit type.
pub fn arb_unit() -> impl Strategy<Value = ItemId> {
    prop::sample::select(
        ItemId::ALL
            .iter()
            .copied()
            .filter(|i| i.is_unit())
            .collect::<Vec<_>>(),
    )
}

/// Settings for a custom or campaign game.
pub fn arb_settings() -> impl Strategy<Value = GameSettings> {
    (any::<bool>(), 1u8..=8, any::<bool>(), any::<u32>()).prop_map(
        |(campaign, tech_level, concrete_required, seed)| GameSettings {
            game_type: if campaign {
                GameType::Campaign
            } else {
                GameType::CustomGame
            },
            tech_level,
            concrete_required,
            seed,
            ..GameSettings::default()
        },
    )
}
