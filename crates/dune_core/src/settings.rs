//! Game-wide settings loaded from RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Milliseconds of game time per simulation cycle at default speed.
pub const MILLIS_PER_CYCLE: i64 = 16;

/// Convert game-time milliseconds to simulation cycles.
#[must_use]
pub const fn milli_to_cycles(millis: i64) -> i64 {
    millis / MILLIS_PER_CYCLE
}

/// How the game was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameType {
    /// Story mission.
    Campaign,
    /// Single skirmish mission.
    Skirmish,
    /// Restored from a save.
    LoadSavegame,
    /// Custom single-player map.
    #[default]
    CustomGame,
    /// Custom multiplayer map.
    CustomMultiplayer,
}

/// Settings shared by every house.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// How the game was started.
    pub game_type: GameType,
    /// Mission tech level (1-8).
    pub tech_level: u8,
    /// Structures not on concrete slowly lose health.
    pub concrete_required: bool,
    /// Units may request carryall drops.
    pub manual_carryall_drops: bool,
    /// At most one palace per house.
    pub only_one_palace: bool,
    /// Seed for the simulation RNG.
    pub seed: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            game_type: GameType::CustomGame,
            tech_level: 8,
            concrete_required: false,
            manual_carryall_drops: false,
            only_one_palace: true,
            seed: 1,
        }
    }
}

impl GameSettings {
    /// Parse settings from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load settings from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        ron::from_str(&contents).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milli_to_cycles() {
        assert_eq!(milli_to_cycles(10_000), 625);
        assert_eq!(milli_to_cycles(4_500), 281);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let settings =
            GameSettings::from_ron_str("(game_type: Campaign, tech_level: 6)").expect("parse");
        assert_eq!(settings.game_type, GameType::Campaign);
        assert_eq!(settings.tech_level, 6);
        assert!(settings.only_one_palace);
    }

    #[test]
    fn test_bad_ron_is_error() {
        assert!(matches!(
            GameSettings::from_ron_str("(tech_level: \"x\")"),
            Err(GameError::DataParseError { .. })
        ));
    }
}
