//! Bot configuration and timing constants.

use std::path::Path;

use dune_core::settings::{milli_to_cycles, GameSettings, GameType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cycles between two decision passes of the same bot.
pub const UPDATE_INTERVAL: u64 = 50;

/// Cycles between forced retreats.
pub const RETREAT_INTERVAL: i64 = milli_to_cycles(600_000);

/// Attack timer after a wave was launched.
pub const ATTACK_INTERVAL: i64 = milli_to_cycles(90_000);

/// Attack timer after the attack planner declined to attack.
pub const ATTACK_RETRY: i64 = milli_to_cycles(10_000);

/// Hunting units are recalled once the attack timer drops below this.
pub const HUNT_RECALL_BELOW: i64 = milli_to_cycles(30_000);

/// Error type for configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Bot config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read bot config: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse bot config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// How hard the bot plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Difficulty {
    /// Small army, few harvesters.
    Easy = 0,
    /// Default.
    #[default]
    Medium = 1,
    /// Large army.
    Hard = 2,
    /// Harvesters scale with the map, army is effectively unbounded.
    Brutal = 3,
    /// Builds up but never attacks.
    Defend = 4,
}

impl Difficulty {
    /// All difficulties in ordinal order.
    pub const ALL: [Self; 5] = [
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Brutal,
        Self::Defend,
    ];

    /// Ordinal used in timer formulas and save streams.
    #[must_use]
    pub const fn ordinal(self) -> i64 {
        self as i64
    }

    /// Decode a saved ordinal.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

/// Whether the bot replays a scenario or plays a free game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    /// Restore the scenario's starting layout, attack only once provoked.
    Campaign = 0,
    /// Follow the build ladder and attack on a timer.
    Custom = 1,
}

impl GameMode {
    /// Mode implied by the game type.
    #[must_use]
    pub const fn from_game_type(game_type: GameType) -> Self {
        match game_type {
            GameType::Campaign | GameType::Skirmish | GameType::LoadSavegame => Self::Campaign,
            GameType::CustomGame | GameType::CustomMultiplayer => Self::Custom,
        }
    }

    /// Decode a saved value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Campaign),
            1 => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Per-house bot configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Force a mode instead of deriving it from the game type.
    pub game_mode: Option<GameMode>,
}

impl BotConfig {
    /// Config with the given difficulty and a derived mode.
    #[must_use]
    pub const fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            game_mode: None,
        }
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(ron)?)
    }

    /// Mode to play in for these settings.
    #[must_use]
    pub fn resolve_mode(&self, settings: &GameSettings) -> GameMode {
        self.game_mode
            .unwrap_or_else(|| GameMode::from_game_type(settings.game_type))
    }
}
