//! # Dune AI
//!
//! Computer opponent for Dune II style skirmishes and campaigns.
//!
//! A [`Bot`] controls one house. Once every [`config::UPDATE_INTERVAL`]
//! cycles (staggered by house so several bots never think on the same
//! cycle) it reads the [`World`](dune_core::world::World) and writes
//! intents into an [`Orders`](dune_core::orders::Orders) buffer:
//!
//! - [`placement`] - where to put the next structure
//! - [`geometry`] - squad center, rally point, base centre, retreat point
//! - [`planner`] - what to build, repair and upgrade
//! - [`posture`] - attack, defend, scramble and retreat
//!
//! The bot never mutates the world directly. Every id it holds is
//! re-resolved before use; a destroyed object is simply skipped.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod bot;
pub mod config;
pub mod geometry;
pub mod placement;
pub mod planner;
pub mod posture;
pub mod state;

pub use bot::Bot;
pub use config::{BotConfig, Difficulty, GameMode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bot::Bot;
    pub use crate::config::{BotConfig, ConfigError, Difficulty, GameMode};
    pub use crate::placement::PlacementSearch;
    pub use crate::state::BotState;
}
