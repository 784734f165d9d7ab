//! # Dune Core
//!
//! Deterministic world model and sandbox simulation for a Dune II style RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond caller-supplied streams and settings files
//! - No system randomness (seeded xorshift only)
//! - No floating-point math in decisions (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`items`] - Structure and unit catalogue
//! - [`house`] - Houses, economy counters and the CHOAM market
//! - [`objects`] - Units and structures stored in the world arena
//! - [`world`] - Read-only query surface plus the mutators the simulation uses
//! - [`orders`] - Order vocabulary issued by players and bots
//! - [`simulation`] - Order execution and the per-cycle tick
//! - [`stream`] - Ordered binary stream used for save games

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod coord;
pub mod economy;
pub mod error;
pub mod house;
pub mod items;
pub mod map;
pub mod math;
pub mod movement;
pub mod objects;
pub mod orders;
pub mod production;
pub mod rng;
pub mod settings;
pub mod simulation;
pub mod stream;
pub mod tech;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::coord::Coord;
    pub use crate::error::{GameError, Result};
    pub use crate::house::{House, HouseId, SpecialWeapon};
    pub use crate::items::{ItemCounts, ItemId, ItemRole};
    pub use crate::map::{Map, TerrainType};
    pub use crate::math::Fixed;
    pub use crate::objects::{AttackMode, GameObject, Health, ObjectId, ObjectKind};
    pub use crate::orders::{Order, Orders};
    pub use crate::rng::SeededRng;
    pub use crate::settings::{milli_to_cycles, GameSettings, GameType};
    pub use crate::simulation::{DamageEvent, DestroyedEvent, ProducedEvent, Simulation, TickEvents};
    pub use crate::stream::{BinaryReader, BinaryWriter, InputStream, OutputStream};
    pub use crate::world::{PlacementRules, World};
}
