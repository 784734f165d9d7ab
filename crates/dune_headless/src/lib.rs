//! Headless bot-versus-bot runner.
//!
//! Loads a scenario, gives every configured house a [`dune_ai::Bot`], and
//! plays the sandbox simulation without graphics. Used for:
//!
//! - **AI testing**: watch bots build, attack and retreat via metrics
//! - **Batch runs**: many seeds in parallel, summarized as JSON
//! - **Determinism checks**: the same seed must end on the same state hash
//!
//! # Output
//!
//! - **stdout**: JSON results
//! - **stderr**: logs (`RUST_LOG` or `--verbose`)
//!
//! # Example
//!
//! ```bash
//! cargo run -p dune_headless -- run --scenario skirmish_1v1 --seed 7
//! cargo run -p dune_headless -- batch --count 100 --output results/
//! cargo run -p dune_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod game_runner;
pub mod metrics;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use game_runner::{run_game, GameConfig, GameResult, GameRunner, Snapshot};
pub use metrics::{BatchSummary, GameMetrics, HouseMetrics};
pub use scenario::{Scenario, ScenarioError};
