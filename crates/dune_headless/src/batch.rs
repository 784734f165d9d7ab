//! Batch game runner.
//!
//! Runs many seeds of one scenario in parallel using rayon and aggregates
//! the results. Each game is independent, so the per-seed metrics do not
//! depend on how rayon schedules them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game_runner::{run_game, GameConfig};
use crate::metrics::{BatchSummary, GameMetrics};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in scenario name or RON path.
    pub scenario: String,
    /// Number of games to run.
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u32,
    /// Maximum ticks per game (0 = scenario limit).
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "skirmish_1v1".to_string(),
            game_count: 10,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 1,
            max_ticks: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario.
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed_start = seed;
        self
    }

    /// Cap every game at `ticks`.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = ticks;
        self
    }
}

/// Error during one game of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u32,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual game metrics in seed order.
    pub games: Vec<GameMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of games. A scenario that cannot be loaded fails the whole
/// batch; a game that cannot start is recorded in `errors`.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let scenario = Scenario::resolve(&config.scenario)?;
    scenario.validate()?;

    let start = Instant::now();
    info!(
        scenario = %scenario.name,
        games = config.game_count,
        seed_start = config.seed_start,
        "starting batch"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let completed = AtomicU32::new(0);
    let results: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(i);
            let mut game = GameConfig::new(scenario.clone(), seed);
            game.max_ticks = config.max_ticks;
            let outcome = run_game(&game).map(|r| r.metrics).map_err(|e| {
                warn!(game = i, seed, error = %e, "game failed");
                BatchError {
                    game_index: i,
                    seed,
                    message: e.to_string(),
                }
            });
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!("Progress: {}/{}", done, config.game_count);
            }
            outcome
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        games = games.len(),
        errors = errors.len(),
        draws = summary.draws,
        "batch complete in {:.1}s",
        duration_seconds
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Run the same seed `runs` times and report whether every run ended with
/// the same state hash. Returns the hashes seen.
pub fn verify_determinism(
    scenario: &Scenario,
    seed: u32,
    runs: u32,
    max_ticks: u64,
) -> Result<(bool, Vec<u64>), ScenarioError> {
    let mut config = GameConfig::new(scenario.clone(), seed);
    config.max_ticks = max_ticks;
    let hashes = (0..runs)
        .map(|_| run_game(&config).map(|r| r.final_state_hash))
        .collect::<Result<Vec<u64>, ScenarioError>>()?;
    let consistent = hashes.windows(2).all(|w| w[0] == w[1]);
    if !consistent {
        warn!(seed, ?hashes, "non-deterministic run");
    }
    Ok((consistent, hashes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("custom_scenario", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_max_ticks(100);

        assert_eq!(config.scenario, "custom_scenario");
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 100);
    }

    #[test]
    fn test_run_batch_small() {
        let config = BatchConfig::new("skirmish_1v1", 4).with_max_ticks(300);
        let results = run_batch(config).expect("batch");

        assert_eq!(results.games.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 4);
        let seeds: Vec<u32> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_scenario_fails_batch() {
        let config = BatchConfig::new("no/such/scenario.ron", 2);
        assert!(matches!(
            run_batch(config),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_verify_determinism() {
        let (consistent, hashes) =
            verify_determinism(&Scenario::skirmish_1v1(), 12345, 3, 400).expect("verify");
        assert!(consistent);
        assert_eq!(hashes.len(), 3);
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new("skirmish_1v1", 2).with_max_ticks(100))
            .expect("batch");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/results.json");

        results.save(&path).expect("save");
        assert!(path.exists());

        let loaded = BatchResults::load(&path).expect("load");
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.scenario, "skirmish_1v1");
    }
}
