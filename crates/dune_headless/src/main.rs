//! Headless Dune bot runner.
//!
//! # Usage
//!
//! ```bash
//! # One game, metrics as JSON on stdout
//! cargo run -p dune_headless -- run --scenario skirmish_1v1 --seed 7
//!
//! # Batch of seeds in parallel
//! cargo run -p dune_headless -- batch --count 100 --output results/
//!
//! # Determinism check
//! cargo run -p dune_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Logs go to stderr; stdout carries only JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dune_headless::{run_batch, run_game, verify_determinism, BatchConfig, GameConfig, Scenario};

#[derive(Parser)]
#[command(name = "dune_headless")]
#[command(about = "Headless Dune bot runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game and print its metrics
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish_1v1")]
        scenario: String,

        /// Simulation seed
        #[arg(long, default_value = "1")]
        seed: u32,

        /// Maximum ticks (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,
    },

    /// Run a batch of seeds in parallel
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish_1v1")]
        scenario: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Seed of the first game
        #[arg(long, default_value = "1")]
        seed: u32,

        /// Maximum ticks per game (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "skirmish_1v1")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u32,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Maximum ticks per run (0 = scenario limit)
        #[arg(long, default_value = "3600")]
        max_ticks: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr, stdout is for JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run {
            scenario,
            seed,
            max_ticks,
        } => cmd_run(&scenario, seed, max_ticks),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_ticks,
        } => cmd_batch(scenario, count, parallel, output, seed, max_ticks),
        Commands::Verify {
            scenario,
            seed,
            runs,
            max_ticks,
        } => cmd_verify(&scenario, seed, runs, max_ticks),
    };

    match outcome {
        Ok(code) => code,
        Err(message) => {
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

/// Run one game
fn cmd_run(scenario: &str, seed: u32, max_ticks: u64) -> Result<ExitCode, String> {
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    tracing::info!(scenario = %scenario.name, seed, "starting game");
    let mut config = GameConfig::new(scenario, seed);
    config.max_ticks = max_ticks;
    let result = run_game(&config).map_err(|e| e.to_string())?;
    print_json(&result.metrics)?;
    Ok(ExitCode::SUCCESS)
}

/// Run a batch and save it under the output directory
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u32,
    max_ticks: u64,
) -> Result<ExitCode, String> {
    std::fs::create_dir_all(&output)
        .map_err(|e| format!("cannot create output directory '{}': {e}", output.display()))?;

    let config = BatchConfig {
        scenario,
        game_count: count,
        parallel_games: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_ticks,
    };
    let results = run_batch(config).map_err(|e| e.to_string())?;

    let path = output.join("batch_results.json");
    results
        .save(&path)
        .map_err(|e| format!("failed to save results to '{}': {e}", path.display()))?;
    tracing::info!(path = %path.display(), "results saved");

    print_json(&results.summary)?;
    if results.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Check that repeated runs end on the same hash
fn cmd_verify(scenario: &str, seed: u32, runs: u32, max_ticks: u64) -> Result<ExitCode, String> {
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    let (consistent, hashes) =
        verify_determinism(&scenario, seed, runs, max_ticks).map_err(|e| e.to_string())?;
    print_json(&serde_json::json!({
        "scenario": scenario.name,
        "seed": seed,
        "deterministic": consistent,
        "hashes": hashes,
    }))?;
    if consistent {
        tracing::info!(seed, runs, "determinism verified");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(seed, runs, "determinism check failed");
        Ok(ExitCode::FAILURE)
    }
}
