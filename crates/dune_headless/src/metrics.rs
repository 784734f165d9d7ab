//! Game metrics collection.
//!
//! Per-house counters are filled in by the game runner as it routes
//! simulation events, then serialized as JSON. Maps are ordered so two runs
//! with the same seed produce byte-identical output.

use std::collections::BTreeMap;

use dune_core::house::House;
use dune_core::items::ItemId;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u32,
    /// Total game duration in ticks.
    pub duration_ticks: u64,
    /// Winning house (None = draw).
    pub winner: Option<String>,
    /// How the game ended.
    pub win_condition: String,
    /// Per-house metrics keyed by house name.
    pub houses: BTreeMap<String, HouseMetrics>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: u32) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Get or create house metrics.
    pub fn house_mut(&mut self, house: &str) -> &mut HouseMetrics {
        self.houses
            .entry(house.to_string())
            .or_insert_with(|| HouseMetrics::new(house))
    }

    /// Finalize the game with outcome.
    pub fn finalize(&mut self, duration: u64, winner: Option<String>, condition: &str) {
        self.duration_ticks = duration;
        self.winner = winner;
        self.win_condition = condition.to_string();
    }
}

/// Metrics for one house in a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseMetrics {
    /// House name.
    pub house: String,
    /// Credits at the end of the game.
    pub final_credits: i32,
    /// Structures standing at the end.
    pub final_structures: u32,
    /// Units alive at the end.
    pub final_units: u32,
    /// Units produced by type.
    pub units_produced: BTreeMap<String, u32>,
    /// Structures placed by type.
    pub structures_built: BTreeMap<String, u32>,
    /// Units lost by type.
    pub units_lost: BTreeMap<String, u32>,
    /// Enemy units killed by type.
    pub units_killed: BTreeMap<String, u32>,
    /// Structures lost by type.
    pub structures_lost: BTreeMap<String, u32>,
    /// Total damage dealt.
    pub damage_dealt: i64,
    /// Total damage taken.
    pub damage_taken: i64,
    /// Orders the bot issued.
    pub orders_issued: u64,
    /// Orders the simulation accepted.
    pub orders_applied: u64,
    /// Tick this house first damaged an enemy.
    pub first_attack_tick: Option<u64>,
}

impl HouseMetrics {
    /// Create empty metrics for a house.
    #[must_use]
    pub fn new(house: &str) -> Self {
        Self {
            house: house.to_string(),
            ..Default::default()
        }
    }

    /// Record a produced item.
    pub fn record_produced(&mut self, item: ItemId) {
        let map = if item.is_structure() {
            &mut self.structures_built
        } else {
            &mut self.units_produced
        };
        *map.entry(item.to_string()).or_insert(0) += 1;
    }

    /// Record one of our objects dying.
    pub fn record_lost(&mut self, item: ItemId) {
        let map = if item.is_structure() {
            &mut self.structures_lost
        } else {
            &mut self.units_lost
        };
        *map.entry(item.to_string()).or_insert(0) += 1;
    }

    /// Record an enemy unit we destroyed.
    pub fn record_kill(&mut self, item: ItemId) {
        if !item.is_structure() {
            *self.units_killed.entry(item.to_string()).or_insert(0) += 1;
        }
    }

    /// Copy end-of-game totals from the house.
    pub fn finish(&mut self, house: &House) {
        self.final_credits = house.total_credits();
        self.final_structures = house.structure_count();
        self.final_units = house.owned.total_units();
    }

    /// Kill/death ratio over units.
    #[must_use]
    pub fn kd_ratio(&self) -> f64 {
        let kills: u32 = self.units_killed.values().sum();
        let losses: u32 = self.units_lost.values().sum();
        f64::from(kills) / f64::from(losses.max(1))
    }
}

/// Aggregate over a batch of games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Wins per house.
    pub wins: BTreeMap<String, u32>,
    /// Games with no winner.
    pub draws: u32,
    /// Mean game length.
    pub avg_duration_ticks: f64,
    /// Mean fraction of bot orders the simulation accepted.
    pub order_acceptance: f64,
}

impl BatchSummary {
    /// Summarize a set of games.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        let mut summary = Self {
            total_games: u32::try_from(games.len()).unwrap_or(u32::MAX),
            ..Default::default()
        };
        if games.is_empty() {
            return summary;
        }

        let mut issued = 0u64;
        let mut applied = 0u64;
        let mut ticks = 0u64;
        for game in games {
            match &game.winner {
                Some(winner) => *summary.wins.entry(winner.clone()).or_insert(0) += 1,
                None => summary.draws += 1,
            }
            ticks += game.duration_ticks;
            for house in game.houses.values() {
                issued += house.orders_issued;
                applied += house.orders_applied;
            }
        }
        summary.avg_duration_ticks = ticks as f64 / games.len() as f64;
        summary.order_acceptance = if issued == 0 {
            0.0
        } else {
            applied as f64 / issued as f64
        };
        summary
    }

    /// Win rate for a house across the batch.
    #[must_use]
    pub fn win_rate(&self, house: &str) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.wins.get(house).copied().unwrap_or(0)) / f64::from(self.total_games)
    }
}
