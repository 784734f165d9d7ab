//! Bot-versus-bot game execution.
//!
//! Each step runs every bot's update, applies the orders it wrote, ticks the
//! simulation once and then routes the tick's events back into the bots:
//!
//! - damage goes to the victim's bot, whose reaction orders are applied at once
//! - a destroyed object counts as a kill for the killer and a loss for the owner
//! - a placed structure is reported to its owner
//!
//! Bots are visited in scenario order and events in the order the
//! simulation raised them, so a seed fully determines the game.

use std::collections::BTreeSet;
use std::time::Instant;

use dune_ai::Bot;
use dune_core::error::Result as CoreResult;
use dune_core::house::HouseId;
use dune_core::orders::Orders;
use dune_core::simulation::{Simulation, TickEvents};
use dune_core::stream::{BinaryReader, BinaryWriter};
use tracing::{debug, info};

use crate::metrics::GameMetrics;
use crate::scenario::{Scenario, ScenarioError};

/// Cycles between progress log lines.
const PROGRESS_INTERVAL: u64 = 3_600;

/// Configuration for a single game run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Scenario to play.
    pub scenario: Scenario,
    /// Simulation seed.
    pub seed: u32,
    /// Maximum ticks before the game is a draw; 0 uses the scenario limit.
    pub max_ticks: u64,
    /// Game ID for tracking.
    pub game_id: String,
}

impl GameConfig {
    /// Play `scenario` with `seed` until its own time limit.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u32) -> Self {
        let game_id = format!("{}_{seed}", scenario.name);
        Self {
            scenario,
            seed,
            max_ticks: 0,
            game_id,
        }
    }
}

/// Outcome of one game.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics, including the final hash.
    pub metrics: GameMetrics,
    /// Final simulation state hash.
    pub final_state_hash: u64,
}

/// A paused game: simulation bytes plus each bot's save stream.
#[derive(Debug, Clone)]
pub struct Snapshot {
    simulation: Vec<u8>,
    bots: Vec<(HouseId, Vec<u8>)>,
    metrics: GameMetrics,
    time_limit: u64,
}

/// Runs one game between the scenario's bots.
#[derive(Debug)]
pub struct GameRunner {
    sim: Simulation,
    bots: Vec<Bot>,
    orders: Orders,
    metrics: GameMetrics,
    time_limit: u64,
}

impl GameRunner {
    /// Build the scenario world and a bot for every house that has a config.
    pub fn new(config: &GameConfig) -> Result<Self, ScenarioError> {
        let scenario = config.scenario.clone().with_seed(config.seed);
        let world = scenario.build_world()?;
        let bots: Vec<Bot> = scenario
            .houses
            .iter()
            .filter_map(|setup| setup.bot.map(|bot| Bot::new(setup.house, bot, &world)))
            .collect();

        let mut metrics = GameMetrics::new(&config.game_id, &scenario.name, config.seed);
        for setup in &scenario.houses {
            metrics.house_mut(setup.house.display_name());
        }
        let time_limit = if config.max_ticks == 0 {
            scenario.time_limit_ticks
        } else {
            config.max_ticks
        };
        debug!(game = %config.game_id, bots = bots.len(), time_limit, "game created");

        Ok(Self {
            sim: Simulation::new(world),
            bots,
            orders: Orders::new(),
            metrics,
            time_limit,
        })
    }

    /// The running simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Bots in scenario order.
    #[must_use]
    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    /// Metrics collected so far.
    #[must_use]
    pub const fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Fewer than two teams still have an active house.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        let teams: BTreeSet<u8> = self
            .sim
            .world()
            .houses()
            .filter(|h| h.active)
            .map(|h| h.team)
            .collect();
        teams.len() < 2
    }

    /// First active house of the only team left, if exactly one remains.
    #[must_use]
    pub fn winner(&self) -> Option<HouseId> {
        let mut active = self.sim.world().houses().filter(|h| h.active);
        let first = active.next()?;
        if active.all(|h| h.team == first.team) {
            Some(first.id)
        } else {
            None
        }
    }

    /// Advance one cycle.
    pub fn step(&mut self) {
        for bot in &mut self.bots {
            bot.update(self.sim.world(), &mut self.orders);
            apply(&mut self.sim, &mut self.metrics, &mut self.orders, bot.house());
        }
        let events = self.sim.tick();
        self.route(&events);

        let cycle = self.sim.game_cycle();
        if cycle % PROGRESS_INTERVAL == 0 {
            debug!(game = %self.metrics.game_id, cycle, hash = self.sim.state_hash(), "progress");
        }
    }

    fn route(&mut self, events: &TickEvents) {
        let cycle = self.sim.game_cycle();

        for event in &events.damage {
            let attacker_owner = event
                .attacker
                .and_then(|a| self.sim.world().object(a))
                .map(|a| a.owner);
            self.metrics
                .house_mut(event.victim_owner.display_name())
                .damage_taken += i64::from(event.amount);
            if let Some(owner) = attacker_owner {
                let enemy = self.sim.world().is_enemy(owner, event.victim_owner);
                let house = self.metrics.house_mut(owner.display_name());
                house.damage_dealt += i64::from(event.amount);
                if enemy && house.first_attack_tick.is_none() {
                    house.first_attack_tick = Some(cycle);
                }
            }

            if let Some(bot) = self.bots.iter_mut().find(|b| b.house() == event.victim_owner) {
                bot.on_damage(
                    self.sim.world(),
                    event.victim,
                    event.amount,
                    event.attacker,
                    &mut self.orders,
                );
                apply(&mut self.sim, &mut self.metrics, &mut self.orders, event.victim_owner);
            }
        }

        for event in &events.destroyed {
            self.metrics
                .house_mut(event.owner.display_name())
                .record_lost(event.item);
            if let Some(killer) = event.killer {
                self.metrics.house_mut(killer.display_name()).record_kill(event.item);
                if !event.item.is_structure() {
                    if let Some(bot) = self.bots.iter_mut().find(|b| b.house() == killer) {
                        bot.on_increment_unit_kills(event.item);
                    }
                }
            }
            if let Some(bot) = self.bots.iter_mut().find(|b| b.house() == event.owner) {
                if event.item.is_structure() {
                    bot.on_decrement_structures(event.item);
                } else {
                    bot.on_decrement_units(event.item);
                }
            }
        }

        for event in &events.produced {
            self.metrics
                .house_mut(event.owner.display_name())
                .record_produced(event.item);
            if event.item.is_structure() {
                if let Some(bot) = self.bots.iter_mut().find(|b| b.house() == event.owner) {
                    bot.on_increment_structures(event.item);
                }
            }
        }
    }

    /// Play until one team is left or the time limit is reached.
    pub fn run(mut self) -> GameResult {
        let start = Instant::now();
        while self.sim.game_cycle() < self.time_limit && !self.is_finished() {
            self.step();
        }
        self.finish(start)
    }

    fn finish(mut self, start: Instant) -> GameResult {
        let duration = self.sim.game_cycle();
        let winner = if self.is_finished() { self.winner() } else { None };
        let condition = match winner {
            Some(_) => "elimination",
            None if self.is_finished() => "mutual_destruction",
            None => "time_limit",
        };
        for house in self.sim.world().houses() {
            self.metrics.house_mut(house.id.display_name()).finish(house);
        }
        let hash = self.sim.state_hash();
        self.metrics.final_state_hash = hash;
        self.metrics.finalize(
            duration,
            winner.map(|w| w.display_name().to_string()),
            condition,
        );
        info!(
            game = %self.metrics.game_id,
            ticks = duration,
            winner = ?winner,
            condition,
            elapsed_ms = start.elapsed().as_millis(),
            "game finished"
        );
        GameResult {
            metrics: self.metrics,
            final_state_hash: hash,
        }
    }

    /// Capture the simulation and every bot's persistent state.
    pub fn snapshot(&self) -> CoreResult<Snapshot> {
        let simulation = self.sim.serialize()?;
        let bots = self
            .bots
            .iter()
            .map(|bot| {
                let mut writer = BinaryWriter::new(Vec::new());
                bot.save(&mut writer)?;
                Ok((bot.house(), writer.into_inner()))
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Snapshot {
            simulation,
            bots,
            metrics: self.metrics.clone(),
            time_limit: self.time_limit,
        })
    }

    /// Resume a game from a snapshot. Fails without a runner if any bot
    /// stream is invalid.
    pub fn restore(snapshot: &Snapshot) -> CoreResult<Self> {
        let sim = Simulation::deserialize(&snapshot.simulation)?;
        let bots = snapshot
            .bots
            .iter()
            .map(|(house, bytes)| Bot::load(&mut BinaryReader::new(bytes.as_slice()), *house))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Self {
            sim,
            bots,
            orders: Orders::new(),
            metrics: snapshot.metrics.clone(),
            time_limit: snapshot.time_limit,
        })
    }
}

/// Apply and clear the buffered orders of `house`.
fn apply(sim: &mut Simulation, metrics: &mut GameMetrics, orders: &mut Orders, house: HouseId) {
    if orders.is_empty() {
        return;
    }
    let applied = sim.apply_orders(house, orders);
    let entry = metrics.house_mut(house.display_name());
    entry.orders_issued += orders.len() as u64;
    entry.orders_applied += applied as u64;
    orders.take();
}

/// Run a game to completion.
pub fn run_game(config: &GameConfig) -> Result<GameResult, ScenarioError> {
    Ok(GameRunner::new(config)?.run())
}
