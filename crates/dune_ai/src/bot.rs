//! The per-house bot controller.

use dune_core::coord::Coord;
use dune_core::error::{GameError, Result};
use dune_core::house::{House, HouseId};
use dune_core::items::ItemId;
use dune_core::objects::ObjectId;
use dune_core::orders::Orders;
use dune_core::settings::milli_to_cycles;
use dune_core::stream::{InputStream, OutputStream};
use dune_core::world::World;
use tracing::{debug, trace};

use crate::config::{BotConfig, Difficulty, GameMode, UPDATE_INTERVAL};
use crate::geometry;
use crate::placement::PlacementSearch;
use crate::planner::{self, compute_limits, BuildPass};
use crate::state::BotState;

/// Milliseconds taken off the attack timer per credit of a kill.
pub const KILL_MILLIS_PER_CREDIT: i64 = 15;
/// Milliseconds added to the attack timer per credit of a loss, before
/// dividing by difficulty.
pub const LOSS_MILLIS_PER_CREDIT: i64 = 30;

/// Computer opponent for one house.
#[derive(Debug, Clone)]
pub struct Bot {
    pub(crate) state: BotState,
    pub(crate) search: PlacementSearch,
}

impl Bot {
    /// Create a bot for `house` in `world`.
    #[must_use]
    pub fn new(house: HouseId, config: BotConfig, world: &World) -> Self {
        let settings = world.settings();
        let mode = config.resolve_mode(settings);
        let mut state = BotState::new(house, config.difficulty, mode, settings);
        state.limits = compute_limits(
            mode,
            config.difficulty,
            settings.tech_level,
            world.map().area(),
            None,
            0,
        );
        debug!(house = %house, difficulty = ?config.difficulty, mode = ?mode, "bot created");
        Self {
            state,
            search: PlacementSearch::new(),
        }
    }

    /// Controlled house.
    #[must_use]
    pub fn house(&self) -> HouseId {
        self.state.house
    }

    /// Difficulty.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.state.difficulty
    }

    /// Mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    /// Persistent state.
    #[must_use]
    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Mutable persistent state, for scenario setup and tests.
    pub fn state_mut(&mut self) -> &mut BotState {
        &mut self.state
    }

    /// Run one tick. Does nothing except on this house's update cycle, or
    /// when the house is gone or defeated.
    pub fn update(&mut self, world: &World, orders: &mut Orders) {
        let id = self.state.house;
        if (world.game_cycle() + id.index() as u64) % UPDATE_INTERVAL != 0 {
            return;
        }
        let Some(house) = world.house(id) else {
            return;
        };
        if !house.active {
            return;
        }
        let step = UPDATE_INTERVAL as i64;

        self.state.squad_center = geometry::squad_center(world, id, self.state.rally);
        if !self.state.rally.is_valid() || self.state.rally.is_origin() {
            self.state.rally = geometry::squad_rally_location(world, id);
            self.state.retreat = geometry::squad_retreat_location(world, id, self.state.rally);
        }

        if self.state.build_timer <= 0 {
            self.build(world, house, orders);
            self.state.build_timer = i64::from(self.state.rng.next_range(0, 4)) * step;
        } else {
            self.state.build_timer -= step;
        }

        if self.state.attack_timer <= 0 {
            self.attack(world, house, orders);
        } else {
            self.state.attack_timer -= step;
        }

        self.check_all_units(world, house, orders);

        if self.state.retreat_timer <= 0 {
            self.retreat_all_units(world, orders);
        } else {
            self.state.retreat_timer -= step;
        }
    }

    fn build(&mut self, world: &World, house: &House, orders: &mut Orders) {
        let settings = world.settings();
        let mode = self.state.mode;
        if mode == GameMode::Campaign && self.state.initial_counts.is_none() {
            let counts = planner::tally_items(world, house);
            self.state.initial_counts = Some(planner::campaign_snapshot(&counts, settings.tech_level));
            self.state.initial_military_value = geometry::military_value(house);
            debug!(house = %house.id, value = self.state.initial_military_value, "campaign snapshot taken");
        }
        self.state.limits = compute_limits(
            mode,
            self.state.difficulty,
            settings.tech_level,
            world.map().area(),
            self.state.initial_counts.as_ref(),
            self.state.initial_military_value,
        );
        BuildPass::new(
            world,
            house,
            mode,
            self.state.difficulty,
            self.state.limits,
            self.state.initial_counts.as_ref(),
            self.state.rally,
            &mut self.search,
            &mut self.state.place_hints,
            orders,
        )
        .run();
    }

    /// We destroyed an enemy unit: attack sooner.
    pub fn on_increment_unit_kills(&mut self, item: ItemId) {
        if item.is_infantry() {
            return;
        }
        self.state.attack_timer -= milli_to_cycles(i64::from(item.price()) * KILL_MILLIS_PER_CREDIT);
        trace!(house = %self.state.house, item = %item, timer = self.state.attack_timer, "kill");
    }

    /// We lost a unit: attack later, less so on harder difficulties.
    pub fn on_decrement_units(&mut self, item: ItemId) {
        if item.is_infantry() {
            return;
        }
        let millis = i64::from(item.price()) * LOSS_MILLIS_PER_CREDIT / (self.state.difficulty.ordinal() + 1);
        self.state.attack_timer += milli_to_cycles(millis);
        trace!(house = %self.state.house, item = %item, timer = self.state.attack_timer, "loss");
    }

    /// A structure was added.
    pub fn on_increment_structures(&mut self, item: ItemId) {
        trace!(house = %self.state.house, item = %item, "structure added");
    }

    /// A structure was lost.
    pub fn on_decrement_structures(&mut self, item: ItemId) {
        trace!(house = %self.state.house, item = %item, "structure lost");
    }

    /// One of our objects took damage.
    pub fn on_damage(
        &mut self,
        world: &World,
        victim: ObjectId,
        amount: i32,
        attacker: Option<ObjectId>,
        orders: &mut Orders,
    ) {
        self.react_to_damage(world, victim, amount, attacker, orders);
    }

    /// Recompute the rally and retreat points now.
    pub fn refresh_rally(&mut self, world: &World) -> (Coord, Coord) {
        let id = self.state.house;
        self.state.rally = geometry::squad_rally_location(world, id);
        self.state.retreat = geometry::squad_retreat_location(world, id, self.state.rally);
        (self.state.rally, self.state.retreat)
    }

    /// Write the bot's state.
    pub fn save(&self, out: &mut impl OutputStream) -> Result<()> {
        self.state.save(out)
    }

    /// Restore a bot for `house`. Nothing is constructed unless the whole
    /// stream is valid.
    pub fn load(input: &mut impl InputStream, house: HouseId) -> Result<Self> {
        let state = BotState::load(input, house)?;
        if state.limits.harvester_limit < 1 {
            return Err(GameError::InvalidState(format!(
                "harvester limit {} for {house}",
                state.limits.harvester_limit
            )));
        }
        Ok(Self {
            state,
            search: PlacementSearch::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dune_core::orders::Order;
    use dune_core::stream::{BinaryReader, BinaryWriter};
    use dune_test_utils::fixtures::skirmish_world;

    use crate::config::ATTACK_RETRY;

    #[test]
    fn test_update_runs_only_on_house_cycle() {
        let world = skirmish_world();
        let mut bot = Bot::new(HouseId::Atreides, BotConfig::default(), &world);
        let mut orders = Orders::new();
        // Atreides has index 1, so cycle 0 is not its turn.
        bot.update(&world, &mut orders);
        assert!(orders.is_empty());
        assert_eq!(bot.state().rally, Coord::default());
    }

    #[test]
    fn test_kill_and_loss_adjust_attack_timer() {
        let world = skirmish_world();
        let mut bot = Bot::new(HouseId::Atreides, BotConfig::new(Difficulty::Easy), &world);
        let start = bot.state().attack_timer;
        bot.on_increment_unit_kills(ItemId::Tank);
        assert_eq!(bot.state().attack_timer, start - milli_to_cycles(4500));
        bot.on_increment_unit_kills(ItemId::Soldier);
        assert_eq!(bot.state().attack_timer, start - milli_to_cycles(4500));
        bot.on_decrement_units(ItemId::Tank);
        assert_eq!(
            bot.state().attack_timer,
            start - milli_to_cycles(4500) + milli_to_cycles(9000)
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let world = skirmish_world();
        let mut bot = Bot::new(HouseId::Harkonnen, BotConfig::new(Difficulty::Hard), &world);
        bot.state_mut().attack_timer = ATTACK_RETRY;
        let mut writer = BinaryWriter::new(Vec::new());
        bot.save(&mut writer).expect("save");
        let bytes = writer.into_inner();
        let loaded = Bot::load(&mut BinaryReader::new(bytes.as_slice()), HouseId::Harkonnen)
            .expect("load");
        assert_eq!(loaded.state(), bot.state());
    }

    #[test]
    fn test_first_pass_queues_work() {
        let world = skirmish_world();
        let mut bot = Bot::new(HouseId::Harkonnen, BotConfig::default(), &world);
        let mut orders = Orders::new();
        // Harkonnen has index 0 and thinks on cycle 0.
        bot.update(&world, &mut orders);
        assert!(orders
            .iter()
            .any(|o| matches!(o, Order::ProduceItem { .. })));
        assert!(bot.state().rally.is_valid());
    }
}
