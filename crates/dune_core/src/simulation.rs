//! Order execution and the per-cycle tick.
//!
//! The simulation owns the [`World`] and the game RNG. Players and bots hand
//! it [`Orders`]; each order is validated against the current state and
//! either applied or rejected with a [`GameError`]. [`Simulation::tick`]
//! then advances every system by one cycle in a fixed order:
//!
//! 1. Production and upgrades
//! 2. Repairs, concrete degradation and palace charge
//! 3. Carryall drops and harvesting
//! 4. Movement
//! 5. Target acquisition, weapon fire and deviation expiry
//! 6. Power, storage, build lists and the CHOAM market
//!
//! # Determinism
//!
//! Objects are visited in id order, all randomness comes from the seeded
//! generator, and decisions use integer or fixed-point math only. Two
//! simulations fed the same orders produce the same [`Simulation::state_hash`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::combat;
use crate::coord::Coord;
use crate::economy;
use crate::error::{GameError, Result};
use crate::house::{HouseId, SpecialWeapon};
use crate::items::ItemId;
use crate::map::TerrainType;
use crate::movement;
use crate::objects::{AttackMode, GameObject, ObjectId};
use crate::orders::{Order, Orders};
use crate::production::ProductionItem;
use crate::rng::SeededRng;
use crate::world::{PlacementRules, World};

/// Radius of a Death Hand impact.
pub const DEATH_HAND_RADIUS: i32 = 3;
/// Damage of a Death Hand impact.
pub const DEATH_HAND_DAMAGE: i32 = 500;
/// Maximum Death Hand scatter per axis.
pub const DEATH_HAND_SCATTER: i32 = 2;
/// Troopers summoned by the Fremen superweapon.
pub const FREMEN_TROOPERS: usize = 3;

/// An object took damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Damaged object.
    pub victim: ObjectId,
    /// Owner of the damaged object at the time of the hit.
    pub victim_owner: HouseId,
    /// Object that dealt the damage, if any.
    pub attacker: Option<ObjectId>,
    /// Health removed.
    pub amount: i32,
}

/// An object was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyedEvent {
    /// Destroyed object.
    pub id: ObjectId,
    /// Its type.
    pub item: ItemId,
    /// Its owner.
    pub owner: HouseId,
    /// House credited with the kill.
    pub killer: Option<HouseId>,
    /// Where it stood.
    pub location: Coord,
}

/// A builder finished an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedEvent {
    /// Producing structure.
    pub builder: ObjectId,
    /// Owner of the builder.
    pub owner: HouseId,
    /// Item produced.
    pub item: ItemId,
    /// Object created, `None` for slabs which only change terrain.
    pub object: Option<ObjectId>,
}

/// Events generated while applying orders and ticking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Damage dealt.
    pub damage: Vec<DamageEvent>,
    /// Objects destroyed.
    pub destroyed: Vec<DestroyedEvent>,
    /// Items completed.
    pub produced: Vec<ProducedEvent>,
}

impl TickEvents {
    /// No events were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.damage.is_empty() && self.destroyed.is_empty() && self.produced.is_empty()
    }

    /// Append another batch of events.
    pub fn extend(&mut self, other: Self) {
        self.damage.extend(other.damage);
        self.destroyed.extend(other.destroyed);
        self.produced.extend(other.produced);
    }
}

/// The sandbox game simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    world: World,
    rng: SeededRng,
    /// Events raised by orders, delivered with the next tick.
    #[serde(skip)]
    pending: TickEvents,
}

fn reject(message: impl Into<String>) -> GameError {
    GameError::InvalidOrder(message.into())
}

fn upgrade_time(item: ItemId) -> u32 {
    (item.data().build_time / 2).max(1)
}

impl Simulation {
    /// Wrap a world, seeding the RNG from its settings.
    #[must_use]
    pub fn new(world: World) -> Self {
        let rng = SeededRng::new(world.settings().seed);
        let mut sim = Self {
            world,
            rng,
            pending: TickEvents::default(),
        };
        economy::refresh_houses(&mut sim.world);
        sim
    }

    /// Current world state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world, for scenario setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Cycles simulated so far.
    #[must_use]
    pub const fn game_cycle(&self) -> u64 {
        self.world.game_cycle()
    }

    /// Deterministic hash of world and RNG state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.world.state_hash() ^ u64::from(self.rng.state()).rotate_left(32)
    }

    /// Apply every order in the buffer on behalf of `house`, logging the
    /// rejected ones. Returns the number of orders that were applied.
    pub fn apply_orders(&mut self, house: HouseId, orders: &Orders) -> usize {
        let mut applied = 0;
        for order in orders.iter() {
            match self.apply_order(house, *order) {
                Ok(()) => applied += 1,
                Err(err) => debug!(house = %house, ?order, %err, "order rejected"),
            }
        }
        applied
    }

    /// Validate and execute one order.
    ///
    /// # Errors
    ///
    /// Returns an error when the actor does not exist, belongs to another
    /// house, or the order is not legal in the current state.
    pub fn apply_order(&mut self, house: HouseId, order: Order) -> Result<()> {
        let actor = order.actor();
        let object = self
            .world
            .object(actor)
            .ok_or(GameError::ObjectNotFound(actor.0))?;
        if object.owner != house {
            return Err(reject(format!("{actor} is not owned by {house}")));
        }
        trace!(house = %house, ?order, "apply order");

        match order {
            Order::ProduceItem { builder, item } => self.produce_item(house, builder, item),
            Order::PlaceStructure { builder, location } => {
                self.place_structure(house, builder, location)
            }
            Order::CancelItem { builder, item } => self.cancel_item(house, builder, item),
            Order::Upgrade { builder } => self.upgrade(house, builder),
            Order::Repair { object } => self.repair(house, object),
            Order::SetAttackMode { unit, mode } => self.set_attack_mode(unit, mode),
            Order::Move {
                unit,
                destination,
                forced,
            } => self.move_unit(unit, destination, forced),
            Order::AttackObject {
                unit,
                target,
                forced,
            } => self.attack_object(house, unit, target, forced),
            Order::Deploy { unit } => self.deploy(house, unit),
            Order::LaunchSpecialWeapon { palace, target } => {
                self.launch_special_weapon(house, palace, target)
            }
            Order::RequestCarryallDrop { unit } => self.request_carryall_drop(house, unit),
            Order::Devastate { unit } => {
                if self.world.object(unit).map(|o| o.item) != Some(ItemId::Devastator) {
                    return Err(reject(format!("{unit} cannot devastate")));
                }
                combat::devastate(&mut self.world, unit, &mut self.pending);
                Ok(())
            }
        }
    }

    fn produce_item(&mut self, house: HouseId, builder: ObjectId, item: ItemId) -> Result<()> {
        let object = self
            .world
            .object(builder)
            .ok_or(GameError::ObjectNotFound(builder.0))?;
        let state = object
            .structure()
            .ok_or_else(|| reject(format!("{builder} is not a structure")))?;
        if !state.is_available_to_build(item) {
            return Err(reject(format!("{item} is not available at {builder}")));
        }
        if state.production.is_full() || state.is_upgrading() {
            return Err(reject(format!("{builder} cannot queue more")));
        }
        let from_star_port = object.item == ItemId::StarPort;

        let owner = self
            .world
            .house_mut(house)
            .ok_or_else(|| GameError::HouseNotFound(house.to_string()))?;
        let price = if from_star_port {
            owner
                .choam
                .price(item)
                .ok_or_else(|| reject(format!("{item} is out of stock")))?
        } else {
            item.price()
        };
        if !owner.spend(price) {
            return Err(GameError::InsufficientCredits {
                required: price,
                available: owner.total_credits(),
            });
        }
        if from_star_port {
            owner.choam.take(item);
        }

        if let Some(state) = self.world.object_mut(builder).and_then(GameObject::structure_mut) {
            state.production.push(ProductionItem::new(item, price));
        }
        Ok(())
    }

    fn place_structure(&mut self, house: HouseId, builder: ObjectId, location: Coord) -> Result<()> {
        let object = self
            .world
            .object(builder)
            .ok_or(GameError::ObjectNotFound(builder.0))?;
        if !object.is_waiting_to_place() {
            return Err(reject(format!("{builder} has nothing to place")));
        }
        let Some(item) = object.structure().and_then(|s| s.production.current()).map(|p| p.item)
        else {
            return Err(reject(format!("{builder} has nothing to place")));
        };
        if !self
            .world
            .okay_to_place_structure(house, item, location, PlacementRules::for_item(item))
        {
            return Err(GameError::InvalidPlacement {
                item: item.to_string(),
                x: location.x,
                y: location.y,
            });
        }
        if let Some(state) = self.world.object_mut(builder).and_then(GameObject::structure_mut) {
            state.production.pop();
        }

        let placed = if matches!(item, ItemId::Slab1 | ItemId::Slab4) {
            let map = self.world.map_mut();
            for dy in 0..item.height() {
                for dx in 0..item.width() {
                    map.set_terrain(Coord::new(location.x + dx, location.y + dy), TerrainType::Slab);
                }
            }
            None
        } else {
            let id = self.world.spawn_structure(house, item, location)?;
            if item == ItemId::Refinery {
                if let Some(tile) =
                    self.world
                        .find_free_tile_near(location, item.width(), item.height(), ItemId::Harvester)
                {
                    self.world.spawn_unit(house, ItemId::Harvester, tile)?;
                }
            }
            Some(id)
        };
        debug!(house = %house, item = %item, x = location.x, y = location.y, "structure placed");
        self.pending.produced.push(ProducedEvent {
            builder,
            owner: house,
            item,
            object: placed,
        });
        economy::refresh_houses(&mut self.world);
        Ok(())
    }

    fn cancel_item(&mut self, house: HouseId, builder: ObjectId, item: ItemId) -> Result<()> {
        let cancelled = self
            .world
            .object_mut(builder)
            .and_then(GameObject::structure_mut)
            .and_then(|s| s.production.cancel(item))
            .ok_or_else(|| reject(format!("{item} is not queued at {builder}")))?;
        if let Some(owner) = self.world.house_mut(house) {
            owner.refund(cancelled.paid);
        }
        Ok(())
    }

    fn upgrade(&mut self, house: HouseId, builder: ObjectId) -> Result<()> {
        let object = self
            .world
            .object(builder)
            .ok_or(GameError::ObjectNotFound(builder.0))?;
        let item = object.item;
        let can_upgrade = object.structure().is_some_and(|s| s.can_upgrade());
        if !can_upgrade {
            return Err(reject(format!("{builder} cannot be upgraded")));
        }
        let cost = item.upgrade_cost();
        let owner = self
            .world
            .house_mut(house)
            .ok_or_else(|| GameError::HouseNotFound(house.to_string()))?;
        if !owner.spend(cost) {
            return Err(GameError::InsufficientCredits {
                required: cost,
                available: owner.total_credits(),
            });
        }
        if let Some(state) = self.world.object_mut(builder).and_then(GameObject::structure_mut) {
            state.upgrade_progress = Some(0);
        }
        Ok(())
    }

    fn repair(&mut self, house: HouseId, id: ObjectId) -> Result<()> {
        let object = self.world.object(id).ok_or(GameError::ObjectNotFound(id.0))?;
        if object.health.is_full() {
            return Err(reject(format!("{id} is not damaged")));
        }
        let from = object.location;
        if object.is_structure() {
            if let Some(state) = self.world.object_mut(id).and_then(GameObject::structure_mut) {
                state.repairing = true;
            }
            return Ok(());
        }

        let yard = self
            .world
            .structures_of(house)
            .filter(|s| s.item == ItemId::RepairYard)
            .min_by_key(|s| from.block_distance(combat::nearest_point(from, s)))
            .map(|s| s.location)
            .ok_or_else(|| reject(format!("{house} has no repair yard")))?;
        if let Some(object) = self.world.object_mut(id) {
            object.target = None;
            if let Some(unit) = object.unit_mut() {
                unit.going_to_repair = true;
                unit.destination = yard;
            }
        }
        Ok(())
    }

    fn set_attack_mode(&mut self, id: ObjectId, mode: AttackMode) -> Result<()> {
        let object = self.world.object_mut(id).ok_or(GameError::ObjectNotFound(id.0))?;
        let item = object.item;
        let refused = match mode {
            AttackMode::Retreat => matches!(
                item,
                ItemId::Harvester | ItemId::Carryall | ItemId::MCV | ItemId::Frigate
            ),
            AttackMode::Harvest => item != ItemId::Harvester,
            AttackMode::CarryallRequested => true,
            _ => false,
        };
        if refused {
            return Err(reject(format!("{item} cannot switch to {mode:?}")));
        }
        object.attack_mode = mode;
        if mode == AttackMode::Stop {
            object.target = None;
            if let Some(unit) = object.unit_mut() {
                unit.destination = Coord::INVALID;
            }
        }
        Ok(())
    }

    fn move_unit(&mut self, id: ObjectId, destination: Coord, forced: bool) -> Result<()> {
        if !self.world.map().contains(destination) {
            return Err(reject(format!("{destination:?} is off the map")));
        }
        let object = self.world.object_mut(id).ok_or(GameError::ObjectNotFound(id.0))?;
        let unit = object
            .unit_mut()
            .ok_or_else(|| reject(format!("{id} cannot move")))?;
        unit.destination = destination;
        unit.going_to_repair = false;
        object.target = None;
        object.forced = forced;
        Ok(())
    }

    fn attack_object(&mut self, house: HouseId, id: ObjectId, target: ObjectId, forced: bool) -> Result<()> {
        let target_object = self
            .world
            .object(target)
            .ok_or(GameError::ObjectNotFound(target.0))?;
        let attacker = self.world.object(id).ok_or(GameError::ObjectNotFound(id.0))?;
        if !self.world.is_enemy(house, target_object.owner)
            || !combat::can_target(attacker.item, target_object.item)
        {
            return Err(reject(format!("{id} cannot attack {target}")));
        }
        let goal = combat::nearest_point(attacker.location, target_object);
        let object = self.world.object_mut(id).ok_or(GameError::ObjectNotFound(id.0))?;
        object.target = Some(target);
        object.forced = forced;
        if let Some(unit) = object.unit_mut() {
            unit.destination = goal;
        }
        Ok(())
    }

    fn deploy(&mut self, house: HouseId, id: ObjectId) -> Result<()> {
        let object = self.world.object(id).ok_or(GameError::ObjectNotFound(id.0))?;
        if object.item != ItemId::MCV {
            return Err(reject(format!("{id} is not an MCV")));
        }
        let location = object.location;
        let rules = PlacementRules {
            tolerate_units: false,
            require_build_range: false,
            ignore_unit: Some(id),
        };
        if !self
            .world
            .okay_to_place_structure(house, ItemId::ConstructionYard, location, rules)
        {
            return Err(GameError::InvalidPlacement {
                item: ItemId::ConstructionYard.to_string(),
                x: location.x,
                y: location.y,
            });
        }
        self.world.remove_object(id);
        let yard = self
            .world
            .spawn_structure(house, ItemId::ConstructionYard, location)?;
        debug!(house = %house, x = location.x, y = location.y, "MCV deployed");
        self.pending.produced.push(ProducedEvent {
            builder: id,
            owner: house,
            item: ItemId::ConstructionYard,
            object: Some(yard),
        });
        economy::refresh_houses(&mut self.world);
        Ok(())
    }

    fn launch_special_weapon(&mut self, house: HouseId, palace: ObjectId, target: Coord) -> Result<()> {
        let object = self
            .world
            .object(palace)
            .ok_or(GameError::ObjectNotFound(palace.0))?;
        let ready = object.item == ItemId::Palace
            && object.structure().is_some_and(|s| s.is_special_weapon_ready());
        if !ready {
            return Err(reject(format!("{palace} is not charged")));
        }
        if !self.world.map().contains(target) {
            return Err(reject(format!("{target:?} is off the map")));
        }
        let origin = object.location;
        if let Some(state) = self.world.object_mut(palace).and_then(GameObject::structure_mut) {
            state.special_weapon_charge = 0;
        }

        let weapon = house.special_weapon();
        debug!(house = %house, ?weapon, x = target.x, y = target.y, "special weapon launched");
        match weapon {
            SpecialWeapon::DeathHand => {
                let scatter = Coord::new(
                    self.rng.next_range(-DEATH_HAND_SCATTER, DEATH_HAND_SCATTER + 1),
                    self.rng.next_range(-DEATH_HAND_SCATTER, DEATH_HAND_SCATTER + 1),
                );
                combat::damage_area(
                    &mut self.world,
                    target + scatter,
                    DEATH_HAND_RADIUS,
                    DEATH_HAND_DAMAGE,
                    Some(palace),
                    &mut self.pending,
                );
            }
            SpecialWeapon::Fremen => {
                for _ in 0..FREMEN_TROOPERS {
                    self.spawn_hunter(house, ItemId::Troopers, target)?;
                }
            }
            SpecialWeapon::Saboteur => {
                self.spawn_hunter(house, ItemId::Saboteur, origin)?;
            }
        }
        Ok(())
    }

    fn spawn_hunter(&mut self, house: HouseId, item: ItemId, near: Coord) -> Result<()> {
        let tile = if self.world.is_passable(near, item) {
            near
        } else {
            self.world
                .find_free_tile_near(near, 1, 1, item)
                .ok_or_else(|| reject(format!("no room for {item}")))?
        };
        let id = self.world.spawn_unit(house, item, tile)?;
        if let Some(object) = self.world.object_mut(id) {
            object.attack_mode = AttackMode::Hunt;
        }
        Ok(())
    }

    fn request_carryall_drop(&mut self, house: HouseId, id: ObjectId) -> Result<()> {
        let has_carryall = self
            .world
            .units_of(house)
            .any(|u| u.item == ItemId::Carryall);
        if !has_carryall {
            return Err(reject(format!("{house} has no carryall")));
        }
        let object = self.world.object_mut(id).ok_or(GameError::ObjectNotFound(id.0))?;
        if !object.is_ground_unit() || !object.destination().is_valid() {
            return Err(reject(format!("{id} cannot be carried")));
        }
        let mode = object.attack_mode;
        if let Some(unit) = object.unit_mut() {
            unit.resume_mode = mode;
        }
        object.attack_mode = AttackMode::CarryallRequested;
        Ok(())
    }

    /// Advance the simulation by one cycle and return what happened,
    /// including events raised by orders applied since the last tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = std::mem::take(&mut self.pending);

        self.run_production(&mut events);
        economy::run_repairs(&mut self.world);
        economy::degrade_structures(&mut self.world);
        economy::charge_palaces(&mut self.world);
        economy::run_carryall_drops(&mut self.world);
        economy::run_harvesters(&mut self.world);
        movement::move_units(&mut self.world);
        combat::update_targets(&mut self.world);
        combat::fire_weapons(&mut self.world, &mut events);
        combat::expire_deviations(&mut self.world);
        economy::refresh_houses(&mut self.world);
        economy::update_choam(&mut self.world, &mut self.rng);

        self.world.advance_cycle();
        events
    }

    fn run_production(&mut self, events: &mut TickEvents) {
        let cycle = self.world.game_cycle();
        for id in self.world.object_ids() {
            let Some(object) = self.world.object(id) else {
                continue;
            };
            let Some(state) = object.structure() else {
                continue;
            };
            let (owner, item, location) = (object.owner, object.item, object.location);
            if state.production.is_empty() && !state.is_upgrading() {
                continue;
            }
            let slowed = self
                .world
                .house(owner)
                .is_some_and(|h| h.has_power_deficit());
            if slowed && cycle % 2 == 1 {
                continue;
            }

            let Some(state) = self.world.object_mut(id).and_then(GameObject::structure_mut) else {
                continue;
            };
            if let Some(progress) = state.upgrade_progress {
                let progress = progress + 1;
                if progress >= upgrade_time(item) {
                    state.upgrade_progress = None;
                    state.upgrade_level += 1;
                    debug!(house = %owner, builder = %id, level = state.upgrade_level, "upgrade complete");
                } else {
                    state.upgrade_progress = Some(progress);
                }
                continue;
            }
            let Some(current) = state.production.current_mut() else {
                continue;
            };
            current.tick();
            if !current.is_complete() || current.item.is_structure() {
                continue;
            }

            let unit = current.item;
            let Some(tile) = self
                .world
                .find_free_tile_near(location, item.width(), item.height(), unit)
            else {
                continue;
            };
            if let Some(state) = self.world.object_mut(id).and_then(GameObject::structure_mut) {
                state.production.pop();
            }
            match self.world.spawn_unit(owner, unit, tile) {
                Ok(spawned) => events.produced.push(ProducedEvent {
                    builder: id,
                    owner,
                    item: unit,
                    object: Some(spawned),
                }),
                Err(err) => debug!(house = %owner, %err, "unit delivery failed"),
            }
        }
    }

    /// Serialize the complete state.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a state produced by [`Simulation::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid simulation.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize simulation: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::house::House;
    use crate::map::Map;
    use crate::settings::GameSettings;

    fn sim() -> (Simulation, ObjectId) {
        let mut map = Map::new(32, 32);
        map.fill(Coord::new(0, 0), 20, 20, TerrainType::Rock);
        let mut world = World::new(GameSettings::default(), map);
        world.add_house(House::new(HouseId::Atreides, 1, 5000));
        world.add_house(House::new(HouseId::Harkonnen, 2, 5000));
        let yard = world
            .spawn_structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(4, 4))
            .expect("spawn");
        world
            .spawn_structure(HouseId::Harkonnen, ItemId::ConstructionYard, Coord::new(16, 16))
            .expect("spawn");
        (Simulation::new(world), yard)
    }

    fn credits(sim: &Simulation, house: HouseId) -> i32 {
        sim.world().house(house).map_or(0, |h| h.total_credits())
    }

    #[test]
    fn test_produce_and_place_windtrap() {
        let (mut sim, yard) = sim();
        sim.apply_order(
            HouseId::Atreides,
            Order::ProduceItem {
                builder: yard,
                item: ItemId::WindTrap,
            },
        )
        .expect("produce");
        assert_eq!(credits(&sim, HouseId::Atreides), 4700);

        for _ in 0..ItemId::WindTrap.data().build_time {
            sim.tick();
        }
        assert!(sim.world().object(yard).expect("yard").is_waiting_to_place());

        sim.apply_order(
            HouseId::Atreides,
            Order::PlaceStructure {
                builder: yard,
                location: Coord::new(7, 4),
            },
        )
        .expect("place");
        let events = sim.tick();
        assert_eq!(events.produced.len(), 1);
        assert_eq!(
            sim.world().house(HouseId::Atreides).map(|h| h.owned.get(ItemId::WindTrap)),
            Some(1)
        );
    }

    #[test]
    fn test_unavailable_item_is_rejected() {
        let (mut sim, yard) = sim();
        let result = sim.apply_order(
            HouseId::Atreides,
            Order::ProduceItem {
                builder: yard,
                item: ItemId::Refinery,
            },
        );
        assert!(matches!(result, Err(GameError::InvalidOrder(_))));
        assert_eq!(credits(&sim, HouseId::Atreides), 5000);
    }

    #[test]
    fn test_foreign_actor_is_rejected() {
        let (mut sim, yard) = sim();
        let result = sim.apply_order(
            HouseId::Harkonnen,
            Order::ProduceItem {
                builder: yard,
                item: ItemId::WindTrap,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_insufficient_credits() {
        let (mut sim, yard) = sim();
        if let Some(house) = sim.world_mut().house_mut(HouseId::Atreides) {
            house.credits = 100;
        }
        let result = sim.apply_order(
            HouseId::Atreides,
            Order::ProduceItem {
                builder: yard,
                item: ItemId::WindTrap,
            },
        );
        assert!(matches!(
            result,
            Err(GameError::InsufficientCredits {
                required: 300,
                available: 100
            })
        ));
    }

    #[test]
    fn test_cancel_refunds() {
        let (mut sim, yard) = sim();
        let mut orders = Orders::new();
        orders.produce_item(yard, ItemId::WindTrap);
        orders.cancel_item(yard, ItemId::WindTrap);
        assert_eq!(sim.apply_orders(HouseId::Atreides, &orders), 2);
        assert_eq!(credits(&sim, HouseId::Atreides), 5000);
    }

    #[test]
    fn test_upgrade_completes() {
        let (mut sim, yard) = sim();
        sim.apply_order(HouseId::Atreides, Order::Upgrade { builder: yard })
            .expect("upgrade");
        assert_eq!(credits(&sim, HouseId::Atreides), 4800);
        for _ in 0..upgrade_time(ItemId::ConstructionYard) {
            sim.tick();
        }
        let state = sim
            .world()
            .object(yard)
            .and_then(GameObject::structure)
            .expect("yard");
        assert_eq!(state.upgrade_level, 1);
        assert!(!state.is_upgrading());
    }

    #[test]
    fn test_deploy_mcv() {
        let (mut sim, _) = sim();
        let mcv = sim
            .world_mut()
            .spawn_unit(HouseId::Atreides, ItemId::MCV, Coord::new(12, 12))
            .expect("spawn");
        sim.apply_order(HouseId::Atreides, Order::Deploy { unit: mcv })
            .expect("deploy");
        assert!(sim.world().object(mcv).is_none());
        let yard = sim.world().structure_at(Coord::new(12, 12)).expect("yard");
        assert_eq!(yard.item, ItemId::ConstructionYard);
        let house = sim.world().house(HouseId::Atreides).expect("house");
        assert_eq!(house.owned.get(ItemId::MCV), 0);
        assert_eq!(house.owned.get(ItemId::ConstructionYard), 2);
        assert_eq!(house.lost.get(ItemId::MCV), 0);
    }

    #[test]
    fn test_harvester_cannot_retreat() {
        let (mut sim, _) = sim();
        let harvester = sim
            .world_mut()
            .spawn_unit(HouseId::Atreides, ItemId::Harvester, Coord::new(10, 10))
            .expect("spawn");
        let result = sim.apply_order(
            HouseId::Atreides,
            Order::SetAttackMode {
                unit: harvester,
                mode: AttackMode::Retreat,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_devastate_reports_events_next_tick() {
        let (mut sim, _) = sim();
        let devastator = sim
            .world_mut()
            .spawn_unit(HouseId::Harkonnen, ItemId::Devastator, Coord::new(14, 16))
            .expect("spawn");
        sim.apply_order(HouseId::Harkonnen, Order::Devastate { unit: devastator })
            .expect("devastate");
        let events = sim.tick();
        assert!(events.destroyed.iter().any(|e| e.id == devastator));
        assert!(!events.damage.is_empty());
    }

    #[test]
    fn test_serialize_round_trip_preserves_hash() {
        let (mut sim, _) = sim();
        for _ in 0..10 {
            sim.tick();
        }
        let bytes = sim.serialize().expect("serialize");
        let restored = Simulation::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_tick_is_deterministic() {
        let (mut a, _) = sim();
        let (mut b, _) = sim();
        for _ in 0..200 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.state_hash(), b.state_hash());
        assert_eq!(a.game_cycle(), 200);
    }
}
