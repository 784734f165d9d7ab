//! Combat posture: what every unit should be doing this pass, attack
//! waves, reactions to damage, and forced retreats.
//!
//! Orders are only intents. A unit that has died, or whose order the
//! simulation rejects, costs nothing; the next pass looks again.

use dune_core::combat::{can_target, distance_between, nearest_point};
use dune_core::coord::Coord;
use dune_core::house::{House, HouseId};
use dune_core::items::{ItemId, ItemRole};
use dune_core::math::{fixed_sqrt, Fixed};
use dune_core::movement::is_idle;
use dune_core::objects::{AttackMode, GameObject, ObjectId};
use dune_core::orders::Orders;
use dune_core::world::{PlacementRules, World};
use tracing::{debug, info};

use crate::bot::Bot;
use crate::config::{Difficulty, GameMode, ATTACK_INTERVAL, ATTACK_RETRY, HUNT_RECALL_BELOW, RETREAT_INTERVAL};
use crate::geometry::{self, is_squad_exempt, TROOPER_RALLY_TECH};

/// Artillery backs off when its target is this close.
pub const ARTILLERY_MIN_RANGE: i32 = 5;
/// Ground units below this health percentage look for repair.
pub const REPAIR_PERCENT: i32 = 60;
/// Medium tanks below this health percentage avoid heavier opponents.
pub const TANK_FLEE_PERCENT: i32 = 85;
/// Defenders at least this far from an intruder ask for a carryall.
pub const CARRYALL_DROP_DISTANCE: i32 = 10;
/// Defenders need at least this health percentage to be carried in.
pub const CARRYALL_DROP_HEALTH: i32 = 75;
/// Extra slack around an area-guard radius before a unit is walked back.
pub const GUARD_SLACK: i32 = 2;
/// Added to the square root of the squad size to get the wave radius.
pub const WAVE_RADIUS: i32 = 6;
/// Campaign bots attack once the army reaches this share of its limit.
pub const CAMPAIGN_ATTACK_PERCENT: i32 = 80;

fn is_artillery(item: ItemId) -> bool {
    matches!(item, ItemId::Launcher | ItemId::Deviator)
}

fn beyond(from: Coord, to: Coord, range: i32) -> bool {
    from.block_distance(to) > Fixed::from_num(range)
}

impl Bot {
    /// Per-unit housekeeping, run on every pass.
    pub fn check_all_units(&mut self, world: &World, house: &House, orders: &mut Orders) {
        for unit in world.units_of(house.id) {
            match unit.item {
                ItemId::MCV => self.handle_mcv(world, house, unit, orders),
                ItemId::Harvester => {
                    if is_idle(unit) && unit.attack_mode != AttackMode::Harvest {
                        orders.set_attack_mode(unit.id, AttackMode::Harvest);
                    }
                }
                ItemId::Carryall | ItemId::Frigate | ItemId::Sandworm => {}
                _ => self.handle_unit(world, house, unit, orders),
            }
        }
    }

    fn handle_mcv(&mut self, world: &World, house: &House, mcv: &GameObject, orders: &mut Orders) {
        let rules = PlacementRules {
            tolerate_units: false,
            require_build_range: false,
            ignore_unit: Some(mcv.id),
        };
        if world.okay_to_place_structure(house.id, ItemId::ConstructionYard, mcv.location, rules) {
            debug!(house = %house.id, mcv = %mcv.id, "deploy MCV");
            orders.deploy(mcv.id);
            return;
        }
        if !is_idle(mcv) {
            return;
        }
        let spot = self.search.find_mcv_location(world, house.id, mcv.id);
        if !spot.is_valid() {
            return;
        }
        orders.move_to(mcv.id, spot, false);
        if house.owned.get(ItemId::Carryall) > 0 {
            orders.request_carryall_drop(mcv.id);
        }
    }

    fn handle_unit(&self, world: &World, house: &House, unit: &GameObject, orders: &mut Orders) {
        let id = house.id;
        let center = self.state.squad_center;
        let Some(state) = unit.unit() else {
            return;
        };

        if state.original_owner != id {
            if unit.item == ItemId::Devastator {
                orders.set_attack_mode(unit.id, AttackMode::Hunt);
                orders.devastate(unit.id);
            } else if center.is_valid() {
                orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
                orders.move_to(unit.id, center, false);
            }
            return;
        }

        if matches!(unit.item, ItemId::Launcher | ItemId::Deviator | ItemId::SonicTank) && center.is_valid() {
            let too_close = world.target_of(unit).is_some_and(|t| {
                t.item != ItemId::Ornithopter
                    && distance_between(unit, t) <= Fixed::from_num(ARTILLERY_MIN_RANGE)
            });
            if too_close {
                orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
                orders.move_to(unit.id, center, true);
                return;
            }
        }

        if unit.attack_mode == AttackMode::Hunt {
            let stays_hunting = matches!(
                unit.item,
                ItemId::Trooper | ItemId::Troopers | ItemId::Saboteur | ItemId::Sandworm
            );
            if self.state.attack_timer < HUNT_RECALL_BELOW && !stays_hunting {
                orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
                return;
            }
        }

        if unit.forced || world.target_of(unit).is_some() {
            return;
        }

        match unit.attack_mode {
            AttackMode::AreaGuard => {
                if center.is_valid() && beyond(unit.location, center, unit.item.guard_range()) {
                    orders.move_to(unit.id, center, false);
                }
            }
            AttackMode::Retreat => self.continue_retreat(house, unit, orders),
            AttackMode::Guard => {
                let rally = self.state.rally;
                let trooper = matches!(unit.item, ItemId::Trooper | ItemId::Troopers);
                let tech_level = world.settings().tech_level;
                if trooper && tech_level > TROOPER_RALLY_TECH && rally.is_valid() {
                    if beyond(unit.location, rally, unit.item.guard_range()) {
                        if unit.destination() != rally {
                            orders.move_to(unit.id, rally, false);
                        }
                    } else {
                        orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
                    }
                } else {
                    orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
                }
            }
            _ => {}
        }
    }

    fn continue_retreat(&self, house: &House, unit: &GameObject, orders: &mut Orders) {
        let retreat = self.state.retreat;
        if !retreat.is_valid() {
            return;
        }
        if !beyond(unit.location, retreat, unit.item.guard_range() + GUARD_SLACK) {
            orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
            return;
        }
        if unit.unit().is_some_and(|u| u.going_to_repair) {
            return;
        }
        if !unit.health.is_full() && house.owned.get(ItemId::RepairYard) > 0 {
            orders.repair(unit.id);
        } else if unit.destination() != retreat {
            orders.move_to(unit.id, retreat, false);
        }
    }

    /// Launch an attack wave if the army is ready; either way, set the
    /// attack timer for the next one.
    pub fn attack(&mut self, world: &World, house: &House, orders: &mut Orders) {
        let value = geometry::military_value(house);
        let center = self.state.squad_center;
        let mut ready = self.state.difficulty != Difficulty::Defend
            && value >= world.map().area() / 4
            && center.is_valid();
        if self.state.mode == GameMode::Campaign {
            let limit = i64::from(self.state.limits.military_value_limit);
            ready = ready
                && self.state.campaign_attack_enabled
                && i64::from(value) * 100 >= limit * i64::from(CAMPAIGN_ATTACK_PERCENT);
        }
        if !ready {
            self.state.attack_timer = ATTACK_RETRY;
            return;
        }

        let squad: Vec<&GameObject> = world
            .units_of(house.id)
            .filter(|u| !is_squad_exempt(u.item))
            .collect();
        let radius = fixed_sqrt(Fixed::from_num(squad.len())) + Fixed::from_num(WAVE_RADIUS);
        let mut launched = 0;
        for unit in squad {
            if unit.attack_mode == AttackMode::AreaGuard
                && !unit.forced
                && unit.location.distance(center) <= radius
            {
                orders.set_attack_mode(unit.id, AttackMode::Hunt);
                launched += 1;
            }
        }
        info!(house = %house.id, units = launched, value, "attack wave");
        self.state.attack_timer = ATTACK_INTERVAL;
    }

    /// Send the whole army back to the retreat point and restart the
    /// retreat timer.
    pub fn retreat_all_units(&mut self, world: &World, orders: &mut Orders) {
        let (rally, retreat) = self.refresh_rally(world);
        self.state.retreat_timer = RETREAT_INTERVAL;
        if !rally.is_valid() || !retreat.is_valid() {
            return;
        }
        let id = self.state.house;
        for unit in world.units_of(id) {
            if unit.forced || is_squad_exempt(unit.item) {
                continue;
            }
            orders.set_attack_mode(unit.id, AttackMode::Retreat);
            orders.move_to(unit.id, retreat, false);
        }
        debug!(house = %id, x = retreat.x, y = retreat.y, "retreat");
    }

    pub(crate) fn react_to_damage(
        &mut self,
        world: &World,
        victim: ObjectId,
        _amount: i32,
        attacker: Option<ObjectId>,
        orders: &mut Orders,
    ) {
        let id = self.state.house;
        let Some(victim) = world.object(victim).filter(|v| v.owner == id) else {
            return;
        };
        let Some(attacker) = attacker.and_then(|a| world.object(a)) else {
            return;
        };
        if attacker.owner == id || attacker.item == ItemId::Sandworm {
            return;
        }
        if self.state.mode == GameMode::Campaign
            && world.house(attacker.owner).is_some_and(|h| !h.is_ai)
            && !self.state.campaign_attack_enabled
        {
            info!(house = %id, by = %attacker.owner, "provoked");
            self.state.campaign_attack_enabled = true;
        }

        if victim.is_structure() {
            let fortification = victim.item.role().contains(ItemRole::FORTIFICATION);
            let repairing = victim.structure().is_some_and(|s| s.repairing);
            if !fortification && !repairing {
                orders.repair(victim.id);
            }
            if attacker.item != ItemId::Palace {
                self.scramble(world, attacker, orders);
            }
            return;
        }
        if !victim.is_ground_unit() {
            return;
        }

        let item = victim.item;
        if item == ItemId::Harvester {
            self.scramble(world, attacker, orders);
            let goal = nearest_refinery(world, id, victim.location)
                .unwrap_or_else(|| geometry::base_centre(world, id));
            if goal.is_valid() {
                orders.move_to(victim.id, goal, true);
            }
            return;
        }
        if is_squad_exempt(item) {
            return;
        }
        if is_artillery(item) {
            let center = self.state.squad_center;
            if center.is_valid() {
                orders.set_attack_mode(victim.id, AttackMode::AreaGuard);
                orders.move_to(victim.id, center, true);
            }
            return;
        }
        if !item.is_infantry() && item != ItemId::Devastator && victim.health.below_percent(REPAIR_PERCENT) {
            let has_yard = world.house(id).is_some_and(|h| h.owned.get(ItemId::RepairYard) > 0);
            if has_yard {
                if !victim.unit().is_some_and(|u| u.going_to_repair) {
                    orders.repair(victim.id);
                }
            } else if self.state.mode == GameMode::Custom {
                orders.set_attack_mode(victim.id, AttackMode::Retreat);
                self.flee(victim, orders);
            }
            return;
        }
        if item.is_light_vehicle() && attacker.is_unit() && !attacker.item.is_infantry() && !attacker.item.is_light_vehicle() {
            self.flee(victim, orders);
            return;
        }
        let outgunned = match item {
            ItemId::Tank if attacker.item == ItemId::SiegeTank => true,
            ItemId::Tank | ItemId::SiegeTank => {
                victim.health.below_percent(TANK_FLEE_PERCENT)
                    && (attacker.item.is_heavy_tank() || attacker.item == ItemId::Ornithopter)
            }
            _ => false,
        };
        if outgunned {
            self.flee(victim, orders);
        }
    }

    fn flee(&self, unit: &GameObject, orders: &mut Orders) {
        let goal = if self.state.retreat.is_valid() {
            self.state.retreat
        } else {
            self.state.squad_center
        };
        if goal.is_valid() {
            orders.move_to(unit.id, goal, true);
        }
    }

    /// Send free defenders after a visible intruder.
    pub fn scramble(&mut self, world: &World, intruder: &GameObject, orders: &mut Orders) {
        if !intruder.visible {
            return;
        }
        let id = self.state.house;
        let drops = world.settings().manual_carryall_drops
            && world.house(id).is_some_and(|h| h.owned.get(ItemId::Carryall) > 0);
        let mut sent = 0;
        for unit in world.units_of(id) {
            let stays = matches!(
                unit.item,
                ItemId::Harvester
                    | ItemId::Carryall
                    | ItemId::MCV
                    | ItemId::Frigate
                    | ItemId::Sandworm
                    | ItemId::Saboteur
            );
            if stays
                || unit.forced
                || world.target_of(unit).is_some()
                || is_artillery(unit.item)
                || !can_target(unit.item, intruder.item)
            {
                continue;
            }
            orders.set_attack_mode(unit.id, AttackMode::AreaGuard);
            orders.attack_object(unit.id, intruder.id, false);
            sent += 1;
            let far = unit.location.block_distance(intruder.location)
                >= Fixed::from_num(CARRYALL_DROP_DISTANCE);
            if drops
                && far
                && !unit.health.below_percent(CARRYALL_DROP_HEALTH)
                && unit.is_ground_unit()
            {
                orders.request_carryall_drop(unit.id);
            }
        }
        debug!(house = %id, intruder = %intruder.id, defenders = sent, "scramble");
    }
}

fn nearest_refinery(world: &World, house: HouseId, from: Coord) -> Option<Coord> {
    world
        .structures_of(house)
        .filter(|s| s.item == ItemId::Refinery)
        .map(|s| nearest_point(from, s))
        .min_by_key(|c| from.block_distance(*c))
}
