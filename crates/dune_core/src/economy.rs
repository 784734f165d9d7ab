//! Spice harvesting, power, storage, repairs and the CHOAM market.

use tracing::debug;

use crate::coord::Coord;
use crate::house::{Choam, HouseId};
use crate::items::{ItemId, ItemRole};
use crate::map::TerrainType;
use crate::objects::{AttackMode, GameObject, ObjectId, PALACE_CHARGE_CYCLES};
use crate::rng::SeededRng;
use crate::tech;
use crate::world::World;

/// Spice a harvester carries when full.
pub const HARVESTER_CAPACITY: i32 = 700;
/// Spice collected per cycle on a spice tile.
pub const HARVEST_RATE: i32 = 4;
/// Cycles between repair steps.
pub const REPAIR_INTERVAL: u64 = 8;
/// Cycles between CHOAM price changes.
pub const CHOAM_INTERVAL: u64 = 2000;
/// Cycles between concrete degradation steps.
pub const DEGRADE_INTERVAL: u64 = 512;

/// Recompute power, storage capacity, build lists and upgrade ceilings.
pub fn refresh_houses(world: &mut World) {
    let tech_level = world.settings().tech_level;
    let house_ids: Vec<HouseId> = world.houses().map(|h| h.id).collect();
    for house_id in house_ids {
        let (mut supply, mut demand, mut capacity) = (0, 0, 0);
        for structure in world.structures_of(house_id) {
            let data = structure.item.data();
            supply += data.power_supply;
            demand += data.power_demand;
            capacity += data.spice_capacity;
        }
        let has_units = world.units_of(house_id).next().is_some();
        let has_structures = world.structures_of(house_id).next().is_some();
        if let Some(house) = world.house_mut(house_id) {
            house.power_supply = supply;
            house.power_demand = demand;
            house.capacity = capacity;
            house.stored_credits = house.stored_credits.min(capacity.max(0));
            if house.active && !has_units && !has_structures {
                house.active = false;
                debug!(house = %house_id, "house defeated");
            }
        }

        let Some(house) = world.house(house_id).cloned() else {
            continue;
        };
        let builders: Vec<(ObjectId, ItemId, u8)> = world
            .structures_of(house_id)
            .filter_map(|s| s.structure().map(|st| (s.id, s.item, st.upgrade_level)))
            .collect();
        for (id, item, level) in builders {
            let list = tech::build_list(&house, item, level, tech_level);
            let max_level = tech::max_upgrade_level(item, tech_level);
            if let Some(state) = world.object_mut(id).and_then(GameObject::structure_mut) {
                state.build_list = list;
                state.max_upgrade_level = max_level;
            }
        }
    }
}

fn nearest_own(world: &World, owner: HouseId, from: Coord, item: ItemId) -> Option<ObjectId> {
    let mut best: Option<(crate::math::Fixed, ObjectId)> = None;
    for structure in world.structures_of(owner).filter(|s| s.item == item) {
        let d = from.block_distance(crate::combat::nearest_point(from, structure));
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, structure.id));
        }
    }
    best.map(|(_, id)| id)
}

fn nearest_spice(world: &World, from: Coord) -> Option<Coord> {
    let mut best: Option<(crate::math::Fixed, Coord)> = None;
    for tile in world.map().coords() {
        if !world.map().terrain(tile).is_some_and(TerrainType::is_spice) {
            continue;
        }
        let d = from.block_distance(tile);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, tile));
        }
    }
    best.map(|(_, c)| c)
}

/// Harvester work loop: collect spice, return to a refinery, unload.
pub fn run_harvesters(world: &mut World) {
    let harvesters: Vec<ObjectId> = world
        .units()
        .filter(|u| u.item == ItemId::Harvester && u.attack_mode == AttackMode::Harvest)
        .map(|u| u.id)
        .collect();
    for id in harvesters {
        let Some(object) = world.object(id) else {
            continue;
        };
        let (owner, location, forced) = (object.owner, object.location, object.forced);
        let Some(state) = object.unit() else {
            continue;
        };
        let (spice, destination) = (state.spice, state.destination);
        if forced && destination.is_valid() {
            continue;
        }

        let refinery = nearest_own(world, owner, location, ItemId::Refinery);
        let touching_refinery = refinery
            .and_then(|r| world.object(r))
            .is_some_and(|r| r.gap_to(location) <= 1);

        let full = spice >= HARVESTER_CAPACITY;
        let on_spice = world.map().terrain(location).is_some_and(TerrainType::is_spice);
        if spice > 0 && touching_refinery && (full || !on_spice) {
            if let Some(house) = world.house_mut(owner) {
                house.store_spice(spice);
            }
            if let Some(unit) = world.object_mut(id).and_then(GameObject::unit_mut) {
                unit.spice = 0;
            }
            continue;
        }

        if !full && on_spice {
            let taken = world.map_mut().harvest(location, HARVEST_RATE);
            if let Some(unit) = world.object_mut(id).and_then(GameObject::unit_mut) {
                unit.spice += taken;
            }
            continue;
        }
        if destination.is_valid() {
            continue;
        }

        let goal = if full || spice > 0 && nearest_spice(world, location).is_none() {
            refinery.and_then(|r| world.object(r)).map(|r| r.location)
        } else {
            nearest_spice(world, location)
        };
        if let Some(goal) = goal {
            if let Some(unit) = world.object_mut(id).and_then(GameObject::unit_mut) {
                unit.destination = goal;
            }
        }
    }
}

fn repair_cost(item: ItemId) -> i32 {
    (item.price() / 100).max(1)
}

/// Repair structures in place and units standing at a repair yard.
pub fn run_repairs(world: &mut World) {
    if world.game_cycle() % REPAIR_INTERVAL != 0 {
        return;
    }
    for id in world.object_ids() {
        let Some(object) = world.object(id) else {
            continue;
        };
        let (owner, item, location) = (object.owner, object.item, object.location);
        let repairing = match (object.structure(), object.unit()) {
            (Some(s), _) => s.repairing,
            (_, Some(u)) => {
                u.going_to_repair
                    && nearest_own(world, owner, location, ItemId::RepairYard)
                        .and_then(|y| world.object(y))
                        .is_some_and(|y| y.gap_to(location) <= 1)
            }
            _ => false,
        };
        if !repairing {
            continue;
        }
        let paid = item == ItemId::Palace
            || world
                .house_mut(owner)
                .is_some_and(|h| h.spend(repair_cost(item)));
        let Some(object) = world.object_mut(id) else {
            continue;
        };
        let step = (object.health.max / 100).max(1);
        if paid {
            object.health.heal(step);
        }
        if !paid || object.health.is_full() {
            if let Some(s) = object.structure_mut() {
                s.repairing = false;
            }
            if let Some(u) = object.unit_mut() {
                u.going_to_repair = false;
            }
        }
    }
}

/// Structures off concrete lose health down to half when concrete is required.
pub fn degrade_structures(world: &mut World) {
    if !world.settings().concrete_required || world.game_cycle() % DEGRADE_INTERVAL != 0 {
        return;
    }
    let ids: Vec<ObjectId> = world
        .structures()
        .filter(|s| !s.item.role().contains(ItemRole::FORTIFICATION))
        .filter(|s| {
            s.tiles()
                .any(|t| world.map().terrain(t) != Some(TerrainType::Slab))
        })
        .map(|s| s.id)
        .collect();
    for id in ids {
        if let Some(object) = world.object_mut(id) {
            if object.health.current * 2 > object.health.max {
                object.health.current -= (object.health.max / 100).max(1);
            }
        }
    }
}

/// Charge palace superweapons.
pub fn charge_palaces(world: &mut World) {
    for id in world.object_ids() {
        let Some(object) = world.object_mut(id) else {
            continue;
        };
        if object.item != ItemId::Palace {
            continue;
        }
        if let Some(state) = object.structure_mut() {
            state.special_weapon_charge = (state.special_weapon_charge + 1).min(PALACE_CHARGE_CYCLES);
        }
    }
}

/// Fly units that requested a carryall to their destination.
pub fn run_carryall_drops(world: &mut World) {
    let waiting: Vec<ObjectId> = world
        .units()
        .filter(|u| u.attack_mode == AttackMode::CarryallRequested)
        .map(|u| u.id)
        .collect();
    for id in waiting {
        let Some(object) = world.object(id) else {
            continue;
        };
        let owner = object.owner;
        let item = object.item;
        let Some(state) = object.unit() else {
            continue;
        };
        let (destination, resume) = (state.destination, state.resume_mode);
        let has_carryall = world
            .units_of(owner)
            .any(|u| u.item == ItemId::Carryall);
        if has_carryall && destination.is_valid() {
            let drop = if world.is_passable(destination, item) {
                Some(destination)
            } else {
                world.find_free_tile_near(destination, 1, 1, item)
            };
            if let Some(drop) = drop {
                world.move_unit(id, drop);
            }
        }
        if let Some(object) = world.object_mut(id) {
            object.attack_mode = resume;
            if let Some(unit) = object.unit_mut() {
                unit.destination = Coord::INVALID;
            }
        }
    }
}

/// Let CHOAM prices drift and restock.
pub fn update_choam(world: &mut World, rng: &mut SeededRng) {
    if world.game_cycle() == 0 || world.game_cycle() % CHOAM_INTERVAL != 0 {
        return;
    }
    let house_ids: Vec<HouseId> = world.houses().map(|h| h.id).collect();
    let tech_level = world.settings().tech_level;
    for house_id in house_ids {
        let Some(house) = world.house_mut(house_id) else {
            continue;
        };
        for (item, min_tech, max_stock) in Choam::GOODS {
            if tech_level < min_tech {
                continue;
            }
            let percent = rng.next_range(70, 131);
            if let Some(entry) = house.choam.entry_mut(item) {
                entry.price = entry.base_price * percent / 100;
                entry.stock = (entry.stock + 1).min(max_stock);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::house::House;
    use crate::map::Map;
    use crate::settings::GameSettings;

    fn world() -> World {
        let mut map = Map::new(24, 24);
        map.fill(Coord::new(0, 0), 12, 12, TerrainType::Rock);
        map.fill(Coord::new(16, 4), 4, 4, TerrainType::ThickSpice);
        let mut world = World::new(GameSettings::default(), map);
        world.add_house(House::new(HouseId::Atreides, 1, 0));
        world
    }

    #[test]
    fn test_power_and_capacity() {
        let mut world = world();
        world
            .spawn_structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(1, 1))
            .expect("spawn");
        world
            .spawn_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(4, 1))
            .expect("spawn");
        refresh_houses(&mut world);
        let house = world.house(HouseId::Atreides).expect("house");
        assert_eq!(house.power_supply, 100);
        assert_eq!(house.power_demand, 30);
        assert_eq!(house.capacity, 1000);
    }

    #[test]
    fn test_refresh_fills_build_lists() {
        let mut world = world();
        let yard = world
            .spawn_structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(1, 1))
            .expect("spawn");
        refresh_houses(&mut world);
        let state = world.object(yard).and_then(|o| o.structure()).expect("yard");
        assert!(state.is_available_to_build(ItemId::WindTrap));
        assert_eq!(state.max_upgrade_level, 2);
    }

    #[test]
    fn test_house_without_objects_is_defeated() {
        let mut world = world();
        refresh_houses(&mut world);
        assert!(!world.house(HouseId::Atreides).expect("house").active);
    }

    #[test]
    fn test_harvester_collects_and_unloads() {
        let mut world = world();
        world
            .spawn_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(8, 4))
            .expect("spawn");
        let harvester = world
            .spawn_unit(HouseId::Atreides, ItemId::Harvester, Coord::new(16, 4))
            .expect("spawn");
        refresh_houses(&mut world);
        run_harvesters(&mut world);
        let spice = world.object(harvester).and_then(|o| o.unit()).map(|u| u.spice);
        assert_eq!(spice, Some(HARVEST_RATE));

        if let Some(unit) = world.object_mut(harvester).and_then(GameObject::unit_mut) {
            unit.spice = HARVESTER_CAPACITY;
        }
        run_harvesters(&mut world);
        let destination = world.object(harvester).map(GameObject::destination);
        assert_eq!(destination, Some(Coord::new(8, 4)));

        world.move_unit(harvester, Coord::new(11, 4));
        run_harvesters(&mut world);
        let house = world.house(HouseId::Atreides).expect("house");
        assert_eq!(house.stored_credits, HARVESTER_CAPACITY);
    }

    #[test]
    fn test_structure_repair_costs_credits() {
        let mut world = world();
        let radar = world
            .spawn_structure(HouseId::Atreides, ItemId::Radar, Coord::new(1, 1))
            .expect("spawn");
        if let Some(o) = world.object_mut(radar) {
            o.health.current = 700;
            if let Some(s) = o.structure_mut() {
                s.repairing = true;
            }
        }
        if let Some(h) = world.house_mut(HouseId::Atreides) {
            h.credits = 100;
        }
        run_repairs(&mut world);
        assert_eq!(world.object(radar).map(|o| o.health.current), Some(708));
        assert_eq!(world.house(HouseId::Atreides).map(|h| h.credits), Some(96));
    }

    #[test]
    fn test_palace_charges_to_ready() {
        let mut world = world();
        let palace = world
            .spawn_structure(HouseId::Atreides, ItemId::Palace, Coord::new(1, 1))
            .expect("spawn");
        for _ in 0..PALACE_CHARGE_CYCLES + 5 {
            charge_palaces(&mut world);
        }
        let state = world.object(palace).and_then(|o| o.structure()).expect("palace");
        assert!(state.is_special_weapon_ready());
        assert_eq!(state.special_weapon_charge, PALACE_CHARGE_CYCLES);
    }
}
