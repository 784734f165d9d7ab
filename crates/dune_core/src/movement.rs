//! Tile-by-tile unit movement.
//!
//! Units step one tile toward their destination every `speed` cycles. When
//! the direct step is blocked they try the two axis-aligned steps that still
//! close the distance; a unit whose destination lies inside a structure
//! stops once it touches that structure.

use crate::coord::Coord;
use crate::objects::{GameObject, ObjectId};
use crate::world::World;

fn candidate_steps(from: Coord, to: Coord) -> [Coord; 3] {
    let diagonal = from.step_toward(to);
    [
        diagonal,
        Coord::new(diagonal.x, from.y),
        Coord::new(from.x, diagonal.y),
    ]
}

fn arrive(world: &mut World, id: ObjectId) {
    if let Some(object) = world.object_mut(id) {
        object.forced = false;
        if let Some(unit) = object.unit_mut() {
            unit.destination = Coord::INVALID;
        }
    }
}

/// Advance every moving unit by at most one tile.
pub fn move_units(world: &mut World) {
    for id in world.object_ids() {
        let Some(object) = world.object_mut(id) else {
            continue;
        };
        let location = object.location;
        let item = object.item;
        let airborne = object.item.is_aircraft();
        let Some(unit) = object.unit_mut() else {
            continue;
        };
        let destination = unit.destination;
        if !destination.is_valid() {
            continue;
        }
        if destination == location {
            arrive(world, id);
            continue;
        }
        if unit.move_cooldown > 0 {
            unit.move_cooldown -= 1;
            continue;
        }
        unit.move_cooldown = item.data().speed;

        if airborne {
            world.move_unit(id, location.step_toward(destination));
            continue;
        }

        let target_structure = world.map().structure_at(destination);
        let mut moved = false;
        let mut touching_goal = false;
        for step in candidate_steps(location, destination) {
            if step.block_distance(destination) >= location.block_distance(destination) {
                continue;
            }
            if target_structure.is_some() && world.map().structure_at(step) == target_structure {
                touching_goal = true;
                break;
            }
            if world.is_passable(step, item) {
                moved = world.move_unit(id, step);
                break;
            }
        }
        if touching_goal || (!moved && location.chebyshev(destination) <= 1) {
            arrive(world, id);
        }
    }
}

/// Units that reached their destination this cycle have it cleared; this
/// reports whether a unit is idle.
#[must_use]
pub fn is_idle(object: &GameObject) -> bool {
    object.unit().is_some_and(|u| !u.destination.is_valid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::house::{House, HouseId};
    use crate::items::ItemId;
    use crate::map::{Map, TerrainType};
    use crate::settings::GameSettings;

    fn world() -> World {
        let mut map = Map::new(20, 20);
        map.fill(Coord::new(0, 0), 20, 20, TerrainType::Rock);
        let mut world = World::new(GameSettings::default(), map);
        world.add_house(House::new(HouseId::Atreides, 1, 0));
        world
    }

    fn set_destination(world: &mut World, id: ObjectId, to: Coord, forced: bool) {
        if let Some(o) = world.object_mut(id) {
            o.forced = forced;
            if let Some(u) = o.unit_mut() {
                u.destination = to;
            }
        }
    }

    #[test]
    fn test_unit_reaches_destination_and_clears_forced() {
        let mut world = world();
        let trike = world
            .spawn_unit(HouseId::Atreides, ItemId::Trike, Coord::new(1, 1))
            .expect("spawn");
        set_destination(&mut world, trike, Coord::new(4, 3), true);
        for _ in 0..100 {
            move_units(&mut world);
        }
        let object = world.object(trike).expect("alive");
        assert_eq!(object.location, Coord::new(4, 3));
        assert!(is_idle(object));
        assert!(!object.forced);
    }

    #[test]
    fn test_unit_stops_at_structure_goal() {
        let mut world = world();
        world
            .spawn_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(10, 10))
            .expect("spawn");
        let harvester = world
            .spawn_unit(HouseId::Atreides, ItemId::Harvester, Coord::new(2, 10))
            .expect("spawn");
        set_destination(&mut world, harvester, Coord::new(10, 10), false);
        for _ in 0..200 {
            move_units(&mut world);
        }
        let object = world.object(harvester).expect("alive");
        assert_eq!(object.location, Coord::new(9, 10));
        assert!(is_idle(object));
    }

    #[test]
    fn test_mountains_block_vehicles_not_infantry() {
        let mut world = world();
        world.map_mut().fill(Coord::new(3, 0), 1, 20, TerrainType::Mountain);
        let tank = world
            .spawn_unit(HouseId::Atreides, ItemId::Tank, Coord::new(2, 5))
            .expect("spawn");
        let soldier = world
            .spawn_unit(HouseId::Atreides, ItemId::Soldier, Coord::new(2, 8))
            .expect("spawn");
        set_destination(&mut world, tank, Coord::new(6, 5), false);
        set_destination(&mut world, soldier, Coord::new(6, 8), false);
        for _ in 0..200 {
            move_units(&mut world);
        }
        assert_eq!(world.object(tank).map(|o| o.location.x), Some(2));
        assert_eq!(world.object(soldier).map(|o| o.location), Some(Coord::new(6, 8)));
    }
}
