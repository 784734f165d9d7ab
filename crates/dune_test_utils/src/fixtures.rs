//! Test fixtures and helpers.
//!
//! [`WorldBuilder`] assembles small worlds for unit and scenario tests.
//! Spawn helpers panic on invalid placements since fixtures are only used
//! from tests.

use dune_core::coord::Coord;
use dune_core::economy;
use dune_core::house::{House, HouseId};
use dune_core::items::ItemId;
use dune_core::map::{Map, TerrainType};
use dune_core::math::Fixed;
use dune_core::objects::ObjectId;
use dune_core::settings::{GameSettings, GameType};
use dune_core::world::World;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Builder for test worlds.
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    settings: GameSettings,
    map: Map,
    houses: Vec<House>,
    structures: Vec<(HouseId, ItemId, Coord)>,
    units: Vec<(HouseId, ItemId, Coord)>,
}

impl WorldBuilder {
    /// An all-sand map.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            settings: GameSettings::default(),
            map: Map::new(width, height),
            houses: Vec::new(),
            structures: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Switch to a campaign game at the given tech level.
    #[must_use]
    pub fn campaign(mut self, tech_level: u8) -> Self {
        self.settings.game_type = GameType::Campaign;
        self.settings.tech_level = tech_level;
        self
    }

    /// Set the tech level.
    #[must_use]
    pub fn tech_level(mut self, tech_level: u8) -> Self {
        self.settings.tech_level = tech_level;
        self
    }

    /// Paint a rectangle of terrain.
    #[must_use]
    pub fn terrain(mut self, origin: Coord, width: i32, height: i32, terrain: TerrainType) -> Self {
        self.map.fill(origin, width, height, terrain);
        self
    }

    /// Paint a rectangle of rock.
    #[must_use]
    pub fn rock(self, origin: Coord, width: i32, height: i32) -> Self {
        self.terrain(origin, width, height, TerrainType::Rock)
    }

    /// Add a house on a team with starting credits.
    #[must_use]
    pub fn house(mut self, id: HouseId, team: u8, credits: i32) -> Self {
        self.houses.push(House::new(id, team, credits));
        self
    }

    /// Add a bot-controlled house.
    #[must_use]
    pub fn ai_house(mut self, id: HouseId, team: u8, credits: i32) -> Self {
        let mut house = House::new(id, team, credits);
        house.is_ai = true;
        self.houses.push(house);
        self
    }

    /// Add a structure.
    #[must_use]
    pub fn structure(mut self, owner: HouseId, item: ItemId, at: Coord) -> Self {
        self.structures.push((owner, item, at));
        self
    }

    /// Add a unit.
    #[must_use]
    pub fn unit(mut self, owner: HouseId, item: ItemId, at: Coord) -> Self {
        self.units.push((owner, item, at));
        self
    }

    /// Build the world, structures first, then units, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if a structure or unit cannot be spawned.
    #[must_use]
    pub fn build(self) -> World {
        let tech_level = self.settings.tech_level;
        let mut world = World::new(self.settings, self.map);
        for mut house in self.houses {
            house.choam = dune_core::house::Choam::new(tech_level);
            world.add_house(house);
        }
        for (owner, item, at) in self.structures {
            if let Err(err) = world.spawn_structure(owner, item, at) {
                panic!("fixture structure {item} at {at:?}: {err}");
            }
        }
        for (owner, item, at) in self.units {
            if let Err(err) = world.spawn_unit(owner, item, at) {
                panic!("fixture unit {item} at {at:?}: {err}");
            }
        }
        economy::refresh_houses(&mut world);
        world
    }
}

/// Id of the first object of `item` owned by `owner`.
#[must_use]
pub fn find(world: &World, owner: HouseId, item: ItemId) -> Option<ObjectId> {
    world
        .objects()
        .find(|o| o.owner == owner && o.item == item)
        .map(|o| o.id)
}

/// Two opposing bases on a 64x64 map: Atreides top-left, Harkonnen
/// bottom-right, each with a yard, wind trap and refinery on rock, and a
/// spice field in the middle.
#[must_use]
pub fn skirmish_world() -> World {
    WorldBuilder::new(64, 64)
        .rock(Coord::new(2, 2), 20, 20)
        .rock(Coord::new(42, 42), 20, 20)
        .terrain(Coord::new(26, 26), 12, 12, TerrainType::Spice)
        .ai_house(HouseId::Atreides, 1, 3000)
        .ai_house(HouseId::Harkonnen, 2, 3000)
        .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(6, 6))
        .structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(9, 6))
        .structure(HouseId::Atreides, ItemId::Refinery, Coord::new(6, 9))
        .structure(HouseId::Harkonnen, ItemId::ConstructionYard, Coord::new(54, 54))
        .structure(HouseId::Harkonnen, ItemId::WindTrap, Coord::new(51, 54))
        .structure(HouseId::Harkonnen, ItemId::Refinery, Coord::new(53, 51))
        .unit(HouseId::Atreides, ItemId::Harvester, Coord::new(10, 10))
        .unit(HouseId::Harkonnen, ItemId::Harvester, Coord::new(52, 50))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_spawns_in_order() {
        let world = WorldBuilder::new(16, 16)
            .rock(Coord::new(0, 0), 16, 16)
            .house(HouseId::Ordos, 1, 1000)
            .structure(HouseId::Ordos, ItemId::ConstructionYard, Coord::new(2, 2))
            .unit(HouseId::Ordos, ItemId::Trike, Coord::new(8, 8))
            .build();
        let items: Vec<ItemId> = world.objects().map(|o| o.item).collect();
        assert_eq!(items, vec![ItemId::ConstructionYard, ItemId::Trike]);
        assert!(find(&world, HouseId::Ordos, ItemId::Trike).is_some());
    }

    #[test]
    fn test_skirmish_world_is_powered() {
        let world = skirmish_world();
        for house in world.houses() {
            assert!(!house.has_power_deficit());
            assert_eq!(house.capacity, 1000);
        }
    }
}
