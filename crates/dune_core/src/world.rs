//! The world: map, houses and the object arena.
//!
//! Objects are stored in a `BTreeMap` keyed by monotonically increasing ids,
//! so every enumeration visits objects in creation order. Placement scoring
//! and build priorities depend on that order being identical on every
//! machine.
//!
//! Everything a bot needs is a `&self` query here. The `&mut self` methods
//! exist for the simulation and for test fixtures.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::error::{GameError, Result};
use crate::house::{House, HouseId};
use crate::items::ItemId;
use crate::map::{Map, TerrainType};
use crate::objects::{GameObject, ObjectId};
use crate::settings::GameSettings;

/// Maximum Chebyshev gap between a new structure and an existing one.
pub const BUILD_RANGE: i32 = 2;

/// Knobs for [`World::okay_to_place_structure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementRules {
    /// Ground units on the footprint do not block placement.
    pub tolerate_units: bool,
    /// Footprint must lie within [`BUILD_RANGE`] of an own structure.
    pub require_build_range: bool,
    /// This unit never blocks placement (a deploying MCV).
    pub ignore_unit: Option<ObjectId>,
}

impl PlacementRules {
    /// Standard rules for placing `item`: single slabs tolerate units, and
    /// everything but a construction yard must be near an own structure.
    #[must_use]
    pub fn for_item(item: ItemId) -> Self {
        Self {
            tolerate_units: item == ItemId::Slab1,
            require_build_range: item != ItemId::ConstructionYard,
            ignore_unit: None,
        }
    }
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct World {
    settings: GameSettings,
    map: Map,
    houses: BTreeMap<HouseId, House>,
    objects: BTreeMap<ObjectId, GameObject>,
    next_id: u32,
    game_cycle: u64,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(settings: GameSettings, map: Map) -> Self {
        Self {
            settings,
            map,
            houses: BTreeMap::new(),
            objects: BTreeMap::new(),
            next_id: 1,
            game_cycle: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Game settings.
    #[must_use]
    pub const fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Tile map.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// Cycles simulated so far.
    #[must_use]
    pub const fn game_cycle(&self) -> u64 {
        self.game_cycle
    }

    /// Look up a house.
    #[must_use]
    pub fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.get(&id)
    }

    /// Houses in id order.
    pub fn houses(&self) -> impl Iterator<Item = &House> {
        self.houses.values()
    }

    /// Houses on different teams are enemies.
    #[must_use]
    pub fn is_enemy(&self, a: HouseId, b: HouseId) -> bool {
        match (self.house(a), self.house(b)) {
            (Some(a), Some(b)) => a.team != b.team,
            _ => a != b,
        }
    }

    /// Resolve an id; `None` when the object no longer exists.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    /// Current target of `object`, if it still exists.
    #[must_use]
    pub fn target_of(&self, object: &GameObject) -> Option<&GameObject> {
        object.target.and_then(|t| self.object(t))
    }

    /// All objects in creation order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// All structures in creation order.
    pub fn structures(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values().filter(|o| o.is_structure())
    }

    /// All units in creation order.
    pub fn units(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values().filter(|o| o.is_unit())
    }

    /// Structures owned by a house.
    pub fn structures_of(&self, house: HouseId) -> impl Iterator<Item = &GameObject> {
        self.structures().filter(move |o| o.owner == house)
    }

    /// Units owned by a house.
    pub fn units_of(&self, house: HouseId) -> impl Iterator<Item = &GameObject> {
        self.units().filter(move |o| o.owner == house)
    }

    /// Structure covering a tile.
    #[must_use]
    pub fn structure_at(&self, tile: Coord) -> Option<&GameObject> {
        self.map.structure_at(tile).and_then(|id| self.object(id))
    }

    /// Ground units standing on a tile.
    pub fn ground_units_at(&self, tile: Coord) -> impl Iterator<Item = &GameObject> {
        self.map
            .tile(tile)
            .map(|t| t.units.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.object(*id))
    }

    /// Tile is covered by a structure.
    #[must_use]
    pub fn tile_has_structure(&self, tile: Coord) -> bool {
        self.map.structure_at(tile).is_some()
    }

    /// Tile has a ground unit on it.
    #[must_use]
    pub fn tile_has_ground_unit(&self, tile: Coord) -> bool {
        self.map.has_ground_unit(tile)
    }

    /// A ground unit of type `item` may enter the tile.
    #[must_use]
    pub fn is_passable(&self, tile: Coord, item: ItemId) -> bool {
        let Some(terrain) = self.map.terrain(tile) else {
            return false;
        };
        if self.tile_has_structure(tile) || self.tile_has_ground_unit(tile) {
            return false;
        }
        terrain != TerrainType::Mountain || item.is_infantry()
    }

    /// Footprint at `location` lies within build range of an own structure.
    #[must_use]
    pub fn within_build_range(&self, house: HouseId, location: Coord, width: i32, height: i32) -> bool {
        self.structures_of(house).any(|s| {
            let dx = (s.location.x - (location.x + width - 1))
                .max(location.x - (s.location.x + s.width() - 1))
                .max(0);
            let dy = (s.location.y - (location.y + height - 1))
                .max(location.y - (s.location.y + s.height() - 1))
                .max(0);
            dx.max(dy) <= BUILD_RANGE
        })
    }

    /// Whether `house` may place `item` with its top-left tile at `location`.
    #[must_use]
    pub fn okay_to_place_structure(
        &self,
        house: HouseId,
        item: ItemId,
        location: Coord,
        rules: PlacementRules,
    ) -> bool {
        let (width, height) = (item.width(), item.height());
        for dy in 0..height {
            for dx in 0..width {
                let tile = Coord::new(location.x + dx, location.y + dy);
                if !self.map.is_buildable(tile) || self.tile_has_structure(tile) {
                    return false;
                }
                if !rules.tolerate_units
                    && self
                        .ground_units_at(tile)
                        .any(|u| Some(u.id) != rules.ignore_unit)
                {
                    return false;
                }
            }
        }
        !rules.require_build_range || self.within_build_range(house, location, width, height)
    }

    /// Nearest passable tile around a footprint, scanning rings outward.
    #[must_use]
    pub fn find_free_tile_near(&self, origin: Coord, width: i32, height: i32, item: ItemId) -> Option<Coord> {
        let max_ring = self.map.width().max(self.map.height());
        for ring in 1..=max_ring {
            for y in origin.y - ring..origin.y + height + ring {
                for x in origin.x - ring..origin.x + width + ring {
                    let on_ring = x == origin.x - ring
                        || y == origin.y - ring
                        || x == origin.x + width + ring - 1
                        || y == origin.y + height + ring - 1;
                    let tile = Coord::new(x, y);
                    if on_ring && self.is_passable(tile, item) {
                        return Some(tile);
                    }
                }
            }
        }
        None
    }

    /// Deterministic hash of the complete state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Mutable tile map.
    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    /// Mutable house.
    pub fn house_mut(&mut self, id: HouseId) -> Option<&mut House> {
        self.houses.get_mut(&id)
    }

    /// Mutable object.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    /// Ids of every object, in creation order.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Add or replace a house.
    pub fn add_house(&mut self, house: House) {
        self.houses.insert(house.id, house);
    }

    /// Advance the cycle counter.
    pub(crate) fn advance_cycle(&mut self) {
        self.game_cycle += 1;
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Put a structure on the map. Only the footprint bounds and existing
    /// structures are checked; placement rules are the caller's job.
    pub fn spawn_structure(&mut self, owner: HouseId, item: ItemId, location: Coord) -> Result<ObjectId> {
        if !item.is_structure() || !self.houses.contains_key(&owner) {
            return Err(GameError::InvalidOrder(format!("{owner} cannot own structure {item}")));
        }
        let blocked = (0..item.height()).any(|dy| {
            (0..item.width()).any(|dx| {
                let tile = Coord::new(location.x + dx, location.y + dy);
                !self.map.contains(tile) || self.tile_has_structure(tile)
            })
        });
        if blocked {
            return Err(GameError::InvalidPlacement {
                item: item.to_string(),
                x: location.x,
                y: location.y,
            });
        }
        let id = self.allocate_id();
        let object = GameObject::new(id, item, owner, location);
        for tile in object.tiles() {
            if let Some(t) = self.map.tile_mut(tile) {
                t.structure = Some(id);
            }
        }
        self.objects.insert(id, object);
        if let Some(house) = self.houses.get_mut(&owner) {
            house.owned.increment(item);
        }
        Ok(id)
    }

    /// Put a unit on the map.
    pub fn spawn_unit(&mut self, owner: HouseId, item: ItemId, location: Coord) -> Result<ObjectId> {
        if !item.is_unit() || !self.houses.contains_key(&owner) {
            return Err(GameError::InvalidOrder(format!("{owner} cannot own unit {item}")));
        }
        if !self.map.contains(location) {
            return Err(GameError::InvalidPlacement {
                item: item.to_string(),
                x: location.x,
                y: location.y,
            });
        }
        let id = self.allocate_id();
        let object = GameObject::new(id, item, owner, location);
        if object.is_ground_unit() {
            if let Some(t) = self.map.tile_mut(location) {
                t.units.push(id);
            }
        }
        self.objects.insert(id, object);
        if let Some(house) = self.houses.get_mut(&owner) {
            house.owned.increment(item);
        }
        Ok(id)
    }

    /// Take an object off the map without counting it as lost.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<GameObject> {
        let object = self.objects.remove(&id)?;
        if object.is_structure() {
            for tile in object.tiles() {
                if let Some(t) = self.map.tile_mut(tile) {
                    if t.structure == Some(id) {
                        t.structure = None;
                    }
                }
            }
        } else if let Some(t) = self.map.tile_mut(object.location) {
            t.units.retain(|u| *u != id);
        }
        if let Some(house) = self.houses.get_mut(&object.owner) {
            house.owned.decrement(object.item);
        }
        Some(object)
    }

    /// Destroy an object, updating the owner's losses and the killer's kills.
    pub fn destroy_object(&mut self, id: ObjectId, killer: Option<HouseId>) -> Option<GameObject> {
        let object = self.remove_object(id)?;
        if let Some(house) = self.houses.get_mut(&object.owner) {
            house.lost.increment(object.item);
        }
        if let Some(house) = killer.and_then(|k| self.houses.get_mut(&k)) {
            house.kills.increment(object.item);
        }
        Some(object)
    }

    /// Move a unit to a new tile, keeping ground occupancy in sync.
    pub fn move_unit(&mut self, id: ObjectId, to: Coord) -> bool {
        if !self.map.contains(to) {
            return false;
        }
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if !object.is_unit() {
            return false;
        }
        let from = object.location;
        object.location = to;
        if object.is_ground_unit() {
            if let Some(t) = self.map.tile_mut(from) {
                t.units.retain(|u| *u != id);
            }
            if let Some(t) = self.map.tile_mut(to) {
                t.units.push(id);
            }
        }
        true
    }

    /// Hand an object to another house.
    pub fn change_owner(&mut self, id: ObjectId, new_owner: HouseId) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        let old_owner = object.owner;
        if old_owner == new_owner {
            return false;
        }
        object.owner = new_owner;
        object.target = None;
        object.forced = false;
        let item = object.item;
        if let Some(house) = self.houses.get_mut(&old_owner) {
            house.owned.decrement(item);
        }
        if let Some(house) = self.houses.get_mut(&new_owner) {
            house.owned.increment(item);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rock_world() -> World {
        let mut map = Map::new(32, 32);
        map.fill(Coord::new(0, 0), 20, 20, TerrainType::Rock);
        let mut world = World::new(GameSettings::default(), map);
        world.add_house(House::new(HouseId::Atreides, 1, 1000));
        world.add_house(House::new(HouseId::Harkonnen, 2, 1000));
        world
    }

    #[test]
    fn test_enumeration_is_creation_ordered() {
        let mut world = rock_world();
        let a = world
            .spawn_structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(8, 8))
            .expect("spawn");
        let b = world
            .spawn_structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(2, 2))
            .expect("spawn");
        let ids: Vec<ObjectId> = world.structures_of(HouseId::Atreides).map(|o| o.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(world.structures_of(HouseId::Harkonnen).count(), 0);
    }

    #[test]
    fn test_destroyed_object_resolves_to_none() {
        let mut world = rock_world();
        let tank = world
            .spawn_unit(HouseId::Harkonnen, ItemId::Tank, Coord::new(5, 5))
            .expect("spawn");
        assert!(world.tile_has_ground_unit(Coord::new(5, 5)));
        world.destroy_object(tank, Some(HouseId::Atreides));
        assert!(world.object(tank).is_none());
        assert!(!world.tile_has_ground_unit(Coord::new(5, 5)));
        let harkonnen = world.house(HouseId::Harkonnen).expect("house");
        assert_eq!(harkonnen.lost.get(ItemId::Tank), 1);
        assert_eq!(harkonnen.owned.get(ItemId::Tank), 0);
        let atreides = world.house(HouseId::Atreides).expect("house");
        assert_eq!(atreides.kills.get(ItemId::Tank), 1);
    }

    #[test]
    fn test_target_of_dead_object_is_none() {
        let mut world = rock_world();
        let tank = world
            .spawn_unit(HouseId::Harkonnen, ItemId::Tank, Coord::new(5, 5))
            .expect("spawn");
        let trike = world
            .spawn_unit(HouseId::Atreides, ItemId::Trike, Coord::new(7, 7))
            .expect("spawn");
        if let Some(o) = world.object_mut(trike) {
            o.target = Some(tank);
        }
        let hunter = world.object(trike).expect("trike").clone();
        assert_eq!(world.target_of(&hunter).map(|t| t.id), Some(tank));
        world.destroy_object(tank, None);
        assert!(world.target_of(&hunter).is_none());
    }

    #[test]
    fn test_placement_rules() {
        let mut world = rock_world();
        world
            .spawn_structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(4, 4))
            .expect("spawn");
        let rules = PlacementRules::for_item(ItemId::WindTrap);
        assert!(world.okay_to_place_structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(6, 4), rules));
        assert!(!world.okay_to_place_structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(5, 4), rules));
        assert!(!world.okay_to_place_structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(12, 12), rules));
        assert!(!world.okay_to_place_structure(HouseId::Harkonnen, ItemId::WindTrap, Coord::new(6, 4), rules));
        assert!(!world.okay_to_place_structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(19, 4), rules));
    }

    #[test]
    fn test_slab_tolerates_units() {
        let mut world = rock_world();
        world
            .spawn_structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(4, 4))
            .expect("spawn");
        let tank = world
            .spawn_unit(HouseId::Atreides, ItemId::Tank, Coord::new(6, 6))
            .expect("spawn");
        let slab = PlacementRules::for_item(ItemId::Slab1);
        assert!(world.okay_to_place_structure(HouseId::Atreides, ItemId::Slab1, Coord::new(6, 6), slab));
        let wall = PlacementRules::for_item(ItemId::Wall);
        assert!(!world.okay_to_place_structure(HouseId::Atreides, ItemId::Wall, Coord::new(6, 6), wall));
        let ignoring = PlacementRules {
            ignore_unit: Some(tank),
            ..wall
        };
        assert!(world.okay_to_place_structure(HouseId::Atreides, ItemId::Wall, Coord::new(6, 6), ignoring));
    }

    #[test]
    fn test_move_unit_updates_occupancy() {
        let mut world = rock_world();
        let trike = world
            .spawn_unit(HouseId::Atreides, ItemId::Trike, Coord::new(1, 1))
            .expect("spawn");
        assert!(world.move_unit(trike, Coord::new(2, 2)));
        assert!(!world.tile_has_ground_unit(Coord::new(1, 1)));
        assert!(world.tile_has_ground_unit(Coord::new(2, 2)));
        assert!(!world.move_unit(trike, Coord::new(-1, 0)));
    }

    #[test]
    fn test_air_units_do_not_occupy_tiles() {
        let mut world = rock_world();
        world
            .spawn_unit(HouseId::Atreides, ItemId::Ornithopter, Coord::new(3, 3))
            .expect("spawn");
        assert!(!world.tile_has_ground_unit(Coord::new(3, 3)));
    }

    #[test]
    fn test_change_owner_moves_counts() {
        let mut world = rock_world();
        let tank = world
            .spawn_unit(HouseId::Harkonnen, ItemId::Tank, Coord::new(5, 5))
            .expect("spawn");
        assert!(world.change_owner(tank, HouseId::Atreides));
        assert_eq!(world.house(HouseId::Harkonnen).map(|h| h.owned.get(ItemId::Tank)), Some(0));
        assert_eq!(world.house(HouseId::Atreides).map(|h| h.owned.get(ItemId::Tank)), Some(1));
    }

    #[test]
    fn test_find_free_tile_near_skips_blocked() {
        let mut world = rock_world();
        world
            .spawn_structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(4, 4))
            .expect("spawn");
        let tile = world
            .find_free_tile_near(Coord::new(4, 4), 2, 2, ItemId::Tank)
            .expect("free tile");
        assert!(tile.chebyshev(Coord::new(4, 4)) <= 2);
        assert!(world.is_passable(tile, ItemId::Tank));
    }

    #[test]
    fn test_state_hash_changes_with_state() {
        let mut world = rock_world();
        let before = world.state_hash();
        assert_eq!(before, world.clone().state_hash());
        world
            .spawn_unit(HouseId::Atreides, ItemId::Trike, Coord::new(1, 1))
            .expect("spawn");
        assert_ne!(before, world.state_hash());
    }
}
