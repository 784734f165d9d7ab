//! Economic and military planner.
//!
//! A build pass looks at every structure the house owns, in creation
//! order, and decides what it should do this tick: repair, fire the
//! palace, place a finished structure, upgrade or start producing. All
//! counts are recomputed from the world at the start of the pass; nothing
//! carries over between passes except the campaign snapshot and the place
//! hints, which are keyed by the yard that is building the structure.
//!
//! Structures are dispatched by [`StructureCategory`]. The order of the
//! checks inside each category is significant: the first rule that fires
//! wins.

pub mod allocation;
pub mod factory;
pub mod limits;
pub mod yard;

use std::collections::BTreeMap;

use dune_core::coord::Coord;
use dune_core::house::{House, HouseId};
use dune_core::items::{ItemCounts, ItemId, ItemRole};
use dune_core::math::below_percent;
use dune_core::objects::{GameObject, ObjectId};
use dune_core::orders::Orders;
use dune_core::world::{PlacementRules, World};
use tracing::{debug, info};

use crate::config::{Difficulty, GameMode};
use crate::geometry;
use crate::placement::PlacementSearch;

pub use allocation::{Allocation, ArmyKind};
pub use limits::{compute_limits, Limits};

/// Economy structures repair below this health percentage.
pub const ECONOMY_REPAIR_PERCENT: i32 = 45;
/// Economy structures also repair when the house has more than this.
pub const ECONOMY_REPAIR_MONEY: i32 = 5000;
/// Other structures repair when the house has more than this.
pub const STANDARD_REPAIR_MONEY: i32 = 1000;
/// Builders upgrade when the house keeps at least this much after paying.
pub const UPGRADE_RESERVE: i32 = 1000;

/// When a damaged structure asks for repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairPolicy {
    /// Always.
    Always,
    /// When badly damaged or when the house is rich.
    WhenCritical,
    /// When it is shooting at something, or concrete does not matter.
    WhenEngaged,
    /// When the house can afford it.
    WhenAffordable,
    /// Never.
    Never,
}

/// Planner view of a structure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureCategory {
    /// Builds structures.
    ConstructionYard,
    /// Tanks, harvesters and MCVs.
    HeavyFactory,
    /// Trikes and quads.
    LightFactory,
    /// Carryalls and ornithopters.
    HighTechFactory,
    /// Barracks or WOR.
    InfantryFactory,
    /// Buys units from CHOAM.
    StarPort,
    /// Superweapon.
    Palace,
    /// Wind traps, refineries and silos.
    Economy,
    /// Rocket turret.
    RocketTurret,
    /// Slabs and walls.
    Fortification,
    /// Everything else.
    Standard,
}

impl StructureCategory {
    /// Category of a structure type.
    #[must_use]
    pub fn of(item: ItemId) -> Self {
        match item {
            ItemId::ConstructionYard => Self::ConstructionYard,
            ItemId::HeavyFactory => Self::HeavyFactory,
            ItemId::LightFactory => Self::LightFactory,
            ItemId::HighTechFactory => Self::HighTechFactory,
            ItemId::Barracks | ItemId::WOR => Self::InfantryFactory,
            ItemId::StarPort => Self::StarPort,
            ItemId::Palace => Self::Palace,
            ItemId::RocketTurret => Self::RocketTurret,
            _ if item.role().contains(ItemRole::ECONOMY) => Self::Economy,
            _ if item.role().contains(ItemRole::FORTIFICATION) => Self::Fortification,
            _ => Self::Standard,
        }
    }

    /// Behaviour parameters.
    #[must_use]
    pub const fn behaviour(self) -> CategoryBehaviour {
        let repair = match self {
            Self::Palace => RepairPolicy::Always,
            Self::Economy => RepairPolicy::WhenCritical,
            Self::RocketTurret => RepairPolicy::WhenEngaged,
            Self::Fortification => RepairPolicy::Never,
            _ => RepairPolicy::WhenAffordable,
        };
        let builds = matches!(
            self,
            Self::ConstructionYard
                | Self::HeavyFactory
                | Self::LightFactory
                | Self::HighTechFactory
                | Self::InfantryFactory
                | Self::StarPort
        );
        CategoryBehaviour {
            repair,
            builds,
            upgrades_before_producing: builds && !matches!(self, Self::ConstructionYard),
        }
    }
}

/// What the planner does with a structure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryBehaviour {
    /// When to repair.
    pub repair: RepairPolicy,
    /// Has a production queue the planner fills.
    pub builds: bool,
    /// Spends spare money on an upgrade before queueing anything.
    pub upgrades_before_producing: bool,
}

/// Whether `structure` should ask for repair now.
#[must_use]
pub fn wants_repair(world: &World, structure: &GameObject, money: i32) -> bool {
    let Some(state) = structure.structure() else {
        return false;
    };
    if state.repairing || structure.health.is_full() {
        return false;
    }
    match StructureCategory::of(structure.item).behaviour().repair {
        RepairPolicy::Always => true,
        RepairPolicy::WhenCritical => {
            structure.health.below_percent(ECONOMY_REPAIR_PERCENT) || money > ECONOMY_REPAIR_MONEY
        }
        RepairPolicy::WhenEngaged => {
            world.target_of(structure).is_some() || !world.settings().concrete_required
        }
        RepairPolicy::WhenAffordable => money > STANDARD_REPAIR_MONEY,
        RepairPolicy::Never => false,
    }
}

/// Owned items plus everything waiting in a production queue.
#[must_use]
pub fn tally_items(world: &World, house: &House) -> ItemCounts {
    let mut counts = house.owned.clone();
    for structure in world.structures_of(house.id) {
        if let Some(state) = structure.structure() {
            for item in state.production.items() {
                counts.increment(item);
            }
        }
    }
    counts
}

/// Campaign build target: the starting layout, topped up so that a
/// scenario without a repair yard, radar or light factory is still
/// winnable at higher tech levels.
#[must_use]
pub fn campaign_snapshot(counts: &ItemCounts, tech_level: u8) -> ItemCounts {
    let mut snapshot = counts.clone();
    if tech_level > 4 {
        for item in [ItemId::RepairYard, ItemId::Radar, ItemId::LightFactory] {
            if snapshot.get(item) == 0 {
                snapshot.set(item, 1);
            }
        }
    }
    snapshot
}

/// Where a queued structure goes once its yard finishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceHint {
    /// Structure being built.
    pub item: ItemId,
    /// Spot chosen when it was queued.
    pub location: Coord,
}

/// Place hints by construction yard.
pub type PlaceHints = BTreeMap<ObjectId, PlaceHint>;

/// One planning pass for one house.
pub struct BuildPass<'a> {
    pub(crate) world: &'a World,
    pub(crate) house: &'a House,
    pub(crate) mode: GameMode,
    pub(crate) difficulty: Difficulty,
    pub(crate) counts: ItemCounts,
    pub(crate) limits: Limits,
    pub(crate) initial: Option<&'a ItemCounts>,
    pub(crate) military_value: i32,
    pub(crate) money: i32,
    pub(crate) rally: Coord,
    pub(crate) base_centre: Coord,
    pub(crate) search: &'a mut PlacementSearch,
    pub(crate) hints: &'a mut PlaceHints,
    pub(crate) orders: &'a mut Orders,
}

impl<'a> BuildPass<'a> {
    /// Prepare a pass. Counts, military value and money are read from the
    /// world now.
    #[must_use]
    pub fn new(
        world: &'a World,
        house: &'a House,
        mode: GameMode,
        difficulty: Difficulty,
        limits: Limits,
        initial: Option<&'a ItemCounts>,
        rally: Coord,
        search: &'a mut PlacementSearch,
        hints: &'a mut PlaceHints,
        orders: &'a mut Orders,
    ) -> Self {
        Self {
            world,
            house,
            mode,
            difficulty,
            counts: tally_items(world, house),
            limits,
            initial,
            military_value: geometry::military_value(house),
            money: house.total_credits(),
            rally,
            base_centre: geometry::base_centre(world, house.id),
            search,
            hints,
            orders,
        }
    }

    pub(crate) fn id(&self) -> HouseId {
        self.house.id
    }

    pub(crate) fn count(&self, item: ItemId) -> i32 {
        self.counts.get(item) as i32
    }

    pub(crate) fn below_value_limit(&self) -> bool {
        self.military_value < self.limits.military_value_limit
    }

    pub(crate) fn storage_nearly_full(&self) -> bool {
        self.house.capacity > 0 && !below_percent(self.house.stored_credits, self.house.capacity, 80)
    }

    /// Queue a unit if affordable, keeping the local tallies current.
    pub(crate) fn produce_unit(&mut self, builder: &GameObject, item: ItemId, price: i32) -> bool {
        if price > self.money {
            return false;
        }
        self.orders.produce_item(builder.id, item);
        self.money -= price;
        self.counts.increment(item);
        if !matches!(item, ItemId::Harvester | ItemId::Carryall) {
            self.military_value += item.price();
        }
        debug!(house = %self.id(), builder = %builder.id, item = %item, "queue unit");
        true
    }

    /// Queue a structure at a construction yard if it is affordable and has
    /// somewhere to go. The chosen spot is remembered as a place hint.
    pub(crate) fn produce_structure(&mut self, yard: &GameObject, item: ItemId) -> bool {
        if item.price() > self.money {
            return false;
        }
        let house = self.id();
        let location =
            self.search
                .find_place_location(self.world, house, item, self.rally, self.base_centre);
        if !location.is_valid() {
            debug!(house = %self.id(), item = %item, "no place for structure");
            return false;
        }
        self.orders.produce_item(yard.id, item);
        self.money -= item.price();
        self.counts.increment(item);
        self.hints.insert(yard.id, PlaceHint { item, location });
        debug!(house = %self.id(), item = %item, x = location.x, y = location.y, "queue structure");
        true
    }

    /// Start an upgrade if the house keeps at least `reserve` after paying.
    pub(crate) fn try_upgrade(&mut self, builder: &GameObject, reserve: i32) -> bool {
        let can = builder.structure().is_some_and(|s| s.can_upgrade());
        let cost = builder.item.upgrade_cost();
        if !can || self.money < cost + reserve {
            return false;
        }
        self.orders.upgrade(builder.id);
        self.money -= cost;
        debug!(house = %self.id(), builder = %builder.id, "upgrade");
        true
    }

    /// Run the pass over every structure.
    pub fn run(&mut self) {
        self.forget_stale_hints();
        let world = self.world;
        for structure in world.structures_of(self.id()) {
            if wants_repair(world, structure, self.money) {
                self.orders.repair(structure.id);
            }
            let category = StructureCategory::of(structure.item);
            let behaviour = category.behaviour();
            if category == StructureCategory::Palace {
                self.fire_palace(structure);
                continue;
            }
            if !behaviour.builds {
                continue;
            }
            if structure.is_waiting_to_place() {
                self.place_waiting(structure);
                continue;
            }
            let idle = structure
                .structure()
                .is_some_and(|s| s.production.is_empty() && !s.is_upgrading());
            if !idle {
                continue;
            }
            if behaviour.upgrades_before_producing && self.try_upgrade(structure, UPGRADE_RESERVE) {
                continue;
            }
            match category {
                StructureCategory::ConstructionYard => match self.mode {
                    GameMode::Campaign => self.campaign_yard(structure),
                    GameMode::Custom => self.custom_yard(structure),
                },
                StructureCategory::HeavyFactory => self.heavy_factory(structure),
                StructureCategory::LightFactory => self.light_factory(structure),
                StructureCategory::HighTechFactory => self.high_tech_factory(structure),
                StructureCategory::InfantryFactory => self.infantry_factory(structure),
                StructureCategory::StarPort => self.star_port(structure),
                _ => {}
            }
        }
    }

    /// Keep only hints whose yard still exists and is building the hinted
    /// item. A rejected produce order or a lost yard drops its hint.
    fn forget_stale_hints(&mut self) {
        let world = self.world;
        let house = self.id();
        self.hints.retain(|yard, hint| {
            world
                .object(*yard)
                .filter(|y| y.owner == house)
                .and_then(GameObject::structure)
                .and_then(|s| s.production.current())
                .is_some_and(|p| p.item == hint.item)
        });
    }

    fn fire_palace(&mut self, palace: &GameObject) {
        if !palace.structure().is_some_and(|s| s.is_special_weapon_ready()) {
            return;
        }
        let Some(enemy) = geometry::strongest_enemy(self.world, self.id()) else {
            return;
        };
        let target = geometry::base_centre(self.world, enemy);
        if !target.is_valid() {
            return;
        }
        info!(house = %self.id(), target = %enemy, x = target.x, y = target.y, "launch special weapon");
        self.orders.launch_special_weapon(palace.id, target);
    }

    /// Place a finished structure at its hint, else at a fresh spot, else
    /// give up on it.
    fn place_waiting(&mut self, yard: &GameObject) {
        let Some(item) = yard
            .structure()
            .and_then(|s| s.production.current())
            .map(|p| p.item)
        else {
            return;
        };
        let house = self.id();
        let rules = PlacementRules::for_item(item);
        let world = self.world;
        let hinted = self
            .hints
            .remove(&yard.id)
            .filter(|h| h.item == item)
            .map(|h| h.location)
            .filter(|c| c.is_valid() && world.okay_to_place_structure(house, item, *c, rules));
        let location = match hinted {
            Some(location) => location,
            None => self
                .search
                .find_place_location(world, house, item, self.rally, self.base_centre),
        };
        if location.is_valid() {
            self.orders.place_structure(yard.id, location);
        } else {
            debug!(house = %self.id(), item = %item, "cancel unplaceable structure");
            self.orders.cancel_item(yard.id, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dune_core::house::HouseId;
    use dune_test_utils::fixtures::{find, WorldBuilder};

    #[test]
    fn test_categories() {
        assert_eq!(StructureCategory::of(ItemId::WOR), StructureCategory::InfantryFactory);
        assert_eq!(StructureCategory::of(ItemId::Silo), StructureCategory::Economy);
        assert_eq!(StructureCategory::of(ItemId::Wall), StructureCategory::Fortification);
        assert_eq!(StructureCategory::of(ItemId::GunTurret), StructureCategory::Standard);
        assert!(StructureCategory::of(ItemId::StarPort).behaviour().builds);
        assert!(!StructureCategory::of(ItemId::Radar).behaviour().builds);
        assert!(!StructureCategory::of(ItemId::ConstructionYard).behaviour().upgrades_before_producing);
        assert_eq!(StructureCategory::of(ItemId::Wall).behaviour().repair, RepairPolicy::Never);
    }

    #[test]
    fn test_repair_policies() {
        let mut world = WorldBuilder::new(16, 16)
            .rock(Coord::new(0, 0), 16, 16)
            .house(HouseId::Atreides, 1, 0)
            .structure(HouseId::Atreides, ItemId::Refinery, Coord::new(1, 1))
            .structure(HouseId::Atreides, ItemId::Radar, Coord::new(5, 1))
            .structure(HouseId::Atreides, ItemId::Palace, Coord::new(1, 5))
            .structure(HouseId::Atreides, ItemId::Wall, Coord::new(8, 8))
            .build();
        for id in world.object_ids() {
            if let Some(o) = world.object_mut(id) {
                o.health.current = o.health.max / 2;
            }
        }
        let get = |item| {
            let id = find(&world, HouseId::Atreides, item).expect("structure");
            world.object(id).expect("object").clone()
        };
        let refinery = get(ItemId::Refinery);
        let radar = get(ItemId::Radar);
        let palace = get(ItemId::Palace);
        let wall = get(ItemId::Wall);

        assert!(wants_repair(&world, &palace, 0));
        assert!(!wants_repair(&world, &refinery, 2000));
        assert!(wants_repair(&world, &refinery, 6000));
        assert!(!wants_repair(&world, &radar, 500));
        assert!(wants_repair(&world, &radar, 1500));
        assert!(!wants_repair(&world, &wall, 100_000));
    }

    #[test]
    fn test_turret_with_dead_target_is_not_engaged() {
        let settings = dune_core::settings::GameSettings {
            concrete_required: true,
            ..Default::default()
        };
        let mut world = WorldBuilder::new(16, 16)
            .settings(settings)
            .rock(Coord::new(0, 0), 16, 16)
            .house(HouseId::Atreides, 1, 0)
            .house(HouseId::Harkonnen, 2, 0)
            .structure(HouseId::Atreides, ItemId::RocketTurret, Coord::new(2, 2))
            .unit(HouseId::Harkonnen, ItemId::Trike, Coord::new(6, 6))
            .build();
        let turret = find(&world, HouseId::Atreides, ItemId::RocketTurret).expect("turret");
        let trike = find(&world, HouseId::Harkonnen, ItemId::Trike).expect("trike");
        if let Some(o) = world.object_mut(turret) {
            o.health.current = o.health.max / 2;
            o.target = Some(trike);
        }
        let engaged = world.object(turret).expect("turret").clone();
        assert!(wants_repair(&world, &engaged, 0));

        world.destroy_object(trike, None);
        assert!(!wants_repair(&world, &engaged, 0));
    }

    #[test]
    fn test_place_hints_belong_to_their_yard() {
        let mut world = WorldBuilder::new(24, 24)
            .rock(Coord::new(0, 0), 24, 24)
            .ai_house(HouseId::Atreides, 1, 0)
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(2, 2))
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(12, 2))
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(2, 12))
            .build();
        let yards: Vec<ObjectId> = world.structures_of(HouseId::Atreides).map(|o| o.id).collect();
        for (yard, item) in [(yards[0], ItemId::WindTrap), (yards[1], ItemId::Radar)] {
            if let Some(state) = world.object_mut(yard).and_then(GameObject::structure_mut) {
                let mut done = dune_core::production::ProductionItem::new(item, item.price());
                done.progress = done.total_time;
                state.production.push(done);
            }
        }
        let wind_trap = Coord::new(4, 2);
        let radar = Coord::new(14, 2);
        for (item, at) in [(ItemId::WindTrap, wind_trap), (ItemId::Radar, radar)] {
            assert!(world.okay_to_place_structure(HouseId::Atreides, item, at, PlacementRules::for_item(item)));
        }

        let mut hints = PlaceHints::new();
        hints.insert(yards[1], PlaceHint { item: ItemId::Radar, location: radar });
        hints.insert(yards[0], PlaceHint { item: ItemId::WindTrap, location: wind_trap });
        // Idle yard: its produce order never went through.
        hints.insert(yards[2], PlaceHint { item: ItemId::Silo, location: Coord::new(4, 12) });
        // Yard that no longer exists.
        hints.insert(ObjectId(999), PlaceHint { item: ItemId::Silo, location: Coord::new(8, 8) });

        let house = world.house(HouseId::Atreides).expect("house");
        let mut search = PlacementSearch::new();
        let mut orders = Orders::new();
        BuildPass::new(
            &world,
            house,
            GameMode::Custom,
            Difficulty::Medium,
            Limits {
                harvester_limit: 2,
                military_value_limit: 1000,
            },
            None,
            Coord::INVALID,
            &mut search,
            &mut hints,
            &mut orders,
        )
        .run();

        let placed: Vec<(ObjectId, Coord)> = orders
            .iter()
            .filter_map(|o| match o {
                dune_core::orders::Order::PlaceStructure { builder, location } => Some((*builder, *location)),
                _ => None,
            })
            .collect();
        assert_eq!(placed, vec![(yards[0], wind_trap), (yards[1], radar)]);
        assert!(hints.is_empty());
    }

    #[test]
    fn test_palace_fires_at_strongest_enemy_base() {
        let mut world = WorldBuilder::new(64, 64)
            .rock(Coord::new(0, 0), 64, 64)
            .ai_house(HouseId::Atreides, 1, 0)
            .house(HouseId::Harkonnen, 2, 0)
            .house(HouseId::Ordos, 3, 0)
            .structure(HouseId::Atreides, ItemId::Palace, Coord::new(4, 4))
            .structure(HouseId::Harkonnen, ItemId::ConstructionYard, Coord::new(50, 10))
            .structure(HouseId::Ordos, ItemId::ConstructionYard, Coord::new(10, 50))
            .structure(HouseId::Ordos, ItemId::WindTrap, Coord::new(14, 50))
            .build();
        let palace = find(&world, HouseId::Atreides, ItemId::Palace).expect("palace");
        let pass = |world: &World| {
            let house = world.house(HouseId::Atreides).expect("house");
            let mut search = PlacementSearch::new();
            let mut hints = PlaceHints::new();
            let mut orders = Orders::new();
            BuildPass::new(
                world,
                house,
                GameMode::Custom,
                Difficulty::Medium,
                Limits::default(),
                None,
                Coord::INVALID,
                &mut search,
                &mut hints,
                &mut orders,
            )
            .run();
            orders
        };

        assert!(pass(&world).is_empty());

        if let Some(state) = world.object_mut(palace).and_then(GameObject::structure_mut) {
            state.special_weapon_charge = dune_core::objects::PALACE_CHARGE_CYCLES;
        }
        assert_eq!(
            pass(&world).as_slice(),
            &[dune_core::orders::Order::LaunchSpecialWeapon {
                palace,
                target: Coord::new(12, 50),
            }]
        );
    }

    #[test]
    fn test_tally_counts_queued_items() {
        let mut world = WorldBuilder::new(16, 16)
            .rock(Coord::new(0, 0), 16, 16)
            .house(HouseId::Atreides, 1, 0)
            .structure(HouseId::Atreides, ItemId::HeavyFactory, Coord::new(1, 1))
            .build();
        let factory = find(&world, HouseId::Atreides, ItemId::HeavyFactory).expect("factory");
        if let Some(state) = world.object_mut(factory).and_then(GameObject::structure_mut) {
            state
                .production
                .push(dune_core::production::ProductionItem::new(ItemId::Tank, 300));
        }
        let house = world.house(HouseId::Atreides).expect("house");
        let counts = tally_items(&world, house);
        assert_eq!(counts.get(ItemId::Tank), 1);
        assert_eq!(counts.get(ItemId::HeavyFactory), 1);
    }

    #[test]
    fn test_snapshot_tops_up_at_high_tech() {
        let counts = ItemCounts::new();
        let low = campaign_snapshot(&counts, 4);
        assert_eq!(low.get(ItemId::Radar), 0);
        let high = campaign_snapshot(&counts, 5);
        assert_eq!(high.get(ItemId::Radar), 1);
        assert_eq!(high.get(ItemId::RepairYard), 1);
        assert_eq!(high.get(ItemId::LightFactory), 1);
    }
}
