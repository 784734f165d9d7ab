//! Units and structures stored in the world arena.
//!
//! Objects reference each other only through [`ObjectId`] handles. A held id
//! may stop resolving at any time because its object was destroyed; callers
//! treat that as "no object", never as an error.

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::house::HouseId;
use crate::items::ItemId;
use crate::production::ProductionQueue;

/// Handle to an object in the world arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cycles a palace needs to charge its superweapon.
pub const PALACE_CHARGE_CYCLES: u32 = 6000;

/// Posture of a unit (or turret).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackMode {
    /// Hold position, engage what comes into range.
    #[default]
    Guard,
    /// Hold an area, chase intruders within guard range.
    AreaGuard,
    /// Seek out enemies anywhere.
    Hunt,
    /// Fall back to the retreat point.
    Retreat,
    /// Do nothing.
    Stop,
    /// Harvester work loop.
    Harvest,
    /// Waiting for a carryall pickup.
    CarryallRequested,
}

/// Health component for damageable objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: i32,
    /// Maximum health points.
    pub max: i32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Health reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current <= 0
    }

    /// Undamaged.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.clamp(0, self.current.max(0));
        self.current -= actual;
        actual
    }

    /// Heal, returning the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let actual = amount.clamp(0, (self.max - self.current).max(0));
        self.current += actual;
        actual
    }

    /// Current health is strictly below `percent` of max.
    #[must_use]
    pub const fn below_percent(&self, percent: i32) -> bool {
        crate::math::below_percent(self.current, self.max, percent)
    }

    /// Health as an integer percentage (0-100).
    #[must_use]
    pub const fn percentage(&self) -> i32 {
        if self.max <= 0 {
            0
        } else {
            self.current * 100 / self.max
        }
    }
}

/// Unit-only state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitState {
    /// Where the unit is heading, [`Coord::INVALID`] when idle.
    pub destination: Coord,
    /// House that built the unit; differs from the owner while deviated.
    pub original_owner: HouseId,
    /// Cycles until a deviated unit returns to its original owner.
    pub deviation_timer: u32,
    /// Spice carried (harvesters).
    pub spice: i32,
    /// Heading to a repair yard.
    pub going_to_repair: bool,
    /// Cycles until the weapon can fire again.
    pub reload: u32,
    /// Cycles until the next tile step.
    pub move_cooldown: u32,
    /// Mode to restore after a carryall drop.
    pub resume_mode: AttackMode,
}

impl UnitState {
    /// Fresh state for a unit built by `owner`.
    #[must_use]
    pub const fn new(owner: HouseId) -> Self {
        Self {
            destination: Coord::INVALID,
            original_owner: owner,
            deviation_timer: 0,
            spice: 0,
            going_to_repair: false,
            reload: 0,
            move_cooldown: 0,
            resume_mode: AttackMode::Guard,
        }
    }
}

/// Structure-only state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StructureState {
    /// Items in production.
    pub production: ProductionQueue,
    /// Items this builder may currently produce.
    pub build_list: Vec<ItemId>,
    /// Current upgrade level.
    pub upgrade_level: u8,
    /// Highest reachable upgrade level.
    pub max_upgrade_level: u8,
    /// Cycles left on an upgrade in progress.
    pub upgrade_progress: Option<u32>,
    /// Being repaired.
    pub repairing: bool,
    /// Palace superweapon charge in cycles.
    pub special_weapon_charge: u32,
    /// Cycles until the turret can fire again.
    pub reload: u32,
}

impl StructureState {
    /// Builder may produce `item` now.
    #[must_use]
    pub fn is_available_to_build(&self, item: ItemId) -> bool {
        self.build_list.contains(&item)
    }

    /// Upgrade in progress.
    #[must_use]
    pub const fn is_upgrading(&self) -> bool {
        self.upgrade_progress.is_some()
    }

    /// Palace superweapon is charged.
    #[must_use]
    pub const fn is_special_weapon_ready(&self) -> bool {
        self.special_weapon_charge >= PALACE_CHARGE_CYCLES
    }

    /// A further upgrade exists.
    #[must_use]
    pub const fn can_upgrade(&self) -> bool {
        self.upgrade_level < self.max_upgrade_level && !self.is_upgrading()
    }
}

/// Capability-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Mobile unit.
    Unit(UnitState),
    /// Building.
    Structure(StructureState),
}

/// A unit or structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameObject {
    /// Arena handle.
    pub id: ObjectId,
    /// Item type.
    pub item: ItemId,
    /// Current owner.
    pub owner: HouseId,
    /// Tile position (top-left tile for structures).
    pub location: Coord,
    /// Hit points.
    pub health: Health,
    /// Posture.
    pub attack_mode: AttackMode,
    /// Current target, re-resolved on every use.
    pub target: Option<ObjectId>,
    /// Explicitly ordered; bots leave forced objects alone until they arrive.
    pub forced: bool,
    /// Visible through fog of war.
    pub visible: bool,
    /// Unit or structure state.
    pub kind: ObjectKind,
}

impl GameObject {
    /// Build a fresh object at full health.
    #[must_use]
    pub fn new(id: ObjectId, item: ItemId, owner: HouseId, location: Coord) -> Self {
        let kind = if item.is_structure() {
            ObjectKind::Structure(StructureState::default())
        } else {
            ObjectKind::Unit(UnitState::new(owner))
        };
        let attack_mode = if item == ItemId::Harvester {
            AttackMode::Harvest
        } else {
            AttackMode::Guard
        };
        Self {
            id,
            item,
            owner,
            location,
            health: Health::new(item.data().max_health),
            attack_mode,
            target: None,
            forced: false,
            visible: true,
            kind,
        }
    }

    /// Is a structure.
    #[must_use]
    pub const fn is_structure(&self) -> bool {
        matches!(self.kind, ObjectKind::Structure(_))
    }

    /// Is a unit.
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self.kind, ObjectKind::Unit(_))
    }

    /// Unit on the ground (not flying).
    #[must_use]
    pub fn is_ground_unit(&self) -> bool {
        self.is_unit() && !self.item.is_aircraft()
    }

    /// Unit state, if a unit.
    #[must_use]
    pub const fn unit(&self) -> Option<&UnitState> {
        match &self.kind {
            ObjectKind::Unit(state) => Some(state),
            ObjectKind::Structure(_) => None,
        }
    }

    /// Mutable unit state.
    pub fn unit_mut(&mut self) -> Option<&mut UnitState> {
        match &mut self.kind {
            ObjectKind::Unit(state) => Some(state),
            ObjectKind::Structure(_) => None,
        }
    }

    /// Structure state, if a structure.
    #[must_use]
    pub const fn structure(&self) -> Option<&StructureState> {
        match &self.kind {
            ObjectKind::Structure(state) => Some(state),
            ObjectKind::Unit(_) => None,
        }
    }

    /// Mutable structure state.
    pub fn structure_mut(&mut self) -> Option<&mut StructureState> {
        match &mut self.kind {
            ObjectKind::Structure(state) => Some(state),
            ObjectKind::Unit(_) => None,
        }
    }

    /// Unit destination, [`Coord::INVALID`] for structures and idle units.
    #[must_use]
    pub fn destination(&self) -> Coord {
        self.unit().map_or(Coord::INVALID, |u| u.destination)
    }

    /// Footprint width.
    #[must_use]
    pub fn width(&self) -> i32 {
        if self.is_structure() {
            self.item.width()
        } else {
            1
        }
    }

    /// Footprint height.
    #[must_use]
    pub fn height(&self) -> i32 {
        if self.is_structure() {
            self.item.height()
        } else {
            1
        }
    }

    /// Every tile the object covers.
    pub fn tiles(&self) -> impl Iterator<Item = Coord> {
        let origin = self.location;
        let (w, h) = (self.width(), self.height());
        (0..h).flat_map(move |dy| (0..w).map(move |dx| Coord::new(origin.x + dx, origin.y + dy)))
    }

    /// Covers the given tile.
    #[must_use]
    pub fn occupies(&self, tile: Coord) -> bool {
        tile.x >= self.location.x
            && tile.y >= self.location.y
            && tile.x < self.location.x + self.width()
            && tile.y < self.location.y + self.height()
    }

    /// Chebyshev gap between this footprint and a tile (0 when inside).
    #[must_use]
    pub fn gap_to(&self, tile: Coord) -> i32 {
        let dx = (self.location.x - tile.x)
            .max(tile.x - (self.location.x + self.width() - 1))
            .max(0);
        let dy = (self.location.y - tile.y)
            .max(tile.y - (self.location.y + self.height() - 1))
            .max(0);
        dx.max(dy)
    }

    /// Builder has finished a structure that now needs a location.
    #[must_use]
    pub fn is_waiting_to_place(&self) -> bool {
        self.structure()
            .and_then(|s| s.production.current())
            .is_some_and(|p| p.item.is_structure() && p.is_complete())
    }

    /// Currently producing or upgrading.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.structure()
            .is_some_and(|s| !s.production.is_empty() || s.is_upgrading())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::ProductionItem;

    #[test]
    fn test_health_thresholds() {
        let mut health = Health::new(800);
        health.apply_damage(360);
        assert_eq!(health.current, 440);
        assert!(health.below_percent(60));
        assert!(!health.below_percent(55));
        assert_eq!(health.heal(1000), 360);
        assert!(health.is_full());
        assert_eq!(health.apply_damage(5000), 800);
        assert!(health.is_dead());
    }

    #[test]
    fn test_structure_tiles_and_gap() {
        let obj = GameObject::new(ObjectId(1), ItemId::HeavyFactory, HouseId::Atreides, Coord::new(4, 4));
        let tiles: Vec<Coord> = obj.tiles().collect();
        assert_eq!(tiles.len(), 6);
        assert!(obj.occupies(Coord::new(6, 5)));
        assert!(!obj.occupies(Coord::new(7, 5)));
        assert_eq!(obj.gap_to(Coord::new(5, 5)), 0);
        assert_eq!(obj.gap_to(Coord::new(8, 4)), 2);
        assert_eq!(obj.gap_to(Coord::new(2, 2)), 2);
    }

    #[test]
    fn test_harvester_starts_harvesting() {
        let obj = GameObject::new(ObjectId(2), ItemId::Harvester, HouseId::Ordos, Coord::new(0, 0));
        assert_eq!(obj.attack_mode, AttackMode::Harvest);
        assert_eq!(obj.destination(), Coord::INVALID);
        assert_eq!(obj.unit().map(|u| u.original_owner), Some(HouseId::Ordos));
    }

    #[test]
    fn test_waiting_to_place() {
        let mut yard = GameObject::new(ObjectId(3), ItemId::ConstructionYard, HouseId::Harkonnen, Coord::new(1, 1));
        assert!(!yard.is_waiting_to_place());
        if let Some(state) = yard.structure_mut() {
            let mut item = ProductionItem::new(ItemId::WindTrap, 300);
            item.progress = item.total_time;
            state.production.push(item);
        }
        assert!(yard.is_waiting_to_place());
        assert!(yard.is_busy());
    }
}
