//! Item catalogue: every structure and unit type with its static data.
//!
//! Item ids are stable numeric values so they can index count tables and
//! be written into save streams. Structures occupy `1..=19`, units `20..=39`.

use serde::{Deserialize, Serialize};

/// Identifier of a structure or unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ItemId {
    Barracks = 1,
    ConstructionYard,
    GunTurret,
    HeavyFactory,
    HighTechFactory,
    IX,
    LightFactory,
    Palace,
    Radar,
    Refinery,
    RepairYard,
    RocketTurret,
    Silo,
    Slab1,
    Slab4,
    StarPort,
    Wall,
    WindTrap,
    WOR,
    Carryall = 20,
    Devastator,
    Deviator,
    Frigate,
    Harvester,
    Soldier,
    Launcher,
    MCV,
    Ornithopter,
    Quad,
    Saboteur,
    Sandworm,
    SiegeTank,
    SonicTank,
    Tank,
    Trike,
    RaiderTrike,
    Trooper,
    Infantry,
    Troopers,
}

impl ItemId {
    /// Size of a table indexed by [`ItemId::index`].
    pub const COUNT: usize = 40;

    /// Every item, in id order.
    pub const ALL: [Self; 39] = [
        Self::Barracks,
        Self::ConstructionYard,
        Self::GunTurret,
        Self::HeavyFactory,
        Self::HighTechFactory,
        Self::IX,
        Self::LightFactory,
        Self::Palace,
        Self::Radar,
        Self::Refinery,
        Self::RepairYard,
        Self::RocketTurret,
        Self::Silo,
        Self::Slab1,
        Self::Slab4,
        Self::StarPort,
        Self::Wall,
        Self::WindTrap,
        Self::WOR,
        Self::Carryall,
        Self::Devastator,
        Self::Deviator,
        Self::Frigate,
        Self::Harvester,
        Self::Soldier,
        Self::Launcher,
        Self::MCV,
        Self::Ornithopter,
        Self::Quad,
        Self::Saboteur,
        Self::Sandworm,
        Self::SiegeTank,
        Self::SonicTank,
        Self::Tank,
        Self::Trike,
        Self::RaiderTrike,
        Self::Trooper,
        Self::Infantry,
        Self::Troopers,
    ];

    /// Table index (the raw id).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up an item by raw id.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| *item as u8 == value)
    }

    /// Static data for this item.
    #[must_use]
    pub fn data(self) -> &'static ItemData {
        &ITEM_TABLE[self.index() - 1]
    }

    /// Base purchase price.
    #[must_use]
    pub fn price(self) -> i32 {
        self.data().price
    }

    /// Role flags.
    #[must_use]
    pub fn role(self) -> ItemRole {
        self.data().role
    }

    /// True for structures.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        (self as u8) < 20
    }

    /// True for units.
    #[must_use]
    pub const fn is_unit(self) -> bool {
        (self as u8) >= 20
    }

    /// True for foot soldiers.
    #[must_use]
    pub fn is_infantry(self) -> bool {
        self.role().contains(ItemRole::INFANTRY)
    }

    /// True for flying units.
    #[must_use]
    pub fn is_aircraft(self) -> bool {
        self.role().contains(ItemRole::AIR)
    }

    /// True for Quad, Trike and Raider Trike.
    #[must_use]
    pub fn is_light_vehicle(self) -> bool {
        self.role().contains(ItemRole::LIGHT_VEHICLE)
    }

    /// True for Tank, Siege Tank, Devastator and Sonic Tank.
    #[must_use]
    pub fn is_heavy_tank(self) -> bool {
        self.role().contains(ItemRole::HEAVY_TANK)
    }

    /// Footprint width in tiles (1 for units).
    #[must_use]
    pub fn width(self) -> i32 {
        self.data().width
    }

    /// Footprint height in tiles (1 for units).
    #[must_use]
    pub fn height(self) -> i32 {
        self.data().height
    }

    /// Weapon range in tiles, 0 when unarmed.
    #[must_use]
    pub fn weapon_range(self) -> i32 {
        self.data().weapon.map_or(0, |w| w.range)
    }

    /// Radius around an area-guard post inside which intruders are engaged.
    #[must_use]
    pub fn guard_range(self) -> i32 {
        self.weapon_range().max(4) + 2
    }

    /// Cost of the next upgrade for a builder of this type.
    #[must_use]
    pub fn upgrade_cost(self) -> i32 {
        self.price() / 2
    }

    /// Structure that normally produces this item.
    #[must_use]
    pub const fn builder(self) -> Option<Self> {
        match self {
            _ if self.is_structure() => Some(Self::ConstructionYard),
            Self::Soldier | Self::Infantry => Some(Self::Barracks),
            Self::Trooper | Self::Troopers => Some(Self::WOR),
            Self::Trike | Self::RaiderTrike | Self::Quad => Some(Self::LightFactory),
            Self::Harvester
            | Self::MCV
            | Self::Tank
            | Self::Launcher
            | Self::SiegeTank
            | Self::Devastator
            | Self::SonicTank
            | Self::Deviator => Some(Self::HeavyFactory),
            Self::Carryall | Self::Ornithopter => Some(Self::HighTechFactory),
            _ => None,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.data().name
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitflags for fast item classification queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemRole(u32);

impl ItemRole {
    /// Placed on the map as a building.
    pub const STRUCTURE: Self = Self(1 << 0);
    /// Mobile unit.
    pub const UNIT: Self = Self(1 << 1);
    /// Moves on the ground.
    pub const GROUND: Self = Self(1 << 2);
    /// Flies.
    pub const AIR: Self = Self(1 << 3);
    /// Foot soldier.
    pub const INFANTRY: Self = Self(1 << 4);
    /// Quad, Trike, Raider Trike.
    pub const LIGHT_VEHICLE: Self = Self(1 << 5);
    /// Tracked heavy armour.
    pub const HEAVY_TANK: Self = Self(1 << 6);
    /// Long-range unit that should avoid melee.
    pub const ARTILLERY: Self = Self(1 << 7);
    /// Produces other items.
    pub const BUILDER: Self = Self(1 << 8);
    /// Static defence.
    pub const DEFENSE: Self = Self(1 << 9);
    /// Refinery, silo, wind trap, harvester.
    pub const ECONOMY: Self = Self(1 << 10);
    /// Wall or slab.
    pub const FORTIFICATION: Self = Self(1 << 11);
    /// House special unit.
    pub const SPECIAL: Self = Self(1 << 12);

    /// Empty role (no flags set).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two roles (union of flags).
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Weapon statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weapon {
    /// Damage per shot.
    pub damage: i32,
    /// Range in tiles.
    pub range: i32,
    /// Cycles between shots.
    pub reload: u32,
}

/// Static per-item data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemData {
    /// Display name.
    pub name: &'static str,
    /// Base price in credits.
    pub price: i32,
    /// Footprint width.
    pub width: i32,
    /// Footprint height.
    pub height: i32,
    /// Hit points at full health.
    pub max_health: i32,
    /// Power consumed.
    pub power_demand: i32,
    /// Power produced.
    pub power_supply: i32,
    /// Spice storage provided.
    pub spice_capacity: i32,
    /// Cycles to build.
    pub build_time: u32,
    /// Minimum mission tech level.
    pub tech_level: u8,
    /// Cycles per tile moved, 0 when immobile.
    pub speed: u32,
    /// Weapon, if armed.
    pub weapon: Option<Weapon>,
    /// Classification flags.
    pub role: ItemRole,
}

const S: ItemRole = ItemRole::STRUCTURE;
const BUILDER: ItemRole = ItemRole::STRUCTURE.union(ItemRole::BUILDER);
const ECONOMY: ItemRole = ItemRole::STRUCTURE.union(ItemRole::ECONOMY);
const DEFENSE: ItemRole = ItemRole::STRUCTURE.union(ItemRole::DEFENSE);
const FORT: ItemRole = ItemRole::STRUCTURE.union(ItemRole::FORTIFICATION);
const GROUND: ItemRole = ItemRole::UNIT.union(ItemRole::GROUND);
const AIR: ItemRole = ItemRole::UNIT.union(ItemRole::AIR);
const FOOT: ItemRole = GROUND.union(ItemRole::INFANTRY);
const LIGHT: ItemRole = GROUND.union(ItemRole::LIGHT_VEHICLE);
const HEAVY: ItemRole = GROUND.union(ItemRole::HEAVY_TANK);
const ARTILLERY: ItemRole = GROUND.union(ItemRole::ARTILLERY);

const fn armed(damage: i32, range: i32, reload: u32) -> Option<Weapon> {
    Some(Weapon {
        damage,
        range,
        reload,
    })
}

const fn structure(
    name: &'static str,
    price: i32,
    size: (i32, i32),
    max_health: i32,
    power_demand: i32,
    build_time: u32,
    tech_level: u8,
    role: ItemRole,
) -> ItemData {
    ItemData {
        name,
        price,
        width: size.0,
        height: size.1,
        max_health,
        power_demand,
        power_supply: 0,
        spice_capacity: 0,
        build_time,
        tech_level,
        speed: 0,
        weapon: None,
        role,
    }
}

const fn unit(
    name: &'static str,
    price: i32,
    max_health: i32,
    speed: u32,
    weapon: Option<Weapon>,
    tech_level: u8,
    role: ItemRole,
) -> ItemData {
    ItemData {
        name,
        price,
        width: 1,
        height: 1,
        max_health,
        power_demand: 0,
        power_supply: 0,
        spice_capacity: 0,
        build_time: (price as u32) / 2 + 40,
        tech_level,
        speed,
        weapon,
        role,
    }
}

static ITEM_TABLE: [ItemData; 39] = [
    structure("Barracks", 300, (2, 2), 600, 10, 300, 2, BUILDER),
    structure("Construction Yard", 400, (2, 2), 800, 0, 400, 1, BUILDER),
    ItemData {
        weapon: armed(20, 5, 30),
        ..structure("Gun Turret", 125, (1, 1), 700, 10, 160, 5, DEFENSE)
    },
    structure("Heavy Factory", 600, (3, 2), 800, 35, 480, 4, BUILDER),
    structure("High Tech Factory", 500, (3, 2), 800, 35, 400, 5, BUILDER),
    structure("IX", 500, (2, 2), 800, 40, 400, 7, S),
    structure("Light Factory", 400, (2, 2), 700, 20, 320, 3, BUILDER),
    structure("Palace", 999, (3, 3), 2000, 80, 800, 8, S),
    structure("Radar", 400, (2, 2), 800, 30, 320, 2, S),
    ItemData {
        spice_capacity: 1000,
        ..structure("Refinery", 400, (3, 2), 900, 30, 320, 1, ECONOMY)
    },
    structure("Repair Yard", 700, (3, 2), 1000, 20, 560, 5, S),
    ItemData {
        weapon: armed(40, 8, 60),
        ..structure("Rocket Turret", 250, (1, 1), 800, 20, 200, 6, DEFENSE)
    },
    ItemData {
        spice_capacity: 1000,
        ..structure("Silo", 150, (2, 2), 600, 5, 120, 2, ECONOMY)
    },
    structure("Slab", 5, (1, 1), 40, 0, 16, 1, FORT),
    structure("Slab 2x2", 20, (2, 2), 160, 0, 64, 4, FORT),
    structure("Star Port", 500, (3, 3), 1000, 50, 480, 6, BUILDER),
    structure("Wall", 50, (1, 1), 500, 0, 40, 4, FORT),
    ItemData {
        power_supply: 100,
        ..structure("Wind Trap", 300, (2, 2), 600, 0, 240, 1, ECONOMY)
    },
    structure("WOR", 400, (2, 2), 800, 20, 320, 5, BUILDER),
    unit("Carryall", 800, 500, 2, None, 5, AIR),
    unit("Devastator", 800, 1200, 12, armed(60, 4, 40), 8, HEAVY.union(ItemRole::SPECIAL)),
    unit("Deviator", 750, 600, 8, armed(0, 5, 80), 7, ARTILLERY.union(ItemRole::SPECIAL)),
    unit("Frigate", 0, 1000, 2, None, 1, AIR),
    unit("Harvester", 300, 900, 10, None, 1, GROUND.union(ItemRole::ECONOMY)),
    unit("Soldier", 60, 100, 14, armed(8, 2, 24), 1, FOOT),
    unit("Launcher", 450, 500, 9, armed(60, 7, 90), 5, ARTILLERY),
    unit("MCV", 900, 800, 10, None, 4, GROUND),
    unit("Ornithopter", 600, 400, 2, armed(40, 4, 30), 7, AIR),
    unit("Quad", 200, 350, 5, armed(18, 3, 20), 3, LIGHT),
    unit("Saboteur", 0, 150, 6, armed(300, 1, 1), 8, FOOT),
    unit("Sandworm", 0, 2000, 6, armed(500, 1, 200), 1, GROUND),
    unit("Siege Tank", 600, 1000, 10, armed(50, 5, 50), 6, HEAVY),
    unit(
        "Sonic Tank",
        600,
        900,
        9,
        armed(50, 5, 70),
        7,
        HEAVY.union(ItemRole::ARTILLERY).union(ItemRole::SPECIAL),
    ),
    unit("Tank", 300, 800, 8, armed(30, 4, 40), 4, HEAVY),
    unit("Trike", 150, 250, 4, armed(12, 3, 16), 2, LIGHT),
    unit("Raider Trike", 150, 250, 3, armed(12, 3, 16), 2, LIGHT),
    unit("Trooper", 100, 160, 14, armed(30, 4, 50), 3, FOOT),
    unit("Infantry", 100, 300, 14, armed(8, 2, 24), 2, FOOT),
    unit("Troopers", 200, 450, 14, armed(30, 4, 50), 4, FOOT),
];

/// Per-item counter table indexed by [`ItemId::index`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemCounts(Vec<u32>);

impl Default for ItemCounts {
    fn default() -> Self {
        Self(vec![0; ItemId::COUNT])
    }
}

impl ItemCounts {
    /// Create an all-zero table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from raw values; `None` if the length is wrong.
    #[must_use]
    pub fn from_vec(values: Vec<u32>) -> Option<Self> {
        (values.len() == ItemId::COUNT).then_some(Self(values))
    }

    /// Raw values in id order (index 0 unused).
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Count for one item.
    #[must_use]
    pub fn get(&self, item: ItemId) -> u32 {
        self.0.get(item.index()).copied().unwrap_or(0)
    }

    /// Overwrite the count for one item.
    pub fn set(&mut self, item: ItemId, value: u32) {
        if let Some(slot) = self.0.get_mut(item.index()) {
            *slot = value;
        }
    }

    /// Add one.
    pub fn increment(&mut self, item: ItemId) {
        self.add(item, 1);
    }

    /// Add `amount`.
    pub fn add(&mut self, item: ItemId, amount: u32) {
        if let Some(slot) = self.0.get_mut(item.index()) {
            *slot = slot.saturating_add(amount);
        }
    }

    /// Remove one, never going below zero.
    pub fn decrement(&mut self, item: ItemId) {
        if let Some(slot) = self.0.get_mut(item.index()) {
            *slot = slot.saturating_sub(1);
        }
    }

    /// Iterate `(item, count)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        ItemId::ALL.iter().map(|item| (*item, self.get(*item)))
    }

    /// Sum over every unit type.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.iter()
            .filter(|(item, _)| item.is_unit())
            .map(|(_, n)| n)
            .sum()
    }
}
