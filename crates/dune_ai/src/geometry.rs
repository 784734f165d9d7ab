//! Squad geometry: where the army gathers, where the base is, where to
//! fall back to.
//!
//! Every function returns [`Coord::INVALID`] when the set it averages over
//! is empty. Callers check with [`Coord::is_valid`] before acting.

use dune_core::coord::Coord;
use dune_core::house::{House, HouseId};
use dune_core::items::ItemId;
use dune_core::math::Fixed;
use dune_core::objects::{AttackMode, GameObject};
use dune_core::world::World;

/// Tech level above which troopers walking to the rally point are left out
/// of the squad center.
pub const TROOPER_RALLY_TECH: u8 = 7;

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    x: i64,
    y: i64,
    n: i64,
}

impl Mean {
    fn add(&mut self, c: Coord) {
        self.x += i64::from(c.x);
        self.y += i64::from(c.y);
        self.n += 1;
    }

    fn sum(&self) -> Option<(i64, i64, i64)> {
        (self.n > 0).then_some((self.x, self.y, self.n))
    }

    fn coord(&self) -> Coord {
        self.sum().map_or(Coord::INVALID, |(x, y, n)| {
            Coord::new((x / n) as i32, (y / n) as i32)
        })
    }
}

/// Units that never join the fighting squad.
#[must_use]
pub fn is_squad_exempt(item: ItemId) -> bool {
    matches!(
        item,
        ItemId::Carryall
            | ItemId::Harvester
            | ItemId::Frigate
            | ItemId::MCV
            | ItemId::Sandworm
            | ItemId::Saboteur
    )
}

fn is_trooper_en_route(unit: &GameObject, rally: Coord, tech_level: u8) -> bool {
    tech_level > TROOPER_RALLY_TECH
        && matches!(unit.item, ItemId::Trooper | ItemId::Troopers)
        && unit.attack_mode == AttackMode::Guard
        && rally.is_valid()
        && unit.destination() == rally
}

/// Mean position of the house's fighting units.
#[must_use]
pub fn squad_center(world: &World, house: HouseId, rally: Coord) -> Coord {
    let tech_level = world.settings().tech_level;
    let mut mean = Mean::default();
    for unit in world.units_of(house) {
        if is_squad_exempt(unit.item) || is_trooper_en_route(unit, rally, tech_level) {
            continue;
        }
        mean.add(unit.location);
    }
    mean.coord()
}

/// Mean position of the house's structures, ignoring 1x1 ones.
#[must_use]
pub fn base_centre(world: &World, house: HouseId) -> Coord {
    let mut mean = Mean::default();
    for structure in world.structures_of(house) {
        if structure.width() == 1 && structure.height() == 1 {
            continue;
        }
        mean.add(structure.location);
    }
    mean.coord()
}

/// Three quarters of the way from the enemy's structures to our own.
#[must_use]
pub fn squad_rally_location(world: &World, house: HouseId) -> Coord {
    let mut own = Mean::default();
    let mut enemy = Mean::default();
    for structure in world.structures() {
        if structure.owner == house {
            own.add(structure.location);
        } else if world.is_enemy(house, structure.owner) {
            enemy.add(structure.location);
        }
    }
    let (Some((ox, oy, on)), Some((ex, ey, en))) = (own.sum(), enemy.sum()) else {
        return Coord::INVALID;
    };
    let x = (ox / on * 3 + ex / en) / 4;
    let y = (oy / on * 3 + ey / en) / 4;
    Coord::new(x as i32, y as i32)
}

/// Own structure tile closest to the rally point.
#[must_use]
pub fn squad_retreat_location(world: &World, house: HouseId, rally: Coord) -> Coord {
    if !rally.is_valid() {
        return Coord::INVALID;
    }
    let mut best: Option<(Fixed, Coord)> = None;
    for structure in world.structures_of(house) {
        for tile in structure.tiles() {
            let distance = tile.block_distance(rally);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, tile));
            }
        }
    }
    best.map_or(Coord::INVALID, |(_, c)| c)
}

/// Price-weighted size of the house's army. Harvesters and carryalls do
/// not count.
#[must_use]
pub fn military_value(house: &House) -> i32 {
    house
        .owned
        .iter()
        .filter(|(item, _)| item.is_unit() && !matches!(item, ItemId::Harvester | ItemId::Carryall))
        .map(|(item, n)| item.price() * n as i32)
        .sum()
}

/// House on an enemy team with the most structures; the first one wins ties.
#[must_use]
pub fn strongest_enemy(world: &World, house: HouseId) -> Option<HouseId> {
    let mut best: Option<(u32, HouseId)> = None;
    for other in world.houses() {
        if !world.is_enemy(house, other.id) {
            continue;
        }
        let count = other.structure_count();
        if count > 0 && best.map_or(true, |(c, _)| count > c) {
            best = Some((count, other.id));
        }
    }
    best.map(|(_, id)| id)
}
