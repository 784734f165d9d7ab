//! Tech tree: what each builder may produce.
//!
//! Build lists depend on the owning house, the mission tech level, the
//! builder's upgrade level and the structures the house already owns. The
//! simulation recomputes them every cycle; bots only read them.

use crate::house::{Choam, House, HouseId};
use crate::items::{ItemId, ItemRole};

/// Highest upgrade level a builder can have at all.
#[must_use]
pub const fn upgrade_cap(builder: ItemId) -> u8 {
    match builder {
        ItemId::ConstructionYard => 2,
        ItemId::HeavyFactory => 3,
        ItemId::LightFactory
        | ItemId::HighTechFactory
        | ItemId::Barracks
        | ItemId::WOR => 1,
        _ => 0,
    }
}

/// Tech level needed to reach an upgrade level.
#[must_use]
pub const fn upgrade_tech(builder: ItemId, level: u8) -> u8 {
    match (builder, level) {
        (ItemId::ConstructionYard, 1) => 4,
        (ItemId::ConstructionYard, _) => 6,
        (ItemId::HeavyFactory, 1) => 4,
        (ItemId::HeavyFactory, 2) => 5,
        (ItemId::HeavyFactory, _) => 6,
        (ItemId::LightFactory, _) => 3,
        (ItemId::HighTechFactory, _) => 7,
        (ItemId::Barracks, _) => 2,
        (ItemId::WOR, _) => 5,
        _ => u8::MAX,
    }
}

/// Highest upgrade level reachable at a tech level.
#[must_use]
pub fn max_upgrade_level(builder: ItemId, tech_level: u8) -> u8 {
    (1..=upgrade_cap(builder))
        .take_while(|level| tech_level >= upgrade_tech(builder, *level))
        .last()
        .unwrap_or(0)
}

/// Structures that must already exist before `item` can be built.
#[must_use]
pub const fn prerequisites(item: ItemId) -> &'static [ItemId] {
    match item {
        ItemId::Refinery | ItemId::Barracks | ItemId::Radar => &[ItemId::WindTrap],
        ItemId::Silo | ItemId::LightFactory | ItemId::StarPort => &[ItemId::Refinery],
        ItemId::HeavyFactory => &[ItemId::LightFactory],
        ItemId::HighTechFactory => &[ItemId::LightFactory, ItemId::Radar],
        ItemId::GunTurret | ItemId::RocketTurret | ItemId::WOR => &[ItemId::Radar],
        ItemId::RepairYard => &[ItemId::HeavyFactory],
        ItemId::IX => &[ItemId::Radar, ItemId::HeavyFactory],
        ItemId::Palace => &[ItemId::StarPort],
        _ => &[],
    }
}

/// House may never build this item.
#[must_use]
pub const fn is_forbidden(house: HouseId, item: ItemId) -> bool {
    match house {
        HouseId::Harkonnen | HouseId::Sardaukar => matches!(
            item,
            ItemId::Barracks | ItemId::Soldier | ItemId::Infantry | ItemId::Ornithopter
        ),
        HouseId::Atreides | HouseId::Fremen => {
            matches!(item, ItemId::WOR | ItemId::Trooper | ItemId::Troopers)
        }
        HouseId::Ordos | HouseId::Mercenary => matches!(item, ItemId::Launcher),
    }
}

fn has_prerequisites(house: &House, item: ItemId) -> bool {
    prerequisites(item)
        .iter()
        .all(|req| house.owned.get(*req) > 0)
}

/// Candidate items for a builder with the upgrade level each needs.
fn catalogue(builder: ItemId, house: HouseId) -> Vec<(ItemId, u8)> {
    match builder {
        ItemId::ConstructionYard => ItemId::ALL
            .iter()
            .copied()
            .filter(|item| item.is_structure() && *item != ItemId::ConstructionYard)
            .map(|item| {
                let level = match item {
                    ItemId::Slab4 => 1,
                    ItemId::RocketTurret => 2,
                    _ => 0,
                };
                (item, level)
            })
            .collect(),
        ItemId::Barracks => vec![(ItemId::Soldier, 0), (ItemId::Infantry, 1)],
        ItemId::WOR => vec![(ItemId::Trooper, 0), (ItemId::Troopers, 1)],
        ItemId::LightFactory => vec![(house.trike(), 0), (ItemId::Quad, 1)],
        ItemId::HeavyFactory => vec![
            (ItemId::Harvester, 0),
            (ItemId::Tank, 0),
            (ItemId::MCV, 1),
            (ItemId::Launcher, 2),
            (ItemId::SiegeTank, 3),
            (house.special_unit(), 3),
        ],
        ItemId::HighTechFactory => vec![(ItemId::Carryall, 0), (ItemId::Ornithopter, 1)],
        _ => Vec::new(),
    }
}

/// Items a builder owned by `house` may currently produce.
#[must_use]
pub fn build_list(house: &House, builder: ItemId, upgrade_level: u8, tech_level: u8) -> Vec<ItemId> {
    if builder == ItemId::StarPort {
        return star_port_goods(house, tech_level);
    }
    catalogue(builder, house.id)
        .into_iter()
        .filter(|(item, level)| {
            upgrade_level >= *level
                && tech_level >= item.data().tech_level
                && !is_forbidden(house.id, *item)
                && has_prerequisites(house, *item)
                && (!item.role().contains(ItemRole::SPECIAL)
                    || house.owned.get(ItemId::IX) > 0)
        })
        .map(|(item, _)| item)
        .collect()
}

fn star_port_goods(house: &House, tech_level: u8) -> Vec<ItemId> {
    Choam::GOODS
        .iter()
        .filter(|(item, min_tech, _)| {
            tech_level >= *min_tech
                && !is_forbidden(house.id, *item)
                && house.choam.available(*item) > 0
        })
        .map(|(item, _, _)| *item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house_with(id: HouseId, owned: &[ItemId]) -> House {
        let mut house = House::new(id, 1, 0);
        for item in owned {
            house.owned.increment(*item);
        }
        house
    }

    #[test]
    fn test_yard_needs_windtrap_before_refinery() {
        let house = house_with(HouseId::Atreides, &[ItemId::ConstructionYard]);
        let list = build_list(&house, ItemId::ConstructionYard, 0, 8);
        assert!(list.contains(&ItemId::WindTrap));
        assert!(list.contains(&ItemId::Slab1));
        assert!(!list.contains(&ItemId::Refinery));
        assert!(!list.contains(&ItemId::Slab4));
    }

    #[test]
    fn test_yard_upgrade_unlocks_rocket_turret() {
        let house = house_with(
            HouseId::Atreides,
            &[ItemId::ConstructionYard, ItemId::WindTrap, ItemId::Radar],
        );
        assert!(!build_list(&house, ItemId::ConstructionYard, 1, 8).contains(&ItemId::RocketTurret));
        assert!(build_list(&house, ItemId::ConstructionYard, 2, 8).contains(&ItemId::RocketTurret));
    }

    #[test]
    fn test_tech_level_gates_structures() {
        let house = house_with(HouseId::Ordos, &[ItemId::WindTrap, ItemId::Refinery]);
        assert!(!build_list(&house, ItemId::ConstructionYard, 0, 2).contains(&ItemId::LightFactory));
        assert!(build_list(&house, ItemId::ConstructionYard, 0, 3).contains(&ItemId::LightFactory));
    }

    #[test]
    fn test_heavy_factory_special_needs_ix() {
        let mut house = house_with(HouseId::Harkonnen, &[ItemId::HeavyFactory]);
        assert!(!build_list(&house, ItemId::HeavyFactory, 3, 8).contains(&ItemId::Devastator));
        house.owned.increment(ItemId::IX);
        let list = build_list(&house, ItemId::HeavyFactory, 3, 8);
        assert!(list.contains(&ItemId::Devastator));
        assert!(list.contains(&ItemId::Launcher));
    }

    #[test]
    fn test_house_restrictions() {
        let ordos = house_with(HouseId::Ordos, &[ItemId::HeavyFactory]);
        assert!(!build_list(&ordos, ItemId::HeavyFactory, 3, 8).contains(&ItemId::Launcher));
        let harkonnen = house_with(HouseId::Harkonnen, &[ItemId::WindTrap]);
        assert!(!build_list(&harkonnen, ItemId::ConstructionYard, 0, 8).contains(&ItemId::Barracks));
        let atreides = house_with(HouseId::Atreides, &[]);
        assert!(build_list(&atreides, ItemId::HighTechFactory, 1, 8).contains(&ItemId::Ornithopter));
    }

    #[test]
    fn test_max_upgrade_level_by_tech() {
        assert_eq!(max_upgrade_level(ItemId::HeavyFactory, 3), 0);
        assert_eq!(max_upgrade_level(ItemId::HeavyFactory, 5), 2);
        assert_eq!(max_upgrade_level(ItemId::HeavyFactory, 8), 3);
        assert_eq!(max_upgrade_level(ItemId::ConstructionYard, 4), 1);
        assert_eq!(max_upgrade_level(ItemId::Palace, 8), 0);
    }

    #[test]
    fn test_star_port_offers_stocked_goods() {
        let mut house = house_with(HouseId::Atreides, &[]);
        house.choam = Choam::new(6);
        let list = build_list(&house, ItemId::StarPort, 0, 6);
        assert!(list.contains(&ItemId::SiegeTank));
        assert!(!list.contains(&ItemId::Ornithopter));
    }
}
