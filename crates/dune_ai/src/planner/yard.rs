//! Construction yard decisions.

use dune_core::items::ItemId;
use dune_core::objects::GameObject;

use super::{BuildPass, UPGRADE_RESERVE};

/// Houses this rich with a near-capped army start fortifying.
pub const FORTIFY_MONEY: i32 = 4000;
/// Army share of the value limit that counts as near-capped.
pub const FORTIFY_ARMY_PERCENT: i32 = 90;
/// Spare power a custom base keeps.
pub const POWER_MARGIN: i32 = 100;
/// Money needed before the first star port.
pub const STAR_PORT_MONEY: i32 = 1500;

/// One rung of the construction ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Build(ItemId),
    Upgrade,
}

impl<'a> BuildPass<'a> {
    /// Rungs whose condition holds right now, in priority order.
    fn custom_ladder(&self) -> Vec<Step> {
        let house = self.house;
        let mut steps = Vec::new();
        let refineries = self.count(ItemId::Refinery);

        if self.count(ItemId::WindTrap) == 0 || house.has_power_deficit() {
            steps.push(Step::Build(ItemId::WindTrap));
        }
        if refineries == 0
            || (refineries < (self.limits.harvester_limit + 1) / 2
                && self.count(ItemId::Harvester) >= refineries * 2)
        {
            steps.push(Step::Build(ItemId::Refinery));
        }
        if self.count(ItemId::StarPort) == 0 && self.money > STAR_PORT_MONEY {
            steps.push(Step::Build(ItemId::StarPort));
        }
        for item in [
            ItemId::LightFactory,
            ItemId::HeavyFactory,
            ItemId::Radar,
            ItemId::RepairYard,
            ItemId::HighTechFactory,
            ItemId::IX,
        ] {
            if self.count(item) == 0 {
                steps.push(Step::Build(item));
            }
        }
        if house.power_supply < house.power_demand + POWER_MARGIN {
            steps.push(Step::Build(ItemId::WindTrap));
        }
        if self.storage_nearly_full() {
            steps.push(Step::Build(ItemId::Silo));
        }
        if self.count(ItemId::Palace) == 0 {
            steps.push(Step::Build(ItemId::Palace));
        }
        steps.push(Step::Upgrade);
        let near_cap = i64::from(self.military_value) * 100
            >= i64::from(self.limits.military_value_limit) * i64::from(FORTIFY_ARMY_PERCENT);
        if near_cap && self.money > FORTIFY_MONEY {
            steps.push(Step::Build(ItemId::RocketTurret));
            if !self.world.settings().only_one_palace {
                steps.push(Step::Build(ItemId::Palace));
            }
        }
        steps
    }

    /// Rebuild the starting layout, then expand storage and defences.
    fn campaign_ladder(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self
            .initial
            .map(|initial| {
                ItemId::ALL
                    .iter()
                    .copied()
                    .filter(|item| item.is_structure() && self.counts.get(*item) < initial.get(*item))
                    .map(Step::Build)
                    .collect()
            })
            .unwrap_or_default();
        steps.push(Step::Upgrade);
        if self.storage_nearly_full() {
            steps.push(Step::Build(ItemId::Silo));
        }
        if self.money > FORTIFY_MONEY {
            steps.push(Step::Build(ItemId::RocketTurret));
        }
        steps
    }

    /// Custom game construction ladder.
    pub(crate) fn custom_yard(&mut self, yard: &GameObject) {
        let steps = self.custom_ladder();
        self.climb(yard, &steps, 0);
    }

    /// Campaign construction ladder.
    pub(crate) fn campaign_yard(&mut self, yard: &GameObject) {
        let steps = self.campaign_ladder();
        self.climb(yard, &steps, UPGRADE_RESERVE);
    }

    /// Take the first rung the yard can act on. A chosen structure that
    /// cannot be paid for or placed ends the turn.
    fn climb(&mut self, yard: &GameObject, steps: &[Step], upgrade_reserve: i32) {
        let Some(state) = yard.structure() else {
            return;
        };
        for step in steps {
            match *step {
                Step::Upgrade => {
                    if self.try_upgrade(yard, upgrade_reserve) {
                        return;
                    }
                }
                Step::Build(item) => {
                    if state.is_available_to_build(item) {
                        self.produce_structure(yard, item);
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dune_core::coord::Coord;
    use dune_core::house::HouseId;
    use dune_core::items::ItemCounts;
    use dune_core::orders::{Order, Orders};
    use dune_core::world::World;
    use dune_test_utils::fixtures::WorldBuilder;

    use super::*;
    use crate::config::{Difficulty, GameMode};
    use crate::placement::PlacementSearch;
    use crate::planner::{Limits, PlaceHints};

    fn plan(world: &World, mode: GameMode, initial: Option<&ItemCounts>) -> Orders {
        let house = world.house(HouseId::Atreides).expect("house");
        let mut search = PlacementSearch::new();
        let mut hints = PlaceHints::new();
        let mut orders = Orders::new();
        let limits = Limits {
            harvester_limit: 4,
            military_value_limit: 10_000,
        };
        BuildPass::new(
            world,
            house,
            mode,
            Difficulty::Medium,
            limits,
            initial,
            Coord::INVALID,
            &mut search,
            &mut hints,
            &mut orders,
        )
        .run();
        orders
    }

    fn bare_yard(credits: i32) -> World {
        WorldBuilder::new(32, 32)
            .rock(Coord::new(0, 0), 32, 32)
            .ai_house(HouseId::Atreides, 1, credits)
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(10, 10))
            .build()
    }

    #[test]
    fn test_custom_yard_starts_with_power() {
        let world = bare_yard(3000);
        let orders = plan(&world, GameMode::Custom, None);
        assert!(matches!(
            orders.as_slice(),
            [Order::ProduceItem {
                item: ItemId::WindTrap,
                ..
            }]
        ));
    }

    #[test]
    fn test_unaffordable_rung_ends_turn() {
        let world = bare_yard(100);
        let orders = plan(&world, GameMode::Custom, None);
        assert!(orders.is_empty());
    }

    #[test]
    fn test_refinery_follows_windtrap() {
        let world = WorldBuilder::new(32, 32)
            .rock(Coord::new(0, 0), 32, 32)
            .ai_house(HouseId::Atreides, 1, 3000)
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(10, 10))
            .structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(13, 10))
            .build();
        let orders = plan(&world, GameMode::Custom, None);
        assert!(matches!(
            orders.as_slice(),
            [Order::ProduceItem {
                item: ItemId::Refinery,
                ..
            }]
        ));
    }

    #[test]
    fn test_campaign_yard_rebuilds_snapshot() {
        let world = WorldBuilder::new(32, 32)
            .campaign(5)
            .rock(Coord::new(0, 0), 32, 32)
            .ai_house(HouseId::Atreides, 1, 3000)
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(10, 10))
            .structure(HouseId::Atreides, ItemId::WindTrap, Coord::new(13, 10))
            .build();
        let mut initial = ItemCounts::new();
        initial.set(ItemId::ConstructionYard, 1);
        initial.set(ItemId::WindTrap, 2);
        let orders = plan(&world, GameMode::Campaign, Some(&initial));
        assert!(matches!(
            orders.as_slice(),
            [Order::ProduceItem {
                item: ItemId::WindTrap,
                ..
            }]
        ));
    }

    #[test]
    fn test_campaign_yard_idles_when_layout_complete() {
        let world = WorldBuilder::new(32, 32)
            .campaign(2)
            .rock(Coord::new(0, 0), 32, 32)
            .ai_house(HouseId::Atreides, 1, 500)
            .structure(HouseId::Atreides, ItemId::ConstructionYard, Coord::new(10, 10))
            .build();
        let mut initial = ItemCounts::new();
        initial.set(ItemId::ConstructionYard, 1);
        let orders = plan(&world, GameMode::Campaign, Some(&initial));
        assert!(orders.is_empty());
    }
}
