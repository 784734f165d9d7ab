//! Unit production: factories and the star port.

use dune_core::house::{Choam, House};
use dune_core::items::ItemId;
use dune_core::objects::GameObject;

use super::allocation::{Allocation, ArmyKind};
use super::BuildPass;
use crate::config::GameMode;

/// Harvesters per carryall.
pub const HARVESTERS_PER_CARRYALL: i32 = 3;

impl<'a> BuildPass<'a> {
    fn can_build(builder: &GameObject, item: ItemId) -> bool {
        builder
            .structure()
            .is_some_and(|s| s.is_available_to_build(item))
    }

    fn needs_mcv(&self) -> bool {
        self.count(ItemId::ConstructionYard) + self.count(ItemId::MCV) == 0
    }

    fn needs_harvester(&self) -> bool {
        self.count(ItemId::Harvester) < self.limits.harvester_limit
    }

    fn produce_listed(&mut self, builder: &GameObject, item: ItemId) -> bool {
        Self::can_build(builder, item) && self.produce_unit(builder, item, item.price())
    }

    pub(crate) fn heavy_factory(&mut self, factory: &GameObject) {
        if self.needs_mcv() && self.produce_listed(factory, ItemId::MCV) {
            return;
        }
        if self.needs_harvester() && self.produce_listed(factory, ItemId::Harvester) {
            return;
        }
        if !self.below_value_limit() {
            return;
        }
        let allocation = Allocation::for_house(self.house);
        let pick = allocation
            .most_needed(
                &[ArmyKind::Launcher, ArmyKind::Special, ArmyKind::Siege],
                self.id(),
                &self.counts,
                self.military_value,
                |item| Self::can_build(factory, item),
            )
            .unwrap_or(ItemId::Tank);
        self.produce_listed(factory, pick);
    }

    pub(crate) fn light_factory(&mut self, factory: &GameObject) {
        if self.count(ItemId::HeavyFactory) > 0 || !self.below_value_limit() {
            return;
        }
        let trike = self.id().trike();
        if self.count(ItemId::Quad) <= self.count(trike) && self.produce_listed(factory, ItemId::Quad) {
            return;
        }
        self.produce_listed(factory, trike);
    }

    pub(crate) fn high_tech_factory(&mut self, factory: &GameObject) {
        let wanted = (self.count(ItemId::Harvester) + HARVESTERS_PER_CARRYALL - 1) / HARVESTERS_PER_CARRYALL;
        if self.count(ItemId::Carryall) < wanted && self.produce_listed(factory, ItemId::Carryall) {
            return;
        }
        if !self.below_value_limit() {
            return;
        }
        let allocation = Allocation::for_house(self.house);
        if let Some(item) = allocation.most_needed(
            &[ArmyKind::Ornithopter],
            self.id(),
            &self.counts,
            self.military_value,
            |item| Self::can_build(factory, item),
        ) {
            self.produce_listed(factory, item);
        }
    }

    pub(crate) fn infantry_factory(&mut self, barracks: &GameObject) {
        let Some(list) = barracks.structure().map(|s| s.build_list.clone()) else {
            return;
        };
        match self.mode {
            GameMode::Campaign => {
                let Some(initial) = self.initial else {
                    return;
                };
                if let Some(item) = list
                    .iter()
                    .copied()
                    .find(|item| self.counts.get(*item) < initial.get(*item))
                {
                    self.produce_listed(barracks, item);
                }
            }
            GameMode::Custom => {
                if self.count(ItemId::HeavyFactory) > 0 || !self.below_value_limit() {
                    return;
                }
                if let Some(item) = list.last().copied() {
                    self.produce_listed(barracks, item);
                }
            }
        }
    }

    /// Buy from CHOAM at market price.
    pub(crate) fn star_port(&mut self, port: &GameObject) {
        let house: &'a House = self.house;
        let choam = &house.choam;
        let buy = |pass: &mut Self, item: ItemId| {
            Self::can_build(port, item)
                && choam
                    .price(item)
                    .is_some_and(|price| pass.produce_unit(port, item, price))
        };
        if self.needs_mcv() && buy(self, ItemId::MCV) {
            return;
        }
        if self.needs_harvester() && buy(self, ItemId::Harvester) {
            return;
        }
        if self.below_value_limit() {
            for (item, _, _) in Choam::GOODS {
                let military = !matches!(item, ItemId::Harvester | ItemId::MCV | ItemId::Carryall);
                if military && choam.is_cheap(item) && buy(self, item) {
                    return;
                }
            }
        }
        if self.count(ItemId::Carryall) == 0 {
            buy(self, ItemId::Carryall);
        }
    }
}

#[cfg(test)]
mod tests {
    use dune_core::coord::Coord;
    use dune_core::house::HouseId;
    use dune_core::orders::{Order, Orders};
    use dune_core::world::World;
    use dune_test_utils::fixtures::WorldBuilder;

    use super::*;
    use crate::config::Difficulty;
    use crate::placement::PlacementSearch;
    use crate::planner::{Limits, PlaceHints};

    fn produced(world: &World, house: HouseId, limits: Limits) -> Vec<ItemId> {
        let owner = world.house(house).expect("house");
        let mut search = PlacementSearch::new();
        let mut hints = PlaceHints::new();
        let mut orders = Orders::new();
        BuildPass::new(
            world,
            owner,
            GameMode::Custom,
            Difficulty::Medium,
            limits,
            None,
            Coord::INVALID,
            &mut search,
            &mut hints,
            &mut orders,
        )
        .run();
        orders
            .iter()
            .filter_map(|o| match o {
                Order::ProduceItem { item, .. } => Some(*item),
                _ => None,
            })
            .collect()
    }

    fn limits(harvesters: i32, value: i32) -> Limits {
        Limits {
            harvester_limit: harvesters,
            military_value_limit: value,
        }
    }

    fn factory_base(house: HouseId, credits: i32, extra: &[(ItemId, Coord)]) -> World {
        let mut builder = WorldBuilder::new(32, 32)
            .rock(Coord::new(0, 0), 32, 32)
            .ai_house(house, 1, credits)
            .unit(house, ItemId::Harvester, Coord::new(20, 20))
            .structure(house, ItemId::ConstructionYard, Coord::new(1, 1))
            .structure(house, ItemId::WindTrap, Coord::new(4, 1))
            .structure(house, ItemId::Refinery, Coord::new(7, 1))
            .structure(house, ItemId::LightFactory, Coord::new(11, 1))
            .structure(house, ItemId::HeavyFactory, Coord::new(1, 5))
            .structure(house, ItemId::WindTrap, Coord::new(5, 5));
        for (item, at) in extra {
            builder = builder.structure(house, *item, *at);
        }
        builder.build()
    }

    #[test]
    fn test_heavy_factory_fills_harvesters_first() {
        let world = factory_base(HouseId::Atreides, 1000, &[]);
        let items = produced(&world, HouseId::Atreides, limits(3, 10_000));
        assert!(items.contains(&ItemId::Harvester));
        assert!(!items.contains(&ItemId::Tank));
    }

    #[test]
    fn test_heavy_factory_falls_back_to_tanks() {
        let world = factory_base(HouseId::Atreides, 1000, &[]);
        let items = produced(&world, HouseId::Atreides, limits(1, 10_000));
        assert!(items.contains(&ItemId::Tank));
    }

    #[test]
    fn test_value_limit_stops_army_production() {
        let world = factory_base(HouseId::Atreides, 1000, &[]);
        let items = produced(&world, HouseId::Atreides, limits(1, 0));
        assert!(!items.contains(&ItemId::Tank));
        assert!(!items.contains(&ItemId::Trike));
        assert!(!items.contains(&ItemId::Quad));
    }

    #[test]
    fn test_light_factory_defers_to_heavy_factory() {
        let world = factory_base(HouseId::Atreides, 1000, &[]);
        let items = produced(&world, HouseId::Atreides, limits(1, 10_000));
        assert!(!items.contains(&ItemId::Trike));
    }

    #[test]
    fn test_star_port_buys_carryall_when_none_owned() {
        let world = factory_base(HouseId::Atreides, 2000, &[(ItemId::StarPort, Coord::new(15, 5))]);
        let items = produced(&world, HouseId::Atreides, limits(1, 0));
        assert!(items.contains(&ItemId::Carryall));
    }
}
