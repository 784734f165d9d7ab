//! Placement search for new structures.
//!
//! Candidates are the top-left positions adjacent to each existing own
//! structure. Each legal candidate is scored by looking at the tiles in
//! and around its footprint; the highest score wins and the first
//! candidate found keeps ties. Structure iteration order is the arena's
//! creation order, so the result is the same on every machine.
//!
//! An MCV that cannot deploy where it stands falls back to a scan of the
//! whole map for the closest legal construction yard spot.

use dune_core::coord::Coord;
use dune_core::house::HouseId;
use dune_core::items::{ItemId, ItemRole};
use dune_core::math::{round_to_i32, Fixed};
use dune_core::objects::ObjectId;
use dune_core::world::{PlacementRules, World};

/// Score of a padded tile outside the map.
pub const OFF_MAP: i32 = -200;
/// Score of a padded tile on the map edge.
pub const MAP_EDGE: i32 = -10;
/// Score of a padded tile covered by a friendly structure.
pub const FRIENDLY_STRUCTURE: i32 = 3;
/// Score of a padded tile covered by an enemy structure.
pub const ENEMY_STRUCTURE: i32 = -10;
/// Score of an empty padded tile that is not rock.
pub const OPEN_GROUND: i32 = 1;
/// Score of a padded tile holding a friendly unit.
pub const FRIENDLY_UNIT: i32 = -20;
/// Score of a padded tile holding a foreign unit.
pub const FOREIGN_UNIT: i32 = -100;
/// Bonus for lining up with the neighbour along an axis.
pub const ALIGNMENT: i32 = 10;

/// Reusable placement scorer.
///
/// The tile part of a candidate's score does not depend on which
/// neighbour produced it, so it is memoised per top-left tile for the
/// duration of one search. The memo is sized to the map.
#[derive(Debug, Clone, Default)]
pub struct PlacementSearch {
    width: i32,
    memo: Vec<Option<i32>>,
}

impl PlacementSearch {
    /// Empty scorer; the memo grows to the map on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, world: &World) {
        let map = world.map();
        let len = usize::try_from(map.area()).unwrap_or(0);
        self.width = map.width();
        self.memo.clear();
        self.memo.resize(len, None);
    }

    fn memo_slot(&mut self, c: Coord) -> Option<&mut Option<i32>> {
        if c.x < 0 || c.y < 0 || c.x >= self.width {
            return None;
        }
        let index = usize::try_from(c.y * self.width + c.x).ok()?;
        self.memo.get_mut(index)
    }

    /// Best location for `item` next to one of `house`'s structures, or
    /// [`Coord::INVALID`] when nothing legal exists.
    ///
    /// `rally` and `base_centre` pull builders and turrets toward the
    /// front; either may be invalid, in which case that pull is skipped.
    pub fn find_place_location(
        &mut self,
        world: &World,
        house: HouseId,
        item: ItemId,
        rally: Coord,
        base_centre: Coord,
    ) -> Coord {
        self.find_with_rules(world, house, item, rally, base_centre, PlacementRules::for_item(item))
    }

    fn find_with_rules(
        &mut self,
        world: &World,
        house: HouseId,
        item: ItemId,
        rally: Coord,
        base_centre: Coord,
        rules: PlacementRules,
    ) -> Coord {
        self.reset(world);
        let (width, height) = (item.width(), item.height());
        let pulled = item.role().intersects(ItemRole::BUILDER.union(ItemRole::DEFENSE));

        let mut best: Option<(i32, Coord)> = None;
        for structure in world.structures_of(house) {
            let origin = structure.location;
            let (sw, sh) = (structure.width(), structure.height());
            for y in origin.y - height..=origin.y + sh {
                for x in origin.x - width..=origin.x + sw {
                    let candidate = Coord::new(x, y);
                    if !world.okay_to_place_structure(house, item, candidate, rules) {
                        continue;
                    }
                    let mut score = self.tile_score(world, house, item, candidate);
                    if x == origin.x && width == sw {
                        score += ALIGNMENT;
                    }
                    if y == origin.y && height == sh {
                        score += ALIGNMENT;
                    }
                    if pulled {
                        if rally.is_valid() {
                            score -= round_to_i32(candidate.block_distance(rally));
                        }
                        if base_centre.is_valid() {
                            score -= round_to_i32(candidate.block_distance(base_centre));
                        }
                    }
                    if best.map_or(true, |(s, _)| score > s) {
                        best = Some((score, candidate));
                    }
                }
            }
        }
        best.map_or(Coord::INVALID, |(_, c)| c)
    }

    fn tile_score(&mut self, world: &World, house: HouseId, item: ItemId, at: Coord) -> i32 {
        if let Some(Some(score)) = self.memo_slot(at).map(|s| *s) {
            return score;
        }
        let score = score_tiles(world, house, item, at);
        if let Some(slot) = self.memo_slot(at) {
            *slot = Some(score);
        }
        score
    }

    /// Where an MCV should set up: the best spot next to an existing
    /// structure, otherwise the legal yard position closest to the MCV.
    pub fn find_mcv_location(&mut self, world: &World, house: HouseId, mcv: ObjectId) -> Coord {
        let Some(unit) = world.object(mcv) else {
            return Coord::INVALID;
        };
        let from = unit.location;
        let rules = PlacementRules {
            tolerate_units: false,
            require_build_range: false,
            ignore_unit: Some(mcv),
        };
        let adjacent = self.find_with_rules(
            world,
            house,
            ItemId::ConstructionYard,
            Coord::INVALID,
            Coord::INVALID,
            rules,
        );
        if adjacent.is_valid() {
            return adjacent;
        }

        let mut best: Option<(Fixed, Coord)> = None;
        for tile in world.map().coords() {
            if !world.okay_to_place_structure(house, ItemId::ConstructionYard, tile, rules) {
                continue;
            }
            let distance = from.block_distance(tile);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, tile));
            }
        }
        best.map_or(Coord::INVALID, |(_, c)| c)
    }
}

/// Sum of per-tile scores over the footprint padded by one tile.
#[must_use]
pub fn score_tiles(world: &World, house: HouseId, item: ItemId, at: Coord) -> i32 {
    let map = world.map();
    let mut score = 0;
    for y in at.y - 1..=at.y + item.height() {
        for x in at.x - 1..=at.x + item.width() {
            let tile = Coord::new(x, y);
            if !map.contains(tile) {
                score += OFF_MAP;
                continue;
            }
            if map.is_edge(tile) {
                score += MAP_EDGE;
            }
            match world.structure_at(tile) {
                Some(s) if world.is_enemy(house, s.owner) => score += ENEMY_STRUCTURE,
                Some(_) => score += FRIENDLY_STRUCTURE,
                None => {
                    let rock = map.terrain(tile).is_some_and(|t| t.is_rock());
                    if !rock && !world.tile_has_ground_unit(tile) {
                        score += OPEN_GROUND;
                    }
                }
            }
            for unit in world.ground_units_at(tile) {
                if world.is_enemy(house, unit.owner) {
                    score += FOREIGN_UNIT;
                } else if item != ItemId::RocketTurret {
                    score += FRIENDLY_UNIT;
                }
            }
        }
    }
    score
}
