//! Scenario loading and world construction.
//!
//! A scenario describes the starting state of a headless game: map size and
//! terrain, the houses taking part (with an optional bot configuration each)
//! and the structures and units they start with.

use std::collections::BTreeSet;
use std::path::Path;

use dune_ai::BotConfig;
use dune_core::coord::Coord;
use dune_core::economy;
use dune_core::error::GameError;
use dune_core::house::{Choam, House, HouseId};
use dune_core::items::ItemId;
use dune_core::map::{Map, TerrainType};
use dune_core::settings::GameSettings;
use dune_core::world::World;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default game length, about ten minutes of game time.
pub const DEFAULT_TIME_LIMIT: u64 = 36_000;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario is well-formed but cannot be played.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// A structure or unit could not be spawned.
    #[error("Failed to build scenario world: {0}")]
    World(#[from] GameError),
}

/// A rectangle of terrain painted onto the sand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPatch {
    /// Terrain to paint.
    pub terrain: TerrainType,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
}

impl TerrainPatch {
    /// Create a patch.
    #[must_use]
    pub const fn new(terrain: TerrainType, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            terrain,
            x,
            y,
            width,
            height,
        }
    }
}

/// An item at a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Structure or unit type.
    pub item: ItemId,
    /// Tile x (top-left for structures).
    pub x: i32,
    /// Tile y.
    pub y: i32,
}

impl Placement {
    /// Create a placement.
    #[must_use]
    pub const fn new(item: ItemId, x: i32, y: i32) -> Self {
        Self { item, x, y }
    }
}

/// One house taking part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseSetup {
    /// House.
    pub house: HouseId,
    /// Team; houses on the same team are allies.
    pub team: u8,
    /// Starting credits.
    pub credits: i32,
    /// Bot configuration, `None` for a passive house.
    #[serde(default)]
    pub bot: Option<BotConfig>,
    /// Starting structures.
    #[serde(default)]
    pub structures: Vec<Placement>,
    /// Starting units.
    #[serde(default)]
    pub units: Vec<Placement>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map dimensions in tiles.
    pub map_size: (i32, i32),
    /// Game settings. The seed is replaced per game by the runner.
    #[serde(default)]
    pub settings: GameSettings,
    /// Terrain painted in order over an all-sand map.
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    /// Houses taking part.
    pub houses: Vec<HouseSetup>,
    /// Cycles before the game is called a draw.
    #[serde(default = "default_time_limit")]
    pub time_limit_ticks: u64,
}

fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish_1v1()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a scenario by built-in name or file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "skirmish_1v1" => Ok(Self::skirmish_1v1()),
            path => Self::load(path),
        }
    }

    /// Two Hard bots on a 64x64 map with a contested spice field.
    #[must_use]
    pub fn skirmish_1v1() -> Self {
        let bot = Some(BotConfig::new(dune_ai::Difficulty::Hard));
        Self {
            name: "skirmish_1v1".to_string(),
            description: "Atreides and Harkonnen bases in opposite corners".to_string(),
            map_size: (64, 64),
            settings: GameSettings::default(),
            terrain: vec![
                TerrainPatch::new(TerrainType::Rock, 2, 2, 20, 20),
                TerrainPatch::new(TerrainType::Rock, 42, 42, 20, 20),
                TerrainPatch::new(TerrainType::Spice, 26, 26, 12, 12),
            ],
            houses: vec![
                HouseSetup {
                    house: HouseId::Atreides,
                    team: 1,
                    credits: 3000,
                    bot,
                    structures: vec![
                        Placement::new(ItemId::ConstructionYard, 6, 6),
                        Placement::new(ItemId::WindTrap, 9, 6),
                        Placement::new(ItemId::Refinery, 6, 9),
                    ],
                    units: vec![Placement::new(ItemId::Harvester, 10, 10)],
                },
                HouseSetup {
                    house: HouseId::Harkonnen,
                    team: 2,
                    credits: 3000,
                    bot,
                    structures: vec![
                        Placement::new(ItemId::ConstructionYard, 54, 54),
                        Placement::new(ItemId::WindTrap, 51, 54),
                        Placement::new(ItemId::Refinery, 53, 51),
                    ],
                    units: vec![Placement::new(ItemId::Harvester, 52, 50)],
                },
            ],
            time_limit_ticks: DEFAULT_TIME_LIMIT,
        }
    }

    /// Copy of this scenario using `seed` for the simulation.
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.settings.seed = seed;
        self
    }

    /// Check the scenario can be played.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let (width, height) = self.map_size;
        if width <= 0 || height <= 0 {
            return Err(ScenarioError::Invalid(format!("map size {width}x{height}")));
        }
        if self.houses.is_empty() {
            return Err(ScenarioError::Invalid("no houses".to_string()));
        }
        let mut seen = BTreeSet::new();
        for setup in &self.houses {
            if !seen.insert(setup.house) {
                return Err(ScenarioError::Invalid(format!("house {} listed twice", setup.house)));
            }
        }
        Ok(())
    }

    /// Build the starting world: terrain, houses, then every house's
    /// structures followed by every house's units, in listed order.
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        self.validate()?;
        let (width, height) = self.map_size;
        let mut map = Map::new(width, height);
        for patch in &self.terrain {
            map.fill(Coord::new(patch.x, patch.y), patch.width, patch.height, patch.terrain);
        }

        let tech_level = self.settings.tech_level;
        let mut world = World::new(self.settings.clone(), map);
        for setup in &self.houses {
            let mut house = House::new(setup.house, setup.team, setup.credits);
            house.is_ai = setup.bot.is_some();
            house.choam = Choam::new(tech_level);
            world.add_house(house);
        }
        for setup in &self.houses {
            for placement in &setup.structures {
                world.spawn_structure(setup.house, placement.item, Coord::new(placement.x, placement.y))?;
            }
        }
        for setup in &self.houses {
            for placement in &setup.units {
                world.spawn_unit(setup.house, placement.item, Coord::new(placement.x, placement.y))?;
            }
        }
        economy::refresh_houses(&mut world);
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_file_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/skirmish_1v1.ron");
        let loaded = Scenario::load(&path).expect("bundled scenario");
        assert_eq!(loaded, Scenario::skirmish_1v1());
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load("does/not/exist.ron").expect_err("must fail");
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_minimal_ron_uses_defaults() {
        let ron = r#"(
            name: "tiny",
            map_size: (16, 16),
            houses: [
                (house: Ordos, team: 1, credits: 500),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron).expect("parse");
        assert_eq!(scenario.time_limit_ticks, DEFAULT_TIME_LIMIT);
        assert!(scenario.houses[0].bot.is_none());
        let world = scenario.build_world().expect("world");
        assert_eq!(world.objects().count(), 0);
        assert!(!world.house(HouseId::Ordos).expect("house").is_ai);
    }

    #[test]
    fn test_duplicate_house_rejected() {
        let mut scenario = Scenario::skirmish_1v1();
        scenario.houses[1].house = HouseId::Atreides;
        assert!(matches!(scenario.build_world(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_bad_placement_surfaces_game_error() {
        let mut scenario = Scenario::skirmish_1v1();
        scenario.houses[0]
            .structures
            .push(Placement::new(ItemId::WindTrap, 6, 6));
        assert!(matches!(scenario.build_world(), Err(ScenarioError::World(_))));
    }

    #[test]
    fn test_build_world_spawns_bases() {
        let world = Scenario::skirmish_1v1().with_seed(9).build_world().expect("world");
        assert_eq!(world.settings().seed, 9);
        assert_eq!(world.structures_of(HouseId::Atreides).count(), 3);
        assert_eq!(world.units_of(HouseId::Harkonnen).count(), 1);
        assert!(world.houses().all(|h| h.is_ai));
    }
}
