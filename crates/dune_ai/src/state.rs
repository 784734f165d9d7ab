//! Everything a bot remembers between decision passes, and its save format.
//!
//! The save stream is a fixed sequence of fields; see [`BotState::save`].
//! Loading validates every field and fails without side effects on the
//! first bad one.

use dune_core::coord::Coord;
use dune_core::error::{GameError, Result};
use dune_core::house::HouseId;
use dune_core::items::{ItemCounts, ItemId};
use dune_core::objects::ObjectId;
use dune_core::rng::SeededRng;
use dune_core::settings::{milli_to_cycles, GameSettings};
use dune_core::stream::{InputStream, OutputStream};

use crate::config::{Difficulty, GameMode, RETREAT_INTERVAL};
use crate::planner::{Limits, PlaceHint, PlaceHints};

/// Save format version.
pub const SAVE_VERSION: u32 = 2;

/// Attack timer for a new custom-game bot.
pub const CUSTOM_FIRST_ATTACK: i64 = milli_to_cycles(10_000);

/// Spreads bot seeds so two houses never share a sequence.
const SEED_SPREAD: u32 = 0x9E37_79B9;

/// First attack delay in a campaign mission, by tech level.
#[must_use]
pub const fn campaign_first_attack(tech_level: u8) -> i64 {
    let millis = match tech_level {
        6 => 540_000,
        7 => 600_000,
        8 => 720_000,
        _ => 480_000,
    };
    milli_to_cycles(millis)
}

/// Persistent bot state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotState {
    /// Controlled house.
    pub house: HouseId,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Mode.
    pub mode: GameMode,
    /// Cycles until the next build pass.
    pub build_timer: i64,
    /// Cycles until the next attack wave.
    pub attack_timer: i64,
    /// Cycles until the next forced retreat.
    pub retreat_timer: i64,
    /// Harvester and army ceilings.
    pub limits: Limits,
    /// Military value when the campaign snapshot was taken.
    pub initial_military_value: i32,
    /// Campaign starting layout, `None` until taken.
    pub initial_counts: Option<ItemCounts>,
    /// Squad center from the last pass.
    pub squad_center: Coord,
    /// Rally point.
    pub rally: Coord,
    /// Retreat point.
    pub retreat: Coord,
    /// A human player has attacked us in a campaign.
    pub campaign_attack_enabled: bool,
    /// Locations chosen when structures were queued, by yard.
    pub place_hints: PlaceHints,
    /// Bot-local randomness.
    pub rng: SeededRng,
}

impl BotState {
    /// Fresh state for a house.
    #[must_use]
    pub fn new(house: HouseId, difficulty: Difficulty, mode: GameMode, settings: &GameSettings) -> Self {
        let attack_timer = match mode {
            GameMode::Custom => CUSTOM_FIRST_ATTACK,
            GameMode::Campaign => campaign_first_attack(settings.tech_level),
        };
        let seed = settings
            .seed
            .wrapping_add((house.index() as u32).wrapping_mul(SEED_SPREAD));
        Self {
            house,
            difficulty,
            mode,
            build_timer: 0,
            attack_timer,
            retreat_timer: RETREAT_INTERVAL,
            limits: Limits::default(),
            initial_military_value: 0,
            initial_counts: None,
            squad_center: Coord::default(),
            rally: Coord::default(),
            retreat: Coord::default(),
            campaign_attack_enabled: false,
            place_hints: PlaceHints::new(),
            rng: SeededRng::new(seed),
        }
    }

    /// Write the state. Field order: version, house, difficulty, mode,
    /// build/attack/retreat timers, harvester limit, value limit, initial
    /// military value, snapshot flag, initial counts, squad center, rally,
    /// retreat, campaign flag, place hints (count, then yard id, item and
    /// location each), rng state.
    pub fn save(&self, out: &mut impl OutputStream) -> Result<()> {
        out.write_u32(SAVE_VERSION)?;
        out.write_u8(self.house as u8)?;
        out.write_u8(self.difficulty as u8)?;
        out.write_u8(self.mode as u8)?;
        for timer in [self.build_timer, self.attack_timer, self.retreat_timer] {
            out.write_i32(narrow(timer)?)?;
        }
        out.write_i32(self.limits.harvester_limit)?;
        out.write_i32(self.limits.military_value_limit)?;
        out.write_i32(self.initial_military_value)?;
        out.write_bool(self.initial_counts.is_some())?;
        let counts = self.initial_counts.clone().unwrap_or_default();
        out.write_u32(ItemId::COUNT as u32)?;
        for value in counts.as_slice() {
            out.write_u32(*value)?;
        }
        out.write_coord(self.squad_center)?;
        out.write_coord(self.rally)?;
        out.write_coord(self.retreat)?;
        out.write_bool(self.campaign_attack_enabled)?;
        out.write_len(self.place_hints.len())?;
        for (yard, hint) in &self.place_hints {
            out.write_u32(yard.0)?;
            out.write_u8(hint.item as u8)?;
            out.write_coord(hint.location)?;
        }
        out.write_u32(self.rng.state())
    }

    /// Read a state saved for `house`.
    pub fn load(input: &mut impl InputStream, house: HouseId) -> Result<Self> {
        let version = input.read_u32()?;
        if version != SAVE_VERSION {
            return Err(GameError::VersionMismatch {
                expected: SAVE_VERSION,
                found: version,
            });
        }
        let saved_house = input.read_u8()?;
        if HouseId::from_u8(saved_house) != Some(house) {
            return Err(GameError::InvalidState(format!(
                "bot state for house {saved_house} loaded into {house}"
            )));
        }
        let difficulty = input.read_u8()?;
        let difficulty = Difficulty::from_u8(difficulty)
            .ok_or_else(|| GameError::Persistence(format!("unknown difficulty {difficulty}")))?;
        let mode = input.read_u8()?;
        let mode = GameMode::from_u8(mode)
            .ok_or_else(|| GameError::Persistence(format!("unknown game mode {mode}")))?;
        let build_timer = i64::from(input.read_i32()?);
        let attack_timer = i64::from(input.read_i32()?);
        let retreat_timer = i64::from(input.read_i32()?);
        let limits = Limits {
            harvester_limit: input.read_i32()?,
            military_value_limit: input.read_i32()?,
        };
        let initial_military_value = input.read_i32()?;
        let snapshot_taken = input.read_bool()?;
        let len = input.read_u32()?;
        if len as usize != ItemId::COUNT {
            return Err(GameError::Persistence(format!(
                "item table length {len}, expected {}",
                ItemId::COUNT
            )));
        }
        let values = (0..len)
            .map(|_| input.read_u32())
            .collect::<Result<Vec<u32>>>()?;
        let counts = ItemCounts::from_vec(values)
            .ok_or_else(|| GameError::Persistence("bad item table".to_string()))?;
        let squad_center = input.read_coord()?;
        let rally = input.read_coord()?;
        let retreat = input.read_coord()?;
        let campaign_attack_enabled = input.read_bool()?;
        let place_hints = read_place_hints(input)?;
        let rng = SeededRng::from_state(input.read_u32()?);

        Ok(Self {
            house,
            difficulty,
            mode,
            build_timer,
            attack_timer,
            retreat_timer,
            limits,
            initial_military_value,
            initial_counts: snapshot_taken.then_some(counts),
            squad_center,
            rally,
            retreat,
            campaign_attack_enabled,
            place_hints,
            rng,
        })
    }
}

fn read_place_hints(input: &mut impl InputStream) -> Result<PlaceHints> {
    let len = input.read_len()?;
    let mut hints = PlaceHints::new();
    for _ in 0..len {
        let yard = ObjectId(input.read_u32()?);
        let raw = input.read_u8()?;
        let item = ItemId::from_u8(raw)
            .filter(|i| i.is_structure())
            .ok_or_else(|| GameError::Persistence(format!("place hint for item {raw}")))?;
        let location = input.read_coord()?;
        hints.insert(yard, PlaceHint { item, location });
    }
    Ok(hints)
}

fn narrow(timer: i64) -> Result<i32> {
    i32::try_from(timer).map_err(|_| GameError::Persistence(format!("timer {timer} out of range")))
}
