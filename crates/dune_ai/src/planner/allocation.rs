//! Loss-weighted army mix.
//!
//! Unit kinds that keep dying get a smaller share of the army. Each kind's
//! weight is `(total_losses - kind_losses + 1) / (kind_losses + 1)`; the
//! shares are the weights over their sum. One kind is dropped per house
//! before summing, so that house's share is redistributed.

use dune_core::house::{House, HouseId};
use dune_core::items::{ItemCounts, ItemId};
use dune_core::math::Fixed;

/// Heavy unit kinds the mix is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmyKind {
    /// Rocket launchers.
    Launcher,
    /// The house special unit (Devastator, Deviator or Sonic Tank).
    Special,
    /// Siege tanks.
    Siege,
    /// Ornithopters.
    Ornithopter,
}

impl ArmyKind {
    /// Every weighted kind.
    pub const ALL: [Self; 4] = [Self::Launcher, Self::Special, Self::Siege, Self::Ornithopter];

    /// Items counted under this kind.
    #[must_use]
    pub const fn items(self) -> &'static [ItemId] {
        match self {
            Self::Launcher => &[ItemId::Launcher],
            Self::Special => &[ItemId::Devastator, ItemId::Deviator, ItemId::SonicTank],
            Self::Siege => &[ItemId::SiegeTank],
            Self::Ornithopter => &[ItemId::Ornithopter],
        }
    }

    /// The item a house builds for this kind.
    #[must_use]
    pub const fn item_for(self, house: HouseId) -> ItemId {
        match self {
            Self::Launcher => ItemId::Launcher,
            Self::Special => house.special_unit(),
            Self::Siege => ItemId::SiegeTank,
            Self::Ornithopter => ItemId::Ornithopter,
        }
    }

    /// Kind a house never weights.
    #[must_use]
    pub const fn excluded_for(house: HouseId) -> Self {
        match house {
            HouseId::Harkonnen | HouseId::Sardaukar => Self::Ornithopter,
            HouseId::Atreides | HouseId::Fremen => Self::Special,
            HouseId::Ordos | HouseId::Mercenary => Self::Launcher,
        }
    }

    fn count(self, counts: &ItemCounts) -> u32 {
        self.items().iter().map(|i| counts.get(*i)).sum()
    }
}

/// Items whose losses make up the loss total.
const LOSS_POOL: [ItemId; 6] = [
    ItemId::Tank,
    ItemId::Launcher,
    ItemId::SiegeTank,
    ItemId::Devastator,
    ItemId::Deviator,
    ItemId::SonicTank,
];

/// Target share of the army per kind; shares are non-negative and sum to
/// at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Allocation {
    /// Launcher share.
    pub launcher: Fixed,
    /// Special unit share.
    pub special: Fixed,
    /// Siege tank share.
    pub siege: Fixed,
    /// Ornithopter share.
    pub ornithopter: Fixed,
}

impl Allocation {
    /// Compute from the house's loss counters.
    #[must_use]
    pub fn from_losses(house: HouseId, lost: &ItemCounts) -> Self {
        let total: i64 = LOSS_POOL
            .iter()
            .chain(ArmyKind::Ornithopter.items())
            .map(|i| i64::from(lost.get(*i)))
            .sum();
        let excluded = ArmyKind::excluded_for(house);
        let weight = |kind: ArmyKind| {
            if kind == excluded {
                return Fixed::ZERO;
            }
            let own = i64::from(kind.count(lost));
            Fixed::from_num(total - own + 1) / Fixed::from_num(own + 1)
        };
        let weights = ArmyKind::ALL.map(weight);
        let sum: Fixed = weights.iter().copied().sum();
        if sum == Fixed::ZERO {
            return Self::default();
        }
        let share = |w: Fixed| w / sum;
        Self {
            launcher: share(weights[0]),
            special: share(weights[1]),
            siege: share(weights[2]),
            ornithopter: share(weights[3]),
        }
    }

    /// Allocation for a house.
    #[must_use]
    pub fn for_house(house: &House) -> Self {
        Self::from_losses(house.id, &house.lost)
    }

    /// Share of one kind.
    #[must_use]
    pub const fn share(&self, kind: ArmyKind) -> Fixed {
        match kind {
            ArmyKind::Launcher => self.launcher,
            ArmyKind::Special => self.special,
            ArmyKind::Siege => self.siege,
            ArmyKind::Ornithopter => self.ornithopter,
        }
    }

    /// Sum of all shares.
    #[must_use]
    pub fn total(&self) -> Fixed {
        self.launcher + self.special + self.siege + self.ornithopter
    }

    /// Value still missing for a kind to reach its share of `military_value`.
    #[must_use]
    pub fn deficit(&self, kind: ArmyKind, house: HouseId, counts: &ItemCounts, military_value: i32) -> Fixed {
        let target = self.share(kind) * Fixed::from_num(military_value);
        let current = i64::from(kind.count(counts)) * i64::from(kind.item_for(house).price());
        target - Fixed::from_num(current)
    }

    /// Most under-represented kind among `candidates` that `eligible`
    /// accepts, or `None` when no kind has a positive deficit.
    pub fn most_needed(
        &self,
        candidates: &[ArmyKind],
        house: HouseId,
        counts: &ItemCounts,
        military_value: i32,
        mut eligible: impl FnMut(ItemId) -> bool,
    ) -> Option<ItemId> {
        let mut best: Option<(Fixed, ItemId)> = None;
        for kind in candidates {
            let item = kind.item_for(house);
            let deficit = self.deficit(*kind, house, counts, military_value);
            if deficit <= Fixed::ZERO || !eligible(item) {
                continue;
            }
            if best.map_or(true, |(d, _)| deficit > d) {
                best = Some((deficit, item));
            }
        }
        best.map(|(_, item)| item)
    }
}
