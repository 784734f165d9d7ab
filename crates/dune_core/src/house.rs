//! Houses, their economy counters and the CHOAM market.

use serde::{Deserialize, Serialize};

use crate::items::{ItemCounts, ItemId};

/// Identifier of a playable house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum HouseId {
    Harkonnen = 0,
    Atreides,
    Ordos,
    Fremen,
    Sardaukar,
    Mercenary,
}

impl HouseId {
    /// All houses in id order.
    pub const ALL: [Self; 6] = [
        Self::Harkonnen,
        Self::Atreides,
        Self::Ordos,
        Self::Fremen,
        Self::Sardaukar,
        Self::Mercenary,
    ];

    /// Numeric index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a house by numeric id.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Harkonnen => "Harkonnen",
            Self::Atreides => "Atreides",
            Self::Ordos => "Ordos",
            Self::Fremen => "Fremen",
            Self::Sardaukar => "Sardaukar",
            Self::Mercenary => "Mercenary",
        }
    }

    /// The heavy-factory unit only this house fields.
    #[must_use]
    pub const fn special_unit(self) -> ItemId {
        match self {
            Self::Harkonnen | Self::Sardaukar => ItemId::Devastator,
            Self::Atreides | Self::Fremen => ItemId::SonicTank,
            Self::Ordos | Self::Mercenary => ItemId::Deviator,
        }
    }

    /// The light-factory trike variant.
    #[must_use]
    pub const fn trike(self) -> ItemId {
        match self {
            Self::Ordos | Self::Mercenary => ItemId::RaiderTrike,
            _ => ItemId::Trike,
        }
    }

    /// Palace superweapon.
    #[must_use]
    pub const fn special_weapon(self) -> SpecialWeapon {
        match self {
            Self::Harkonnen | Self::Sardaukar => SpecialWeapon::DeathHand,
            Self::Atreides | Self::Fremen => SpecialWeapon::Fremen,
            Self::Ordos | Self::Mercenary => SpecialWeapon::Saboteur,
        }
    }
}

impl std::fmt::Display for HouseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Palace superweapon variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialWeapon {
    /// Missile strike at a target coordinate.
    DeathHand,
    /// Summons Fremen warriors.
    Fremen,
    /// Deploys a saboteur.
    Saboteur,
}

/// One item on the CHOAM market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChoamEntry {
    /// Current asking price.
    pub price: i32,
    /// Reference price the current price fluctuates around.
    pub base_price: i32,
    /// Units left in stock.
    pub stock: u32,
}

/// The Star Port market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choam {
    entries: Vec<ChoamEntry>,
}

impl Default for Choam {
    fn default() -> Self {
        Self {
            entries: vec![ChoamEntry::default(); ItemId::COUNT],
        }
    }
}

impl Choam {
    /// Goods offered at each tech level, with their maximum stock.
    pub const GOODS: [(ItemId, u8, u32); 9] = [
        (ItemId::Harvester, 1, 2),
        (ItemId::MCV, 4, 1),
        (ItemId::Carryall, 5, 2),
        (ItemId::Trike, 2, 5),
        (ItemId::Quad, 3, 5),
        (ItemId::Tank, 4, 4),
        (ItemId::Launcher, 5, 3),
        (ItemId::SiegeTank, 6, 3),
        (ItemId::Ornithopter, 7, 2),
    ];

    /// Stock the market for a mission tech level.
    #[must_use]
    pub fn new(tech_level: u8) -> Self {
        let mut choam = Self::default();
        for (item, min_tech, max_stock) in Self::GOODS {
            if tech_level >= min_tech {
                if let Some(entry) = choam.entries.get_mut(item.index()) {
                    *entry = ChoamEntry {
                        price: item.price(),
                        base_price: item.price(),
                        stock: max_stock,
                    };
                }
            }
        }
        choam
    }

    /// Market entry for an item.
    #[must_use]
    pub fn entry(&self, item: ItemId) -> ChoamEntry {
        self.entries.get(item.index()).copied().unwrap_or_default()
    }

    /// Mutable market entry.
    pub fn entry_mut(&mut self, item: ItemId) -> Option<&mut ChoamEntry> {
        self.entries.get_mut(item.index())
    }

    /// Current price, `None` when out of stock.
    #[must_use]
    pub fn price(&self, item: ItemId) -> Option<i32> {
        let entry = self.entry(item);
        (entry.stock > 0).then_some(entry.price)
    }

    /// Units in stock.
    #[must_use]
    pub fn available(&self, item: ItemId) -> u32 {
        self.entry(item).stock
    }

    /// Price is below the reference price.
    #[must_use]
    pub fn is_cheap(&self, item: ItemId) -> bool {
        let entry = self.entry(item);
        entry.stock > 0 && entry.price < entry.base_price
    }

    /// Take one unit out of stock.
    pub fn take(&mut self, item: ItemId) -> bool {
        match self.entries.get_mut(item.index()) {
            Some(entry) if entry.stock > 0 => {
                entry.stock -= 1;
                true
            }
            _ => false,
        }
    }
}

/// One player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct House {
    /// House identity.
    pub id: HouseId,
    /// Houses on the same team are allies.
    pub team: u8,
    /// Spendable credits.
    pub credits: i32,
    /// Spice banked in refineries and silos.
    pub stored_credits: i32,
    /// Maximum banked spice.
    pub capacity: i32,
    /// Power produced.
    pub power_supply: i32,
    /// Power consumed.
    pub power_demand: i32,
    /// Live items per type.
    pub owned: ItemCounts,
    /// Items lost per type.
    pub lost: ItemCounts,
    /// Enemy items destroyed per type.
    pub kills: ItemCounts,
    /// Controlled by a bot.
    pub is_ai: bool,
    /// False once defeated.
    pub active: bool,
    /// Star Port market.
    pub choam: Choam,
}

impl House {
    /// Create an active house.
    #[must_use]
    pub fn new(id: HouseId, team: u8, credits: i32) -> Self {
        Self {
            id,
            team,
            credits,
            stored_credits: 0,
            capacity: 0,
            power_supply: 0,
            power_demand: 0,
            owned: ItemCounts::new(),
            lost: ItemCounts::new(),
            kills: ItemCounts::new(),
            is_ai: false,
            active: true,
            choam: Choam::default(),
        }
    }

    /// Spendable plus banked credits.
    #[must_use]
    pub const fn total_credits(&self) -> i32 {
        self.credits + self.stored_credits
    }

    /// Spend credits, drawing on the bank first. Fails without change if short.
    pub fn spend(&mut self, amount: i32) -> bool {
        if amount > self.total_credits() {
            return false;
        }
        let from_store = amount.min(self.stored_credits);
        self.stored_credits -= from_store;
        self.credits -= amount - from_store;
        true
    }

    /// Bank harvested spice; anything above capacity is lost.
    pub fn store_spice(&mut self, amount: i32) -> i32 {
        let room = (self.capacity - self.stored_credits).max(0);
        let banked = amount.min(room);
        self.stored_credits += banked;
        banked
    }

    /// Return credits from a cancelled purchase.
    pub fn refund(&mut self, amount: i32) {
        self.credits += amount;
    }

    /// Wind traps cannot cover demand.
    #[must_use]
    pub const fn has_power_deficit(&self) -> bool {
        self.power_supply < self.power_demand
    }

    /// Total live structures.
    #[must_use]
    pub fn structure_count(&self) -> u32 {
        self.owned
            .iter()
            .filter(|(item, _)| item.is_structure())
            .map(|(_, n)| n)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_draws_bank_first() {
        let mut house = House::new(HouseId::Atreides, 1, 500);
        house.stored_credits = 200;
        assert!(house.spend(300));
        assert_eq!(house.stored_credits, 0);
        assert_eq!(house.credits, 400);
        assert!(!house.spend(401));
        assert_eq!(house.credits, 400);
    }

    #[test]
    fn test_store_spice_respects_capacity() {
        let mut house = House::new(HouseId::Ordos, 1, 0);
        house.capacity = 1000;
        assert_eq!(house.store_spice(700), 700);
        assert_eq!(house.store_spice(700), 300);
        assert_eq!(house.stored_credits, 1000);
    }

    #[test]
    fn test_house_specials() {
        assert_eq!(HouseId::Harkonnen.special_unit(), ItemId::Devastator);
        assert_eq!(HouseId::Fremen.special_unit(), ItemId::SonicTank);
        assert_eq!(HouseId::Mercenary.special_unit(), ItemId::Deviator);
        assert_eq!(HouseId::Sardaukar.special_weapon(), SpecialWeapon::DeathHand);
        assert_eq!(HouseId::Ordos.trike(), ItemId::RaiderTrike);
        assert_eq!(HouseId::from_u8(6), None);
    }

    #[test]
    fn test_choam_stock_and_cheapness() {
        let mut choam = Choam::new(4);
        assert_eq!(choam.price(ItemId::Tank), Some(300));
        assert_eq!(choam.price(ItemId::SiegeTank), None);
        assert!(!choam.is_cheap(ItemId::Tank));
        if let Some(entry) = choam.entry_mut(ItemId::Tank) {
            entry.price = 250;
        }
        assert!(choam.is_cheap(ItemId::Tank));
        assert!(choam.take(ItemId::MCV));
        assert!(!choam.take(ItemId::MCV));
        assert_eq!(choam.available(ItemId::MCV), 0);
    }
}
