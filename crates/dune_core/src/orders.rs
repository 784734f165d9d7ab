//! Orders issued by players and bots.
//!
//! Orders are intents. The simulation validates each one (ownership,
//! affordability, build lists) when it executes them, so a stale order
//! against a destroyed object simply fails.

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::items::ItemId;
use crate::objects::{AttackMode, ObjectId};

/// A single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Queue an item at a builder.
    ProduceItem {
        /// Producing structure.
        builder: ObjectId,
        /// Item to produce.
        item: ItemId,
    },
    /// Place the finished structure waiting at a construction yard.
    PlaceStructure {
        /// Yard holding the finished structure.
        builder: ObjectId,
        /// Top-left tile.
        location: Coord,
    },
    /// Remove an item from a builder's queue and refund it.
    CancelItem {
        /// Producing structure.
        builder: ObjectId,
        /// Item to cancel.
        item: ItemId,
    },
    /// Start the builder's next upgrade.
    Upgrade {
        /// Structure to upgrade.
        builder: ObjectId,
    },
    /// Repair a structure in place or send a unit to a repair yard.
    Repair {
        /// Object to repair.
        object: ObjectId,
    },
    /// Change a unit's posture.
    SetAttackMode {
        /// Unit to change.
        unit: ObjectId,
        /// New posture.
        mode: AttackMode,
    },
    /// Walk to a tile.
    Move {
        /// Unit to move.
        unit: ObjectId,
        /// Target tile.
        destination: Coord,
        /// Mark the move as explicitly ordered.
        forced: bool,
    },
    /// Attack a specific object.
    AttackObject {
        /// Attacking unit.
        unit: ObjectId,
        /// Object to attack.
        target: ObjectId,
        /// Mark the attack as explicitly ordered.
        forced: bool,
    },
    /// Turn an MCV into a construction yard where it stands.
    Deploy {
        /// The MCV.
        unit: ObjectId,
    },
    /// Fire a charged palace superweapon.
    LaunchSpecialWeapon {
        /// Charged palace.
        palace: ObjectId,
        /// Target tile.
        target: Coord,
    },
    /// Ask for a carryall to fly the unit to its destination.
    RequestCarryallDrop {
        /// Unit to carry.
        unit: ObjectId,
    },
    /// Self-destruct a devastator.
    Devastate {
        /// The devastator.
        unit: ObjectId,
    },
}

impl Order {
    /// The object the order acts on; the issuer must own it.
    #[must_use]
    pub const fn actor(&self) -> ObjectId {
        match *self {
            Self::ProduceItem { builder, .. }
            | Self::PlaceStructure { builder, .. }
            | Self::CancelItem { builder, .. }
            | Self::Upgrade { builder } => builder,
            Self::Repair { object } => object,
            Self::SetAttackMode { unit, .. }
            | Self::Move { unit, .. }
            | Self::AttackObject { unit, .. }
            | Self::Deploy { unit }
            | Self::RequestCarryallDrop { unit }
            | Self::Devastate { unit } => unit,
            Self::LaunchSpecialWeapon { palace, .. } => palace,
        }
    }
}

/// Ordered buffer of orders collected during one decision pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orders {
    orders: Vec<Order>,
}

impl Orders {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order.
    pub fn push(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// Queue production.
    pub fn produce_item(&mut self, builder: ObjectId, item: ItemId) {
        self.push(Order::ProduceItem { builder, item });
    }

    /// Place a finished structure.
    pub fn place_structure(&mut self, builder: ObjectId, location: Coord) {
        self.push(Order::PlaceStructure { builder, location });
    }

    /// Cancel queued production.
    pub fn cancel_item(&mut self, builder: ObjectId, item: ItemId) {
        self.push(Order::CancelItem { builder, item });
    }

    /// Start an upgrade.
    pub fn upgrade(&mut self, builder: ObjectId) {
        self.push(Order::Upgrade { builder });
    }

    /// Repair.
    pub fn repair(&mut self, object: ObjectId) {
        self.push(Order::Repair { object });
    }

    /// Change posture.
    pub fn set_attack_mode(&mut self, unit: ObjectId, mode: AttackMode) {
        self.push(Order::SetAttackMode { unit, mode });
    }

    /// Move to a tile.
    pub fn move_to(&mut self, unit: ObjectId, destination: Coord, forced: bool) {
        self.push(Order::Move {
            unit,
            destination,
            forced,
        });
    }

    /// Attack an object.
    pub fn attack_object(&mut self, unit: ObjectId, target: ObjectId, forced: bool) {
        self.push(Order::AttackObject {
            unit,
            target,
            forced,
        });
    }

    /// Deploy an MCV.
    pub fn deploy(&mut self, unit: ObjectId) {
        self.push(Order::Deploy { unit });
    }

    /// Fire a palace.
    pub fn launch_special_weapon(&mut self, palace: ObjectId, target: Coord) {
        self.push(Order::LaunchSpecialWeapon { palace, target });
    }

    /// Request a carryall drop.
    pub fn request_carryall_drop(&mut self, unit: ObjectId) {
        self.push(Order::RequestCarryallDrop { unit });
    }

    /// Self-destruct a devastator.
    pub fn devastate(&mut self, unit: ObjectId) {
        self.push(Order::Devastate { unit });
    }

    /// Orders in issue order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// No orders issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Take the orders out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.orders)
    }

    /// Orders as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Order] {
        &self.orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor() {
        let order = Order::LaunchSpecialWeapon {
            palace: ObjectId(9),
            target: Coord::new(1, 2),
        };
        assert_eq!(order.actor(), ObjectId(9));
        assert_eq!(
            Order::AttackObject {
                unit: ObjectId(3),
                target: ObjectId(4),
                forced: false
            }
            .actor(),
            ObjectId(3)
        );
    }

    #[test]
    fn test_buffer_preserves_issue_order() {
        let mut orders = Orders::new();
        orders.produce_item(ObjectId(1), ItemId::WindTrap);
        orders.set_attack_mode(ObjectId(2), AttackMode::Hunt);
        assert_eq!(orders.len(), 2);
        let taken = orders.take();
        assert!(orders.is_empty());
        assert!(matches!(taken[0], Order::ProduceItem { item: ItemId::WindTrap, .. }));
    }
}
