//! Production queues for builder structures.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::items::ItemId;

/// An item being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionItem {
    /// Item being built.
    pub item: ItemId,
    /// Cycles of work done.
    pub progress: u32,
    /// Cycles of work needed.
    pub total_time: u32,
    /// Credits paid, returned on cancel.
    pub paid: i32,
}

impl ProductionItem {
    /// Start producing an item.
    #[must_use]
    pub fn new(item: ItemId, paid: i32) -> Self {
        Self {
            item,
            progress: 0,
            total_time: item.data().build_time.max(1),
            paid,
        }
    }

    /// Advance by one cycle.
    pub fn tick(&mut self) {
        if self.progress < self.total_time {
            self.progress += 1;
        }
    }

    /// Work is finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.progress >= self.total_time
    }
}

/// FIFO of items awaiting completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProductionQueue {
    /// Queued items, front is in progress.
    pub queue: VecDeque<ProductionItem>,
}

impl ProductionQueue {
    /// Maximum queue depth.
    pub const MAX_QUEUE_SIZE: usize = 5;

    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the queue is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.len() >= Self::MAX_QUEUE_SIZE
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Item at the front.
    #[must_use]
    pub fn current(&self) -> Option<&ProductionItem> {
        self.queue.front()
    }

    /// Mutable item at the front.
    pub fn current_mut(&mut self) -> Option<&mut ProductionItem> {
        self.queue.front_mut()
    }

    /// Append an item.
    pub fn push(&mut self, item: ProductionItem) -> bool {
        if self.is_full() {
            return false;
        }
        self.queue.push_back(item);
        true
    }

    /// Remove the front item.
    pub fn pop(&mut self) -> Option<ProductionItem> {
        self.queue.pop_front()
    }

    /// Remove the last queued instance of `item`.
    pub fn cancel(&mut self, item: ItemId) -> Option<ProductionItem> {
        let index = self.queue.iter().rposition(|p| p.item == item)?;
        self.queue.remove(index)
    }

    /// Number of queued instances of `item`.
    #[must_use]
    pub fn count_of(&self, item: ItemId) -> u32 {
        self.queue.iter().filter(|p| p.item == item).count() as u32
    }

    /// Items in queue order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.queue.iter().map(|p| p.item)
    }
}
