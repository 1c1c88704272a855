//! Crafter wants shared with harvesters.
//!
//! A crafter splits the materials a recipe needs into chunks and pushes
//! them here; any harvester able to collect a chunk takes it, collects it,
//! and deposits it in the bank, where the crafter's own collection finds
//! it. Once the crafter has made the item it retracts whatever is still
//! queued, so wants never outlive the goal that pushed them.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use artifacts_types::ItemQuantity;
use tokio::sync::Notify;

/// FIFO of wanted items.
#[derive(Debug, Default)]
pub struct WorkQueue {
    wants: Mutex<VecDeque<ItemQuantity>>,
    notify: Notify,
}

impl WorkQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ItemQuantity>> {
        self.wants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a want and wake waiting harvesters.
    pub fn push(&self, want: ItemQuantity) {
        self.lock().push_back(want);
        self.notify.notify_waiters();
    }

    /// Remove and return the oldest want accepted by `can_take`.
    pub fn take_matching<F>(&self, can_take: F) -> Option<ItemQuantity>
    where
        F: Fn(&ItemQuantity) -> bool,
    {
        let mut wants = self.lock();
        let index = wants.iter().position(can_take)?;
        wants.remove(index)
    }

    /// Whether any queued want is accepted by `can_take`.
    pub fn contains_matching<F>(&self, can_take: F) -> bool
    where
        F: Fn(&ItemQuantity) -> bool,
    {
        self.lock().iter().any(can_take)
    }

    /// Units of `code` still queued.
    pub fn queued(&self, code: &str) -> u32 {
        self.lock()
            .iter()
            .filter(|w| w.code == code)
            .fold(0_u32, |acc, w| acc.saturating_add(w.quantity))
    }

    /// Withdraw up to `quantity` queued units of `code`, newest first.
    /// Returns the units withdrawn; units a harvester already took are not
    /// touched.
    pub fn retract(&self, code: &str, quantity: u32) -> u32 {
        let mut wants = self.lock();
        let mut left = quantity;
        let mut index = wants.len();
        while left > 0 && index > 0 {
            index = index.saturating_sub(1);
            let Some(want) = wants.get_mut(index) else {
                break;
            };
            if want.code != code {
                continue;
            }
            let taken = want.quantity.min(left);
            want.quantity = want.quantity.saturating_sub(taken);
            left = left.saturating_sub(taken);
            if want.quantity == 0 {
                wants.remove(index);
            }
        }
        quantity.saturating_sub(left)
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of queued wants.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Wait until the next [`push`](Self::push).
    pub async fn pushed(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_matching_skips_wants_that_do_not_match() {
        let queue = WorkQueue::new();
        queue.push(ItemQuantity::new("iron_ore", 10));
        queue.push(ItemQuantity::new("ash_wood", 5));
        let taken = queue.take_matching(|w| w.code == "ash_wood");
        assert_eq!(taken, Some(ItemQuantity::new("ash_wood", 5)));
        assert_eq!(queue.len(), 1);
        assert!(queue.take_matching(|w| w.code == "ash_wood").is_none());
        assert!(!queue.is_empty());
    }

    #[test]
    fn retract_withdraws_newest_units_first() {
        let queue = WorkQueue::new();
        queue.push(ItemQuantity::new("ash_wood", 4));
        queue.push(ItemQuantity::new("iron_ore", 2));
        queue.push(ItemQuantity::new("ash_wood", 3));
        assert_eq!(queue.queued("ash_wood"), 7);

        assert_eq!(queue.retract("ash_wood", 5), 5);
        assert_eq!(queue.queued("ash_wood"), 2);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.retract("ash_wood", 10), 2);
        assert_eq!(queue.queued("ash_wood"), 0);
        assert_eq!(queue.take_matching(|_| true), Some(ItemQuantity::new("iron_ore", 2)));
        assert!(queue.is_empty());
    }
}
