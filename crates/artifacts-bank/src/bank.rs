//! The shared bank.
//!
//! # Retry contract
//!
//! The bank is a cache of the server's contents, not a reservation system.
//! No lock is held across an action: two characters may both see ten
//! copper bars and both ask to withdraw them. The server accepts the first
//! withdraw and rejects the second with "item not found" or "insufficient
//! quantity". The losing caller must refresh the bank from the server,
//! [`replace`](Bank::replace) the contents, and re-evaluate from the top of
//! its loop. It must not retry the same withdraw blindly.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::snapshot::{BankChange, BankSnapshot, diff_contents};

/// Capacity of the bank event channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const EVENT_CAPACITY: usize = 256;

/// Published whenever the bank contents change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEvent {
    /// Revision after the change.
    pub revision: u64,
    /// Items that changed.
    pub changes: Vec<BankChange>,
}

#[derive(Debug, Default)]
struct Contents {
    items: BTreeMap<String, u32>,
    revision: u64,
}

/// Shared, mutex-guarded bank contents.
///
/// Every change bumps the revision, so a caller can tell whether the bank
/// moved since it last looked by comparing revisions.
#[derive(Debug)]
pub struct Bank {
    contents: Mutex<Contents>,
    tx: broadcast::Sender<BankEvent>,
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

impl Bank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::with_items(BTreeMap::new())
    }

    /// Create a bank holding the given contents.
    pub fn with_items(items: BTreeMap<String, u32>) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        let items = items.into_iter().filter(|(_, q)| *q > 0).collect();
        Self {
            contents: Mutex::new(Contents { items, revision: 0 }),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Contents> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> BankSnapshot {
        let contents = self.lock();
        BankSnapshot {
            items: contents.items.clone(),
            revision: contents.revision,
        }
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Banked quantity of an item.
    pub fn quantity(&self, code: &str) -> u32 {
        self.lock().items.get(code).copied().unwrap_or(0)
    }

    /// Overwrite the contents with the server's authoritative list.
    ///
    /// Returns the changes. Nothing is published and the revision is kept
    /// when the contents are unchanged.
    pub fn replace(&self, items: BTreeMap<String, u32>) -> Vec<BankChange> {
        let items: BTreeMap<String, u32> = items.into_iter().filter(|(_, q)| *q > 0).collect();
        let event = {
            let mut contents = self.lock();
            let changes = diff_contents(&contents.items, &items);
            if changes.is_empty() {
                return changes;
            }
            contents.items = items;
            contents.revision = contents.revision.wrapping_add(1);
            BankEvent {
                revision: contents.revision,
                changes,
            }
        };
        debug!(
            revision = event.revision,
            changed = event.changes.len(),
            "Bank updated"
        );
        let changes = event.changes.clone();
        // send fails only when nobody is subscribed
        self.tx.send(event).unwrap_or(0);
        changes
    }

    /// Subscribe to bank change events.
    pub fn subscribe(&self) -> broadcast::Receiver<BankEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(items: &[(&str, u32)]) -> BTreeMap<String, u32> {
        items.iter().map(|(c, q)| ((*c).to_owned(), *q)).collect()
    }

    #[test]
    fn replace_bumps_revision_only_on_change() {
        let bank = Bank::with_items(contents(&[("ash_wood", 3)]));
        assert_eq!(bank.revision(), 0);

        assert!(bank.replace(contents(&[("ash_wood", 3)])).is_empty());
        assert_eq!(bank.revision(), 0);

        let changes = bank.replace(contents(&[("ash_wood", 1)]));
        assert_eq!(changes.len(), 1);
        assert_eq!(bank.revision(), 1);
        assert_eq!(bank.quantity("ash_wood"), 1);
    }

    #[test]
    fn zero_quantities_are_dropped() {
        let bank = Bank::with_items(contents(&[("ash_wood", 0), ("feather", 2)]));
        let snapshot = bank.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        bank.replace(contents(&[("feather", 0)]));
        assert!(bank.snapshot().items.is_empty());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let bank = Bank::with_items(contents(&[("ash_wood", 3)]));
        let before = bank.snapshot();
        bank.replace(contents(&[("ash_wood", 9)]));
        assert_eq!(before.quantity("ash_wood"), 3);
        assert_eq!(bank.snapshot().quantity("ash_wood"), 9);
        assert_ne!(before.revision, bank.revision());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let bank = Bank::new();
        let mut rx = bank.subscribe();
        bank.replace(contents(&[("copper_ore", 7)]));
        let event = rx.recv().await;
        assert_eq!(event.map(|e| e.revision).ok(), Some(1));
    }
}
