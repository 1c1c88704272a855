//! Latest known state of every character.
//!
//! Each character loop publishes its own snapshot after every action; other
//! loops only read. Collecting with `include_all` and the crafter's
//! milestone planning consult the roster instead of asking the server.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use artifacts_types::CharacterSnapshot;
use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the character update channel.
const UPDATE_CAPACITY: usize = 256;

/// A character's state as last published by its loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterUpdate {
    /// Latest snapshot.
    pub snapshot: CharacterSnapshot,
    /// Activity stack, outermost task first.
    pub activity: Vec<String>,
}

/// Shared map of character name to latest update.
#[derive(Debug)]
pub struct Roster {
    characters: RwLock<BTreeMap<String, CharacterUpdate>>,
    tx: broadcast::Sender<CharacterUpdate>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            characters: RwLock::new(BTreeMap::new()),
            tx,
        }
    }

    /// Record a character's state and notify subscribers.
    pub fn publish(&self, update: CharacterUpdate) {
        {
            let mut characters = self
                .characters
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            characters.insert(update.snapshot.name.clone(), update.clone());
        }
        // send fails only when nobody is subscribed
        self.tx.send(update).unwrap_or(0);
    }

    /// Latest update for one character.
    pub fn get(&self, name: &str) -> Option<CharacterUpdate> {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Latest snapshot of every character, in name order.
    pub fn snapshots(&self) -> Vec<CharacterSnapshot> {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|u| u.snapshot.clone())
            .collect()
    }

    /// Units of an item held across all inventories and worn slots.
    pub fn owned_total(&self, code: &str) -> u32 {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .fold(0_u32, |acc, u| {
                acc.saturating_add(u.snapshot.inventory_quantity(code))
                    .saturating_add(u.snapshot.equipped_count(code))
            })
    }

    /// Subscribe to character updates.
    pub fn subscribe(&self) -> broadcast::Receiver<CharacterUpdate> {
        self.tx.subscribe()
    }
}
