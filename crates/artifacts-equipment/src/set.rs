//! The optimizer's result.

use std::collections::BTreeMap;

use artifacts_types::Slot;
use serde::{Deserialize, Serialize};

/// Turn count used when one side cannot damage the other.
pub const UNBOUNDED: u32 = u32::MAX;

/// Chosen gear for the resolved slots, with the fight estimate it gives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSet {
    /// Item per resolved slot. `None` means the slot should be empty.
    /// Slots the optimizer had no candidates for are absent.
    pub items: BTreeMap<Slot, Option<String>>,
    /// Turns the character needs to defeat the target.
    pub turns_to_kill_monster: u32,
    /// Turns the target needs to defeat the character.
    pub turns_to_kill_player: u32,
    /// Total haste of the worn set.
    pub haste: i32,
}

/// A slot whose worn item differs from the chosen one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    /// The slot.
    pub slot: Slot,
    /// Currently worn item.
    pub current: Option<String>,
    /// Item the set wants.
    pub wanted: Option<String>,
}

impl EquipmentSet {
    /// Whether the character is expected to win: it can damage the target
    /// and finishes it no later than the target finishes the character.
    pub const fn can_win(&self) -> bool {
        self.turns_to_kill_monster != UNBOUNDED
            && self.turns_to_kill_monster <= self.turns_to_kill_player
    }

    /// Item chosen for a slot, if the slot was resolved to an item.
    pub fn item(&self, slot: Slot) -> Option<&str> {
        self.items.get(&slot).and_then(|i| i.as_deref())
    }

    /// Slots where `worn` differs from the set, in slot order.
    pub fn changes_from(&self, worn: &BTreeMap<Slot, String>) -> Vec<SlotChange> {
        Slot::ORDER
            .into_iter()
            .filter_map(|slot| {
                let wanted = self.items.get(&slot)?;
                let current = worn.get(&slot);
                if current == wanted.as_ref() {
                    return None;
                }
                Some(SlotChange {
                    slot,
                    current: current.cloned(),
                    wanted: wanted.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_kill_time_cannot_win() {
        let set = EquipmentSet {
            turns_to_kill_monster: UNBOUNDED,
            turns_to_kill_player: UNBOUNDED,
            ..EquipmentSet::default()
        };
        assert!(!set.can_win());
    }

    #[test]
    fn equal_turns_is_a_win() {
        let set = EquipmentSet {
            turns_to_kill_monster: 4,
            turns_to_kill_player: 4,
            ..EquipmentSet::default()
        };
        assert!(set.can_win());
    }

    #[test]
    fn changes_skip_matching_and_unresolved_slots() {
        let mut set = EquipmentSet::default();
        set.items.insert(Slot::Weapon, Some("iron_sword".to_owned()));
        set.items.insert(Slot::Helmet, Some("leather_hat".to_owned()));
        set.items.insert(Slot::Ring2, None);

        let mut worn = BTreeMap::new();
        worn.insert(Slot::Weapon, "iron_sword".to_owned());
        worn.insert(Slot::Ring2, "copper_ring".to_owned());
        worn.insert(Slot::Boots, "leather_boots".to_owned());

        let changes = set.changes_from(&worn);
        let slots: Vec<Slot> = changes.iter().map(|c| c.slot).collect();
        assert_eq!(slots, vec![Slot::Helmet, Slot::Ring2]);
        assert_eq!(changes.get(1).and_then(|c| c.wanted.clone()), None);
    }
}
