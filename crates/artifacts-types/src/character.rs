//! Character state as reported by the game server.
//!
//! A [`CharacterSnapshot`] is replaced wholesale every time an action
//! response comes back. Nothing in the engine edits it field by field.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Skill, Slot, TaskType};
use crate::structs::Position;

/// Level and experience in one skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    /// Current level.
    pub level: u32,
    /// Experience into the current level.
    pub xp: u64,
    /// Experience needed for the next level.
    pub max_xp: u64,
}

/// The task a character currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Target monster or item code.
    pub code: String,
    /// Task kind.
    pub task_type: TaskType,
    /// Units done so far.
    pub progress: u32,
    /// Units required.
    pub total: u32,
}

impl TaskProgress {
    /// Whether the task is ready to be turned in.
    pub const fn is_finished(&self) -> bool {
        self.total > 0 && self.progress >= self.total
    }
}

/// Full character state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    /// Character name, unique per account.
    pub name: String,
    /// Current map position.
    pub position: Position,
    /// Current hit points.
    pub hp: u32,
    /// Gold carried.
    pub gold: u64,
    /// Progress per skill.
    pub skills: BTreeMap<Skill, SkillProgress>,
    /// Inventory contents by item code.
    pub inventory: BTreeMap<String, u32>,
    /// Total units the inventory can hold.
    pub inventory_max_items: u32,
    /// Worn items by slot.
    pub equipment: BTreeMap<Slot, String>,
    /// Duration of the last cooldown, in seconds.
    pub cooldown_seconds: u32,
    /// When the current cooldown ends.
    pub cooldown_expires: DateTime<Utc>,
    /// Current task, if one is assigned.
    pub task: Option<TaskProgress>,
}

impl CharacterSnapshot {
    /// A fresh level-1 character at the origin, used by tests and the
    /// simulated server.
    pub fn new(name: impl Into<String>) -> Self {
        let skills = Skill::ALL
            .into_iter()
            .map(|s| {
                (
                    s,
                    SkillProgress {
                        level: 1,
                        xp: 0,
                        max_xp: 150,
                    },
                )
            })
            .collect();
        Self {
            name: name.into(),
            position: Position::default(),
            hp: 125,
            gold: 0,
            skills,
            inventory: BTreeMap::new(),
            inventory_max_items: 100,
            equipment: BTreeMap::new(),
            cooldown_seconds: 0,
            cooldown_expires: DateTime::<Utc>::UNIX_EPOCH,
            task: None,
        }
    }

    /// Level in a skill (0 when unknown).
    pub fn level(&self, skill: Skill) -> u32 {
        self.skills.get(&skill).map_or(0, |p| p.level)
    }

    /// Experience into the current level of a skill.
    pub fn xp(&self, skill: Skill) -> u64 {
        self.skills.get(&skill).map_or(0, |p| p.xp)
    }

    /// Units of an item in the inventory.
    pub fn inventory_quantity(&self, code: &str) -> u32 {
        self.inventory.get(code).copied().unwrap_or(0)
    }

    /// Total units across the inventory.
    pub fn inventory_count(&self) -> u32 {
        self.inventory
            .values()
            .fold(0_u32, |acc, q| acc.saturating_add(*q))
    }

    /// Free inventory space.
    pub fn inventory_free(&self) -> u32 {
        self.inventory_max_items
            .saturating_sub(self.inventory_count())
    }

    /// Whether no more units fit in the inventory.
    pub fn is_inventory_full(&self) -> bool {
        self.inventory_count() >= self.inventory_max_items
    }

    /// Number of slots currently wearing the item.
    pub fn equipped_count(&self, code: &str) -> u32 {
        let worn = self.equipment.values().filter(|c| c.as_str() == code).count();
        u32::try_from(worn).unwrap_or(u32::MAX)
    }

    /// Item worn in a slot.
    pub fn worn(&self, slot: Slot) -> Option<&str> {
        self.equipment.get(&slot).map(String::as_str)
    }
}
