//! Action requests and results exchanged with the game server.
//!
//! Every character interaction is one [`Action`]. The server answers with
//! an [`ActionResponse`] carrying the full updated character, the bank
//! contents when the action touched the bank, and action-specific details.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::character::CharacterSnapshot;
use crate::enums::{FightOutcome, Slot, TaskType};
use crate::structs::{ItemQuantity, Position};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A single character action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Walk to a tile.
    Move {
        /// Destination.
        position: Position,
    },
    /// Harvest the resource on the current tile.
    Gather,
    /// Craft an item at the current workshop.
    Craft(ItemQuantity),
    /// Fight the monster on the current tile.
    Fight,
    /// Wear an item from the inventory.
    Equip {
        /// Target slot.
        slot: Slot,
        /// Item code.
        code: String,
    },
    /// Remove a worn item into the inventory.
    Unequip {
        /// Slot to clear.
        slot: Slot,
    },
    /// Put items into the bank.
    Deposit(ItemQuantity),
    /// Take items out of the bank.
    Withdraw(ItemQuantity),
    /// Take a new task from the tasks master.
    AcceptTask,
    /// Turn in a finished task.
    CompleteTask,
    /// Trade task coins for a reward.
    ExchangeTask,
    /// Abandon the current task.
    CancelTask,
    /// Break an item back into materials.
    Recycle(ItemQuantity),
}

impl Action {
    /// Endpoint-style name of the action, used in logs and URLs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Gather => "gathering",
            Self::Craft(_) => "crafting",
            Self::Fight => "fight",
            Self::Equip { .. } => "equip",
            Self::Unequip { .. } => "unequip",
            Self::Deposit(_) => "bank/deposit",
            Self::Withdraw(_) => "bank/withdraw",
            Self::AcceptTask => "task/new",
            Self::CompleteTask => "task/complete",
            Self::ExchangeTask => "task/exchange",
            Self::CancelTask => "task/cancel",
            Self::Recycle(_) => "recycling",
        }
    }

    /// Whether the server reports bank contents in the response.
    pub const fn touches_bank(&self) -> bool {
        matches!(self, Self::Deposit(_) | Self::Withdraw(_))
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of a gather, craft or recycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillResult {
    /// Skill experience gained.
    pub xp: u64,
    /// Items received.
    pub items: Vec<ItemQuantity>,
}

/// Outcome of a fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightResult {
    /// Win or loss.
    pub outcome: FightOutcome,
    /// Turns the fight lasted.
    pub turns: u32,
    /// Combat experience gained.
    pub xp: u64,
    /// Gold looted.
    pub gold: u64,
    /// Items looted.
    pub drops: Vec<ItemQuantity>,
}

/// A newly accepted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    /// Target code.
    pub code: String,
    /// Task kind.
    pub task_type: TaskType,
    /// Units required.
    pub total: u32,
}

/// Reward for completing or exchanging a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReward {
    /// Items received.
    pub items: Vec<ItemQuantity>,
    /// Gold received.
    pub gold: u64,
}

/// Action-specific response payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ActionDetails {
    /// No extra payload.
    #[default]
    None,
    /// Gather, craft or recycle outcome.
    Skill(SkillResult),
    /// Fight outcome.
    Fight(FightResult),
    /// Accepted task.
    Task(TaskAssignment),
    /// Task reward.
    Reward(TaskReward),
}

/// Server response to any action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Character state after the action.
    pub character: CharacterSnapshot,
    /// Full bank contents, for bank actions.
    #[serde(default)]
    pub bank: Option<BTreeMap<String, u32>>,
    /// Action-specific payload.
    #[serde(default)]
    pub details: ActionDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_actions_are_flagged() {
        assert!(Action::Deposit(ItemQuantity::new("ash_wood", 1)).touches_bank());
        assert!(Action::Withdraw(ItemQuantity::new("ash_wood", 1)).touches_bank());
        assert!(!Action::Fight.touches_bank());
    }

    #[test]
    fn action_names_match_endpoints() {
        assert_eq!(Action::Move { position: Position::new(1, 2) }.name(), "move");
        assert_eq!(Action::CompleteTask.name(), "task/complete");
        assert_eq!(
            Action::Unequip { slot: Slot::Shield }.name(),
            "unequip"
        );
    }
}
