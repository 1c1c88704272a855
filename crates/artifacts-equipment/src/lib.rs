//! Equipment optimizer for the Artifacts automation engine.
//!
//! Given what a character owns (bank, inventory, worn items) and a target
//! stat profile (a monster, or the synthetic profile of a resource), pick
//! the gear that kills the target fastest while surviving longest.
//!
//! The search is greedy per slot with a depth-first lookahead: see
//! [`optimizer`] for the exact rules.
//!
//! # Modules
//!
//! - [`candidates`] -- Owned gear and per-slot candidate pools.
//! - [`optimizer`] -- [`best_owned_equipment`] itself.
//! - [`set`] -- The [`EquipmentSet`] result and slot diffs.

pub mod candidates;
pub mod optimizer;
pub mod set;

// Re-export primary types at crate root.
pub use candidates::{Candidate, LEVEL_WINDOW, OwnedGear};
pub use optimizer::{BASE_PLAYER_HP, HP_PER_LEVEL, best_owned_equipment};
pub use set::{EquipmentSet, SlotChange, UNBOUNDED};
