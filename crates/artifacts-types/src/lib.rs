//! Shared type definitions for the Artifacts automation engine.
//!
//! This crate is the single source of truth for the game's data model:
//! catalog records, character state, combat stat profiles and the action
//! request/response shapes exchanged with the server.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers used to tag task runs and requests
//! - [`enums`] -- Skills, elements, equipment slots, map content kinds
//! - [`stats`] -- Stat profiles and the damage formula
//! - [`structs`] -- Catalog records (items, recipes, monsters, resources, tiles)
//! - [`character`] -- Character snapshot as reported by the server
//! - [`actions`] -- Action requests and their responses

pub mod actions;
pub mod character;
pub mod enums;
pub mod ids;
pub mod stats;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{
    Action, ActionDetails, ActionResponse, FightResult, SkillResult, TaskAssignment, TaskReward,
};
pub use character::{CharacterSnapshot, SkillProgress, TaskProgress};
pub use enums::{
    ContentKind, Element, FightOutcome, GatheringSkill, ParseEnumError, Skill, Slot, TaskType,
};
pub use ids::{RequestId, RunId};
pub use stats::{
    ElementValues, GatheringValues, RESOURCE_TARGET_HP, RESOURCE_TARGET_RESISTANCE, StatsProfile,
};
pub use structs::{Drop, Item, ItemQuantity, MapContent, MapTile, Monster, Position, Recipe, Resource};
