//! Task runtime, combinators, and role schedulers for the Artifacts
//! automation engine.
//!
//! Every character is driven by its own loop. A loop picks a goal for the
//! character's role and runs it as a [`Task`](runtime::Task): a small
//! state machine stepped by [`run`](runtime::run) that issues actions
//! through the character's [`Character`] handle. The handle waits out
//! cooldowns, retries transient failures, and keeps the shared bank and
//! roster up to date.
//!
//! # Modules
//!
//! - [`config`] -- Engine configuration loaded from `artifacts.yaml`.
//! - [`error`] -- [`TaskError`] and its classifications.
//! - [`context`] -- Shared handles passed to every task.
//! - [`character`] -- Per-character action handle.
//! - [`runtime`] -- The [`Task`](runtime::Task) trait and its driver.
//! - [`tasks`] -- Harvest, craft, fight, task and collect combinators.
//! - [`plan`] -- Acquisition plan trees.
//! - [`roles`] -- Harvester, crafter and fighter schedulers.
//! - [`roster`] -- Latest state of every character.
//! - [`queue`] -- Crafter wants shared with harvesters.
//! - [`shutdown`] -- Cooperative stop signal.

pub mod character;
pub mod config;
pub mod context;
pub mod error;
pub mod plan;
pub mod queue;
pub mod roles;
pub mod roster;
pub mod runtime;
pub mod shutdown;
pub mod tasks;

// Re-export primary types at crate root.
pub use character::{Character, sleep_or_shutdown};
pub use config::{
    BackendConfig, BackendKind, CatalogConfig, CharacterConfig, ConfigError, EngineConfig,
    LoggingConfig, TaskSettings,
};
pub use context::Context;
pub use error::TaskError;
pub use plan::{Destination, PlanNode, execute, plan_for_item};
pub use queue::WorkQueue;
pub use roles::{RoleKind, run_role};
pub use roster::{CharacterUpdate, Roster};
pub use runtime::{StopFn, Task, Transition, run};
pub use shutdown::Shutdown;
