//! Remote action backends for the Artifacts automation engine.
//!
//! Characters act through an [`ActionBackend`]: either the live game API
//! over HTTP or an in-memory [`SimulatedServer`] that applies the same
//! rules to a catalog. Both report failures as [`ApiError`] with the game's
//! numeric error codes.
//!
//! # Modules
//!
//! - [`backend`] -- Enum dispatch over the two backends
//! - [`config`] -- Connection settings from environment variables
//! - [`error`] -- Error type and game error codes
//! - [`http`] -- `reqwest` client for the game API
//! - [`schema`] -- Wire shapes and conversion into domain types
//! - [`simulated`] -- In-memory game server

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod schema;
pub mod simulated;

// Re-export primary types at crate root.
pub use backend::ActionBackend;
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{ApiError, codes};
pub use http::HttpBackend;
pub use simulated::{
    ActionRecord, CANCEL_COST, EXCHANGE_COST, FightPolicy, SimulatedConfig, SimulatedServer,
    TASK_COMPLETION_COINS, TASKS_COIN,
};
