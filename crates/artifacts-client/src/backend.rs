//! Action backend abstraction.
//!
//! Enum dispatch over the live HTTP client and the in-memory simulated
//! server, since async methods are not dyn-compatible.

use std::collections::BTreeMap;

use artifacts_types::{Action, ActionResponse, CharacterSnapshot};

use crate::error::ApiError;
use crate::http::HttpBackend;
use crate::simulated::SimulatedServer;

/// Where character actions are sent.
pub enum ActionBackend {
    /// The live game API.
    Http(HttpBackend),
    /// The in-memory world.
    Simulated(SimulatedServer),
}

impl ActionBackend {
    /// Perform one action for `character`.
    pub async fn execute(
        &self,
        character: &str,
        action: &Action,
    ) -> Result<ActionResponse, ApiError> {
        match self {
            Self::Http(backend) => backend.execute(character, action).await,
            Self::Simulated(server) => server.execute(character, action),
        }
    }

    /// Current state of one character.
    pub async fn character(&self, name: &str) -> Result<CharacterSnapshot, ApiError> {
        match self {
            Self::Http(backend) => backend.character(name).await,
            Self::Simulated(server) => server.character(name),
        }
    }

    /// Every character on the account.
    pub async fn characters(&self) -> Result<Vec<CharacterSnapshot>, ApiError> {
        match self {
            Self::Http(backend) => backend.characters().await,
            Self::Simulated(server) => Ok(server.characters()),
        }
    }

    /// Full bank contents.
    pub async fn bank_items(&self) -> Result<BTreeMap<String, u32>, ApiError> {
        match self {
            Self::Http(backend) => backend.bank_items().await,
            Self::Simulated(server) => Ok(server.bank_items()),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Http(_) => "http",
            Self::Simulated(_) => "simulated",
        }
    }
}
