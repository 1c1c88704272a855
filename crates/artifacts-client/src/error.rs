//! Error types for the game API client.
//!
//! The server answers failed actions with `{"error": {"code", "message"}}`.
//! The numeric code carries the meaning; the helpers on [`ApiError`] group
//! the codes the engine reacts to.

/// Game API error codes the engine distinguishes.
pub mod codes {
    /// Item, character or map not found. On withdraw: the item is gone.
    pub const NOT_FOUND: u16 = 404;
    /// Missing item or insufficient quantity.
    pub const MISSING_ITEM: u16 = 478;
    /// Character is locked, an action is already in progress.
    pub const LOCKED: u16 = 486;
    /// The character has no task.
    pub const NO_TASK: u16 = 487;
    /// The task is not finished.
    pub const TASK_NOT_COMPLETED: u16 = 488;
    /// The character already holds a task.
    pub const TASK_ALREADY_ASSIGNED: u16 = 489;
    /// The character is already at the destination.
    pub const ALREADY_AT_DESTINATION: u16 = 490;
    /// Equipment slot is occupied (equip) or empty (unequip).
    pub const SLOT_CONFLICT: u16 = 491;
    /// Skill level too low for the resource or recipe.
    pub const LEVEL_TOO_LOW: u16 = 493;
    /// Item conditions not met (wrong slot, level too low to wear).
    pub const CONDITIONS_NOT_MET: u16 = 496;
    /// The inventory is full.
    pub const INVENTORY_FULL: u16 = 497;
    /// The character is in cooldown.
    pub const COOLDOWN: u16 = 499;
    /// The requested content is not on the character's tile.
    pub const NOT_FOUND_ON_MAP: u16 = 598;
}

/// Errors returned by the action backends.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the request.
    #[error("[{code}] {message}")]
    Status {
        /// Game or HTTP status code.
        code: u16,
        /// Server message.
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected schema.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}

impl ApiError {
    /// Build a status error.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Status code, if the server answered.
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Locked or in cooldown: wait and send the same action again.
    pub const fn is_transient(&self) -> bool {
        matches!(self.code(), Some(codes::LOCKED | codes::COOLDOWN))
    }

    /// A withdraw lost a race with another character.
    pub const fn is_bank_race(&self) -> bool {
        matches!(self.code(), Some(codes::NOT_FOUND | codes::MISSING_ITEM))
    }

    /// The resource or monster is not on the current tile.
    pub const fn is_not_found_on_map(&self) -> bool {
        matches!(self.code(), Some(codes::NOT_FOUND_ON_MAP))
    }

    /// The inventory cannot take more items.
    pub const fn is_inventory_full(&self) -> bool {
        matches!(self.code(), Some(codes::INVENTORY_FULL))
    }

    /// Worth retrying at the transport level: network failures and
    /// gateway-style server errors.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { code, .. } => matches!(*code, 500..=504),
            _ => false,
        }
    }
}
