//! Errors raised by tasks and the runtime.

use artifacts_catalog::CatalogError;
use artifacts_client::ApiError;
use artifacts_types::{ContentKind, Skill};

/// Errors that end a task run.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Shutdown was requested before the next iteration.
    #[error("cancelled")]
    Cancelled,

    /// The game server rejected an action or could not be reached.
    #[error("api error: {source}")]
    Api {
        /// The underlying backend error.
        #[from]
        source: ApiError,
    },

    /// A catalog lookup failed.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: CatalogError,
    },

    /// No tile on the map hosts the requested content.
    #[error("no {kind} tile for {code}")]
    NoLocation {
        /// Content kind searched for.
        kind: ContentKind,
        /// Content code searched for.
        code: String,
    },

    /// The optimizer's best set loses to the monster, or the loss limit
    /// was reached.
    #[error("cannot win fight against {monster}")]
    Unwinnable {
        /// Monster code.
        monster: String,
    },

    /// The item has no resource, monster, recipe or task source.
    #[error("no way to obtain {item}")]
    NoSource {
        /// Item code.
        item: String,
    },

    /// Harvesting ran without gathering anything.
    #[error("cannot harvest {resource}")]
    CannotHarvest {
        /// Resource code.
        resource: String,
    },

    /// A skill is below the level the goal needs.
    #[error("{skill} level {level} is below {required}")]
    SkillTooLow {
        /// The skill.
        skill: Skill,
        /// Current level.
        level: u32,
        /// Level needed.
        required: u32,
    },

    /// One craft of the item needs more units than the inventory holds.
    #[error("inventory too small to craft {item}")]
    InventoryTooSmall {
        /// Item code.
        item: String,
    },

    /// The current task cannot be completed and no coin is left to cancel it.
    #[error("task {task} cannot be completed and cannot be cancelled")]
    TaskStuck {
        /// Task target code.
        task: String,
    },

    /// A craft run ended without making anything.
    #[error("nothing crafted for {item}")]
    NothingCrafted {
        /// Item code.
        item: String,
    },

    /// The server answered an action with an unexpected payload.
    #[error("unexpected response to {action}")]
    UnexpectedResponse {
        /// Action name.
        action: &'static str,
    },

    /// Crafting produced no experience.
    #[error("no {skill} experience from crafting {item}")]
    NoExperience {
        /// Crafting skill.
        skill: Skill,
        /// Item code.
        item: String,
    },

    /// Collecting an item failed.
    #[error("cannot collect {item}: {source}")]
    Collect {
        /// Item code.
        item: String,
        /// Why collecting failed.
        source: Box<TaskError>,
    },
}

impl TaskError {
    /// Wrap an error raised while collecting `item`.
    pub fn collect(item: impl Into<String>, source: Self) -> Self {
        Self::Collect {
            item: item.into(),
            source: Box::new(source),
        }
    }

    /// The backend error, if this is one.
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source } => Some(source),
            _ => None,
        }
    }

    /// A withdraw lost a race with another character.
    pub fn is_bank_race(&self) -> bool {
        self.api().is_some_and(ApiError::is_bank_race)
    }

    /// The requested content is not on the character's tile.
    pub fn is_not_found_on_map(&self) -> bool {
        self.api().is_some_and(ApiError::is_not_found_on_map)
    }

    /// Whether the run ended because shutdown was requested, at any depth.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Collect { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether the error means a fight cannot be won, at any depth.
    pub fn is_unwinnable(&self) -> bool {
        match self {
            Self::Unwinnable { .. } => true,
            Self::Collect { source, .. } => source.is_unwinnable(),
            _ => false,
        }
    }
}
