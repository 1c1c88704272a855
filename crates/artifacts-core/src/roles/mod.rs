//! Role schedulers.
//!
//! A role is a per-character loop that keeps choosing the next goal and
//! running it through the task combinators. The configuration assigns
//! one role to each character:
//!
//! - [`harvester`] -- Serves crafter wants, otherwise trains gathering.
//! - [`crafter`] -- Monster tasks, milestone gear, crafting training.
//! - [`fighter`] -- Monster tasks, otherwise the strongest beatable monster.
//!
//! A failed goal is logged and the role backs off before choosing again.
//! Only a stop request ends the loop.

pub mod crafter;
pub mod fighter;
pub mod harvester;

use std::fmt;

use artifacts_equipment::{OwnedGear, best_owned_equipment};
use artifacts_types::CharacterSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::character::{Character, sleep_or_shutdown};
use crate::context::Context;

/// What a character does all day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Gathers materials.
    Harvester,
    /// Crafts gear and trains crafting skills.
    Crafter,
    /// Fights monsters and does monster tasks.
    Fighter,
}

impl RoleKind {
    /// Configuration name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harvester => "harvester",
            Self::Crafter => "crafter",
            Self::Fighter => "fighter",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run a role until shutdown is requested.
pub async fn run_role(ctx: &Context, character: &mut Character, role: RoleKind) {
    info!(character = %character.name(), role = %role, "Role started");
    let mut goals: u64 = 0;

    while !ctx.shutdown.is_requested() {
        let outcome = match role {
            RoleKind::Harvester => Box::pin(harvester::next_goal(ctx, character)).await,
            RoleKind::Crafter => Box::pin(crafter::next_goal(ctx, character)).await,
            RoleKind::Fighter => Box::pin(fighter::next_goal(ctx, character)).await,
        };
        goals = goals.saturating_add(1);
        match outcome {
            Ok(()) => {}
            Err(error) if error.is_cancelled() => break,
            Err(error) => {
                warn!(
                    character = %character.name(),
                    role = %role,
                    error = %error,
                    "Goal failed, backing off"
                );
                sleep_or_shutdown(ctx, ctx.settings.role_backoff()).await;
            }
        }
    }

    info!(character = %character.name(), role = %role, goals, "Role stopped");
}

/// Whether the best gear available to a character beats a monster.
pub(crate) fn can_beat(ctx: &Context, snapshot: &CharacterSnapshot, monster: &str) -> bool {
    let Some(monster) = ctx.catalog.monster(monster) else {
        return false;
    };
    let bank = ctx.bank.snapshot();
    let owned = OwnedGear::new(snapshot, &bank.items);
    best_owned_equipment(&ctx.catalog, &owned, &monster.stats).can_win()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_match_config() {
        for role in [RoleKind::Harvester, RoleKind::Crafter, RoleKind::Fighter] {
            let parsed: Result<RoleKind, _> = serde_yml::from_str(role.as_str());
            assert_eq!(parsed.ok(), Some(role));
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
