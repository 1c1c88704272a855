//! Fighter role.

use artifacts_types::{CharacterSnapshot, ContentKind, Skill};
use tracing::info;

use crate::character::{Character, sleep_or_shutdown};
use crate::context::Context;
use crate::error::TaskError;
use crate::roles::can_beat;
use crate::runtime::run;
use crate::tasks::{Fight, TaskLoop};

/// Run one fighter goal: finish a monster task, or when the task cannot be
/// won, a batch of fights against the strongest monster it can beat.
pub async fn next_goal(ctx: &Context, character: &mut Character) -> Result<(), TaskError> {
    let mut tasks = TaskLoop::new().until_completed(1);
    run(ctx, character, &mut tasks).await?;
    if !tasks.progress().unwinnable {
        return Ok(());
    }

    let Some(monster) = strongest_beatable(ctx, character.snapshot()) else {
        info!(character = %character.name(), "No monster to fight, waiting");
        sleep_or_shutdown(ctx, ctx.settings.role_backoff()).await;
        return Ok(());
    };
    info!(
        character = %character.name(),
        monster = %monster,
        fights = ctx.settings.fighter_batch,
        "Task unwinnable, fighting for experience"
    );
    let mut fight = Fight::new(monster)
        .max_fights(ctx.settings.fighter_batch)
        .loss_limit(ctx.settings.consecutive_loss_limit);
    run(ctx, character, &mut fight).await
}

/// Highest-level monster on the map the best owned gear beats.
fn strongest_beatable(ctx: &Context, snapshot: &CharacterSnapshot) -> Option<String> {
    let level = snapshot.level(Skill::Combat);
    let mut monsters: Vec<_> = ctx
        .catalog
        .monsters()
        .filter(|m| m.level <= level)
        .filter(|m| !ctx.catalog.locations(ContentKind::Monster, &m.code).is_empty())
        .collect();
    monsters.sort_by(|a, b| b.level.cmp(&a.level));
    monsters
        .into_iter()
        .find(|m| can_beat(ctx, snapshot, &m.code))
        .map(|m| m.code.clone())
}
