//! Harvester role.
//!
//! Serves the oldest want it can gather, then banks the result. With no
//! want to serve it trains its lowest gathering skill in steps, on the
//! best resource it can gather, and breaks off as soon as a want shows up.

use std::sync::Arc;

use artifacts_catalog::Catalog;
use artifacts_types::{CharacterSnapshot, ContentKind, ItemQuantity, Resource, Skill};
use tracing::{debug, info};

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::plan::{Destination, PlanNode, execute};
use crate::runtime::run;
use crate::tasks::{Harvest, move_to_bank_and_deposit_all};

/// Run one harvester goal.
pub async fn next_goal(ctx: &Context, character: &mut Character) -> Result<(), TaskError> {
    let want = ctx
        .wants
        .take_matching(|want| best_resource_for(&ctx.catalog, character.snapshot(), &want.code).is_some());
    if let Some(want) = want {
        return serve(ctx, character, want).await;
    }

    match training_target(ctx, character.snapshot()) {
        Some((skill, resource, level)) => train(ctx, character, skill, resource, level).await,
        None => {
            debug!(character = %character.name(), "Nothing to gather, waiting for wants");
            tokio::select! {
                () = ctx.wants.pushed() => {}
                () = ctx.shutdown.wait() => {}
                () = tokio::time::sleep(ctx.settings.role_backoff()) => {}
            }
            Ok(())
        }
    }
}

/// The resource dropping `code` at the best rate the character can gather.
fn best_resource_for<'a>(
    catalog: &'a Catalog,
    snapshot: &CharacterSnapshot,
    code: &str,
) -> Option<&'a Resource> {
    catalog
        .resources_dropping(code)
        .filter(|r| snapshot.level(r.skill.skill()) >= r.level)
        .filter(|r| !catalog.locations(ContentKind::Resource, &r.code).is_empty())
        .max_by(|a, b| {
            let rate = |r: &Resource| r.drop_of(code).map_or(0.0, artifacts_types::Drop::average_per_action);
            rate(a).total_cmp(&rate(b))
        })
}

async fn serve(ctx: &Context, character: &mut Character, want: ItemQuantity) -> Result<(), TaskError> {
    let Some(resource) = best_resource_for(&ctx.catalog, character.snapshot(), &want.code) else {
        return Ok(());
    };
    let per_action = resource
        .drop_of(&want.code)
        .map_or(0.0, artifacts_types::Drop::average_per_action);
    let plan = PlanNode::Sequence(vec![
        PlanNode::Move(Destination::Resource(resource.code.clone())),
        PlanNode::Gather {
            resource: resource.code.clone(),
            item: want.clone(),
            per_action,
        },
    ]);
    info!(
        character = %character.name(),
        item = %want.code,
        quantity = want.quantity,
        resource = %resource.code,
        "Serving want"
    );
    execute(ctx, character, &plan).await?;
    move_to_bank_and_deposit_all(ctx, character).await
}

/// Lowest gathering skill still below the training cap, with the highest
/// resource in reach and the level to train it to.
fn training_target(ctx: &Context, snapshot: &CharacterSnapshot) -> Option<(Skill, String, u32)> {
    let settings = &ctx.settings;
    let (skill, level) = Skill::ALL
        .into_iter()
        .filter(|s| s.gathering().is_some())
        .map(|s| (s, snapshot.level(s)))
        .filter(|(_, level)| *level < settings.training_max_level)
        .min_by_key(|(_, level)| *level)?;

    let resource = ctx
        .catalog
        .resources()
        .filter(|r| r.skill.skill() == skill)
        .filter(|r| r.level <= level && level.saturating_sub(r.level) <= settings.training_level_window)
        .filter(|r| !ctx.catalog.locations(ContentKind::Resource, &r.code).is_empty())
        .max_by_key(|r| r.level)?;

    let step = settings.training_step.max(1);
    let target = level
        .checked_div(step)
        .and_then(|steps| steps.checked_add(1))
        .and_then(|steps| steps.checked_mul(step))?
        .min(settings.training_max_level);
    Some((skill, resource.code.clone(), target))
}

async fn train(
    ctx: &Context,
    character: &mut Character,
    skill: Skill,
    resource: String,
    target: u32,
) -> Result<(), TaskError> {
    info!(
        character = %character.name(),
        skill = %skill,
        resource = %resource,
        level = character.snapshot().level(skill),
        target,
        "Training gathering"
    );
    let wants = Arc::clone(&ctx.wants);
    let catalog = Arc::clone(&ctx.catalog);
    let mut harvest = Harvest::new(resource.as_str()).until(Box::new(move |snapshot, _| {
        snapshot.level(skill) >= target
            || wants.contains_matching(|w| best_resource_for(&catalog, snapshot, &w.code).is_some())
    }));
    run(ctx, character, &mut harvest).await?;
    let interrupted = ctx
        .wants
        .contains_matching(|w| best_resource_for(&ctx.catalog, character.snapshot(), &w.code).is_some());
    if harvest.progress().gathered == 0 && !interrupted {
        return Err(TaskError::CannotHarvest { resource });
    }
    move_to_bank_and_deposit_all(ctx, character).await
}
