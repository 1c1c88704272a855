//! Crafter role.
//!
//! Each goal works through three steps in order:
//!
//! 1. Its monsters task, while the task monster is beatable.
//! 2. Gear for the next level milestone of the roster, cheapest item per
//!    slot type first, counting what the bank and every character already
//!    own.
//! 3. Crafting training on the weakest of its gear crafting skills.
//!
//! Gatherable inputs it lacks are split across the harvesters on the want
//! queue before it starts making the item itself.

use std::collections::BTreeMap;

use artifacts_catalog::estimate_cost;
use artifacts_types::{CharacterSnapshot, Item, ItemQuantity, Skill, TaskType};
use tracing::{debug, info};

use crate::character::{Character, sleep_or_shutdown};
use crate::context::Context;
use crate::error::TaskError;
use crate::plan::plan_for_item;
use crate::roles::can_beat;
use crate::runtime::run;
use crate::tasks::{MakeItems, TaskLoop};

/// Crafting skills trained once there is nothing else to do.
const TRAINED_SKILLS: [Skill; 3] = [
    Skill::Weaponcrafting,
    Skill::Gearcrafting,
    Skill::Jewelrycrafting,
];

/// Combat levels above a milestone that still want its gear.
const MILESTONE_SPAN: u32 = 5;

/// Run one crafter goal.
pub async fn next_goal(ctx: &Context, character: &mut Character) -> Result<(), TaskError> {
    if task_is_winnable(ctx, character.snapshot()) {
        let mut tasks = TaskLoop::new().until_completed(1);
        run(ctx, character, &mut tasks).await?;
    }

    if let Some(want) = milestone_want(ctx, character.snapshot()) {
        info!(
            character = %character.name(),
            item = %want.code,
            quantity = want.quantity,
            "Crafting milestone gear"
        );
        return distribute_and_make(ctx, character, &want, false).await;
    }

    if let Some((skill, item)) = training_item(ctx, character.snapshot()) {
        return train(ctx, character, skill, item).await;
    }

    debug!(character = %character.name(), "Nothing to craft");
    sleep_or_shutdown(ctx, ctx.settings.role_backoff()).await;
    Ok(())
}

fn task_is_winnable(ctx: &Context, snapshot: &CharacterSnapshot) -> bool {
    let Some(task) = &snapshot.task else {
        return true;
    };
    if task.is_finished() {
        return true;
    }
    task.task_type == TaskType::Monsters && can_beat(ctx, snapshot, &task.code)
}

// ---------------------------------------------------------------------------
// Milestone gear
// ---------------------------------------------------------------------------

/// First milestone item some character still needs.
fn milestone_want(ctx: &Context, snapshot: &CharacterSnapshot) -> Option<ItemQuantity> {
    let settings = &ctx.settings;
    let step = usize::try_from(settings.milestone_step.max(1)).unwrap_or(1);
    let roster = ctx.roster.snapshots();

    for milestone in (settings.milestone_step.max(1)..=settings.training_max_level).step_by(step) {
        let upper = milestone.saturating_add(MILESTONE_SPAN);
        let characters = roster
            .iter()
            .filter(|c| (milestone..=upper).contains(&c.level(Skill::Combat)))
            .count();
        let characters = u32::try_from(characters).unwrap_or(u32::MAX);
        if characters == 0 {
            continue;
        }

        for item in cheapest_per_type(ctx, snapshot, milestone).into_values() {
            let per_character = u32::try_from(item.slots().len()).unwrap_or(1);
            let desired = characters.saturating_mul(per_character);
            let owned = ctx
                .bank
                .quantity(&item.code)
                .saturating_add(ctx.roster.owned_total(&item.code));
            let need = desired.saturating_sub(owned);
            if need > 0 {
                return Some(ItemQuantity::new(item.code.clone(), need));
            }
        }
    }
    None
}

/// Cheapest craftable gear of a level, one per item type.
fn cheapest_per_type<'a>(
    ctx: &'a Context,
    snapshot: &CharacterSnapshot,
    level: u32,
) -> BTreeMap<&'a str, &'a Item> {
    let mut cheapest: BTreeMap<&str, (u64, &Item)> = BTreeMap::new();
    let candidates = ctx
        .catalog
        .items()
        .filter(|i| i.level == level && i.is_equipment() && !i.is_tool())
        .filter_map(|i| i.recipe.as_ref().map(|r| (i, r)))
        .filter(|(_, r)| snapshot.level(r.skill) >= r.level);
    for (item, _) in candidates {
        let Ok(cost) = estimate_cost(&ctx.catalog, &item.code) else {
            continue;
        };
        let slot = cheapest.entry(item.item_type.as_str()).or_insert((cost, item));
        if cost < slot.0 {
            *slot = (cost, item);
        }
    }
    cheapest.into_iter().map(|(kind, (_, item))| (kind, item)).collect()
}

// ---------------------------------------------------------------------------
// Crafting training
// ---------------------------------------------------------------------------

/// Weakest trained skill below the cap and the cheapest item to train it on.
fn training_item(ctx: &Context, snapshot: &CharacterSnapshot) -> Option<(Skill, String)> {
    let settings = &ctx.settings;
    let mut skills: Vec<(Skill, u32)> = TRAINED_SKILLS
        .into_iter()
        .map(|s| (s, snapshot.level(s)))
        .filter(|(_, level)| *level < settings.training_max_level)
        .collect();
    skills.sort_by_key(|(_, level)| *level);

    skills.into_iter().find_map(|(skill, level)| {
        ctx.catalog
            .crafted_with(skill)
            .filter(|i| !i.is_tool())
            .filter(|i| {
                i.recipe.as_ref().is_some_and(|r| {
                    r.level <= level && level.saturating_sub(r.level) <= settings.training_level_window
                })
            })
            .filter_map(|i| estimate_cost(&ctx.catalog, &i.code).ok().map(|c| (c, i)))
            .min_by_key(|(cost, _)| *cost)
            .map(|(_, item)| (skill, item.code.clone()))
    })
}

async fn train(
    ctx: &Context,
    character: &mut Character,
    skill: Skill,
    item: String,
) -> Result<(), TaskError> {
    let before = (
        character.snapshot().level(skill),
        character.snapshot().xp(skill),
    );
    info!(
        character = %character.name(),
        skill = %skill,
        item = %item,
        level = before.0,
        "Training crafting"
    );
    let want = ItemQuantity::new(item, ctx.settings.craft_batch.max(1));
    distribute_and_make(ctx, character, &want, true).await?;
    let after = (
        character.snapshot().level(skill),
        character.snapshot().xp(skill),
    );
    if after == before {
        return Err(TaskError::NoExperience {
            skill,
            item: want.code,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Making
// ---------------------------------------------------------------------------

/// Queue missing gatherable inputs for the harvesters, then make the item.
///
/// Inputs already queued are not queued again, and whatever is still
/// queued once the item is made is retracted.
pub async fn distribute_and_make(
    ctx: &Context,
    character: &mut Character,
    want: &ItemQuantity,
    recycle: bool,
) -> Result<(), TaskError> {
    let bank = ctx.bank.snapshot();
    match plan_for_item(&ctx.catalog, &bank, &want.code, want.quantity) {
        Ok(plan) => debug!(character = %character.name(), item = %want.code, "Plan:\n{plan}"),
        Err(error) => debug!(character = %character.name(), item = %want.code, error = %error, "No plan"),
    }

    let mut pushed = Vec::new();
    if ctx.harvesters > 0 {
        for input in gatherable_shortfall(ctx, character.snapshot(), want)? {
            for share in split(input.quantity, ctx.harvesters) {
                ctx.wants.push(ItemQuantity::new(input.code.clone(), share));
            }
            debug!(
                character = %character.name(),
                item = %input.code,
                quantity = input.quantity,
                harvesters = ctx.harvesters,
                "Queued want"
            );
            pushed.push(input);
        }
    }

    let batch = want.quantity.min(ctx.settings.craft_batch.max(1));
    let make = MakeItems::new(want.code.as_str(), batch).until_made(want.quantity);
    let mut make = if recycle { make.recycled() } else { make };
    let result = run(ctx, character, &mut make).await;

    for input in pushed {
        let retracted = ctx.wants.retract(&input.code, input.quantity);
        if retracted > 0 {
            debug!(
                character = %character.name(),
                item = %input.code,
                quantity = retracted,
                "Retracted want"
            );
        }
    }
    result
}

/// Direct recipe inputs that a resource drops and that the inventory, the
/// bank and the wants already queued together do not cover.
fn gatherable_shortfall(
    ctx: &Context,
    snapshot: &CharacterSnapshot,
    want: &ItemQuantity,
) -> Result<Vec<ItemQuantity>, TaskError> {
    let item = ctx.catalog.require_item(&want.code)?;
    let Some(recipe) = &item.recipe else {
        return Ok(Vec::new());
    };
    let crafts = want.quantity.div_ceil(recipe.quantity.max(1));
    Ok(recipe
        .items
        .iter()
        .filter(|input| ctx.catalog.resources_dropping(&input.code).next().is_some())
        .filter_map(|input| {
            let required = input.quantity.saturating_mul(crafts);
            let held = snapshot
                .inventory_quantity(&input.code)
                .saturating_add(ctx.bank.quantity(&input.code))
                .saturating_add(ctx.wants.queued(&input.code));
            let missing = required.saturating_sub(held);
            (missing > 0).then(|| ItemQuantity::new(input.code.clone(), missing))
        })
        .collect())
}

/// Split `quantity` into at most `parts` shares that differ by at most one.
fn split(quantity: u32, parts: u32) -> Vec<u32> {
    let parts = parts.max(1).min(quantity.max(1));
    let base = quantity.checked_div(parts).unwrap_or(0);
    let extra = quantity.checked_rem(parts).unwrap_or(0);
    (0..parts)
        .map(|i| if i < extra { base.saturating_add(1) } else { base })
        .filter(|share| *share > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_spreads_the_remainder() {
        assert_eq!(split(10, 3), vec![4, 3, 3]);
        assert_eq!(split(2, 4), vec![1, 1]);
        assert_eq!(split(5, 1), vec![5]);
        assert!(split(0, 2).is_empty());
    }
}
