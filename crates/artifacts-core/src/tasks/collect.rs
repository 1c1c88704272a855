//! Collect a quantity of an item by whatever means the item allows.
//!
//! The item's sources are tried in a fixed order: a resource that drops
//! it, a monster that drops it, its recipe, then task coins for task
//! rewards. Crafting collects each input first, recursively, counting
//! banked inputs as held. After each attempt the loop re-counts what is
//! held and goes again until the quantity is reached.

use artifacts_types::ItemQuantity;
use futures::future::BoxFuture;
use tracing::debug;

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{StopFn, Task, Transition, run, should_stop};
use crate::tasks::craft::Craft;
use crate::tasks::fight::Fight;
use crate::tasks::harvest::Harvest;
use crate::tasks::task_item::TaskItem;

/// What a collect run has obtained so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectProgress {
    /// Units of the item obtained by this run.
    pub collected: u32,
}

/// Collect states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectState {
    /// Count what is held and pick a source for the rest.
    Assess,
    /// Gather from a resource.
    Harvest {
        /// Resource code.
        resource: String,
        /// Units still needed.
        need: u32,
    },
    /// Fight a monster for its drops.
    Fight {
        /// Monster code.
        monster: String,
        /// Units still needed.
        need: u32,
    },
    /// Collect the recipe's inputs and craft.
    Craft {
        /// Crafts to perform.
        crafts: u32,
    },
    /// Earn and spend task coins.
    TaskItem,
}

/// Collect `quantity` units of an item.
pub struct CollectItems {
    item: String,
    quantity: u32,
    include_bank: bool,
    include_all: bool,
    stop: Option<StopFn<CollectProgress>>,
    progress: CollectProgress,
}

impl CollectItems {
    /// Hold `quantity` units of `item` in the inventory.
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
            include_bank: false,
            include_all: false,
            stop: None,
            progress: CollectProgress::default(),
        }
    }

    /// Count banked units as held.
    #[must_use]
    pub const fn include_bank(mut self) -> Self {
        self.include_bank = true;
        self
    }

    /// Count every character's inventory and gear as held. Banked units
    /// count only with [`include_bank`](Self::include_bank) as well.
    #[must_use]
    pub const fn include_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    /// Stop once `stop` returns true.
    #[must_use]
    pub fn until(mut self, stop: StopFn<CollectProgress>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Item being collected.
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Progress so far.
    pub const fn progress(&self) -> &CollectProgress {
        &self.progress
    }

    /// Units currently counted as held.
    ///
    /// Without `include_bank`, units this run already obtained and then
    /// banked (a full inventory is emptied mid-run) still count.
    fn held(&self, ctx: &Context, character: &Character) -> u32 {
        let inventory = character.snapshot().inventory_quantity(&self.item);
        let banked = ctx.bank.quantity(&self.item);
        let carried = if self.include_all {
            ctx.roster.owned_total(&self.item)
        } else {
            inventory
        };
        if self.include_bank {
            return carried.saturating_add(banked);
        }
        if self.include_all {
            return carried;
        }
        let banked_by_run = self.progress.collected.saturating_sub(inventory).min(banked);
        inventory.saturating_add(banked_by_run)
    }

    fn add_collected(&mut self, units: u32) {
        self.progress.collected = self.progress.collected.saturating_add(units);
    }

    fn assess(
        &self,
        ctx: &Context,
        character: &Character,
    ) -> Result<Transition<CollectState>, TaskError> {
        if should_stop(self.stop.as_ref(), character, &self.progress) {
            return Ok(Transition::Done);
        }
        let held = self.held(ctx, character);
        let need = self.quantity.saturating_sub(held);
        if need == 0 {
            return Ok(Transition::Done);
        }
        debug!(
            character = %character.name(),
            item = %self.item,
            held,
            need,
            "Collecting"
        );

        let item = ctx.catalog.require_item(&self.item)?;

        if let Some(resource) = ctx.catalog.resources_dropping(&item.code).next() {
            let skill = resource.skill.skill();
            let level = character.snapshot().level(skill);
            if level < resource.level {
                return Err(TaskError::SkillTooLow {
                    skill,
                    level,
                    required: resource.level,
                });
            }
            return Ok(Transition::Next(CollectState::Harvest {
                resource: resource.code.clone(),
                need,
            }));
        }

        if let Some(monster) = ctx.catalog.monsters_dropping(&item.code).next() {
            return Ok(Transition::Next(CollectState::Fight {
                monster: monster.code.clone(),
                need,
            }));
        }

        if let Some(recipe) = &item.recipe {
            let level = character.snapshot().level(recipe.skill);
            if level < recipe.level {
                return Err(TaskError::SkillTooLow {
                    skill: recipe.skill,
                    level,
                    required: recipe.level,
                });
            }
            let crafts = need.div_ceil(recipe.quantity.max(1));
            return Ok(Transition::Next(CollectState::Craft { crafts }));
        }

        if item.is_task_reward() {
            return Ok(Transition::Next(CollectState::TaskItem));
        }

        Err(TaskError::NoSource {
            item: self.item.clone(),
        })
    }

    async fn harvest(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        resource: String,
        need: u32,
    ) -> Result<Transition<CollectState>, TaskError> {
        let code = self.item.clone();
        let mut harvest =
            Harvest::new(resource.as_str()).until(Box::new(move |_, p| p.dropped(&code) >= need));
        run(ctx, character, &mut harvest).await?;
        let progress = harvest.progress();
        if progress.gathered == 0 {
            return Err(TaskError::CannotHarvest { resource });
        }
        self.add_collected(progress.dropped(&self.item));
        Ok(Transition::Next(CollectState::Assess))
    }

    async fn fight(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        monster: String,
        need: u32,
    ) -> Result<Transition<CollectState>, TaskError> {
        let limit = ctx.settings.consecutive_loss_limit;
        let code = self.item.clone();
        let mut fight = Fight::new(monster.as_str())
            .loss_limit(limit)
            .until(Box::new(move |_, p| p.dropped(&code) >= need));
        run(ctx, character, &mut fight).await?;
        let progress = fight.progress();
        if progress.unwinnable || progress.fights == 0 || progress.consecutive_losses >= limit {
            return Err(TaskError::Unwinnable { monster });
        }
        self.add_collected(progress.dropped(&self.item));
        Ok(Transition::Next(CollectState::Assess))
    }

    async fn craft(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        crafts: u32,
    ) -> Result<Transition<CollectState>, TaskError> {
        let recipe = ctx
            .catalog
            .require_item(&self.item)?
            .recipe
            .as_ref()
            .ok_or_else(|| TaskError::NoSource {
                item: self.item.clone(),
            })?;
        for input in &recipe.items {
            let wanted = ItemQuantity::new(input.code.clone(), input.quantity.saturating_mul(crafts));
            let inputs = CollectItems::new(wanted.code, wanted.quantity).include_bank();
            collect(ctx, character, inputs).await?;
        }

        let mut craft = Craft::new(self.item.as_str(), crafts);
        run(ctx, character, &mut craft).await?;
        let made = craft.progress().made;
        if made == 0 {
            return Err(TaskError::NothingCrafted {
                item: self.item.clone(),
            });
        }
        self.add_collected(made.saturating_mul(recipe.quantity));
        Ok(Transition::Next(CollectState::Assess))
    }

    async fn task_item(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<CollectState>, TaskError> {
        let mut coins = TaskItem::new(self.item.as_str());
        run(ctx, character, &mut coins).await?;
        self.add_collected(coins.progress().received(&self.item));
        Ok(Transition::Next(CollectState::Assess))
    }
}

impl Task for CollectItems {
    type State = CollectState;

    fn describe(&self) -> String {
        format!("Collecting {}x {}", self.quantity, self.item)
    }

    fn start(&self) -> CollectState {
        CollectState::Assess
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: CollectState,
    ) -> Result<Transition<CollectState>, TaskError> {
        match state {
            CollectState::Assess => self.assess(ctx, character),
            CollectState::Harvest { resource, need } => {
                self.harvest(ctx, character, resource, need).await
            }
            CollectState::Fight { monster, need } => self.fight(ctx, character, monster, need).await,
            CollectState::Craft { crafts } => self.craft(ctx, character, crafts).await,
            CollectState::TaskItem => self.task_item(ctx, character).await,
        }
    }
}

/// Run a collect task, boxed so crafting can collect its inputs
/// recursively.
///
/// Failures other than cancellation are wrapped in
/// [`TaskError::Collect`] naming the item.
pub fn collect<'a>(
    ctx: &'a Context,
    character: &'a mut Character,
    mut task: CollectItems,
) -> BoxFuture<'a, Result<CollectProgress, TaskError>> {
    Box::pin(async move {
        match run(ctx, character, &mut task).await {
            Ok(()) => Ok(task.progress),
            Err(TaskError::Cancelled) => Err(TaskError::Cancelled),
            Err(source) => Err(TaskError::collect(task.item, source)),
        }
    })
}
