//! Craft an item in batches, pulling inputs from the bank.

use artifacts_bank::BankSnapshot;
use artifacts_types::{CharacterSnapshot, ItemQuantity, Recipe};
use tracing::{debug, info};

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{StopFn, Task, Transition, should_stop};
use crate::tasks::bank::{Withdrawal, move_to_bank_and_deposit_all, withdraw_items};

/// What a craft run has made so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CraftProgress {
    /// Crafts performed. Each yields the recipe's quantity.
    pub made: u32,
    /// Skill experience earned.
    pub xp: u64,
}

/// Craft states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftState {
    /// Work out the next batch from inventory and bank contents.
    Plan,
    /// Empty the inventory, then take the batch's inputs from the bank.
    Withdraw {
        /// Crafts the withdrawn inputs cover.
        batch: u32,
        /// Inputs to take.
        items: Vec<ItemQuantity>,
    },
    /// Walk to the workshop and craft the batch in one action.
    Make {
        /// Crafts to perform.
        batch: u32,
    },
}

/// Craft an item until `quantity` crafts are done (0 for no limit), the
/// stop predicate fires, or the inputs run out.
pub struct Craft {
    item: String,
    quantity: u32,
    bank_when_done: bool,
    stop: Option<StopFn<CraftProgress>>,
    progress: CraftProgress,
}

impl Craft {
    /// Craft `item` `quantity` times; 0 crafts until the inputs run out.
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
            bank_when_done: false,
            stop: None,
            progress: CraftProgress::default(),
        }
    }

    /// Deposit the inventory once finished.
    #[must_use]
    pub const fn bank_when_done(mut self) -> Self {
        self.bank_when_done = true;
        self
    }

    /// Stop once `stop` returns true.
    #[must_use]
    pub fn until(mut self, stop: StopFn<CraftProgress>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Progress so far.
    pub const fn progress(&self) -> &CraftProgress {
        &self.progress
    }

    fn recipe<'c>(&self, ctx: &'c Context) -> Result<&'c Recipe, TaskError> {
        ctx.catalog
            .require_item(&self.item)?
            .recipe
            .as_ref()
            .ok_or_else(|| TaskError::NoSource {
                item: self.item.clone(),
            })
    }

    async fn plan(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<CraftState>, TaskError> {
        let recipe = self.recipe(ctx)?;
        let level = character.snapshot().level(recipe.skill);
        if level < recipe.level {
            debug!(
                character = %character.name(),
                item = %self.item,
                level,
                required = recipe.level,
                "Skill too low to craft"
            );
            return Ok(Transition::Done);
        }

        let need = if self.quantity == 0 {
            u32::MAX
        } else {
            self.quantity
        };
        let remaining = need.saturating_sub(self.progress.made);
        if remaining == 0 || should_stop(self.stop.as_ref(), character, &self.progress) {
            if self.bank_when_done {
                move_to_bank_and_deposit_all(ctx, character).await?;
            }
            return Ok(Transition::Done);
        }

        let bank = ctx.bank.snapshot();
        let (total, in_inventory) = craftable(recipe, character.snapshot(), &bank);
        if total == 0 {
            info!(
                character = %character.name(),
                item = %self.item,
                made = self.progress.made,
                "Out of inputs"
            );
            return Ok(Transition::Done);
        }
        if in_inventory > 0 {
            return Ok(Transition::Next(CraftState::Make {
                batch: in_inventory.min(remaining),
            }));
        }

        let per_craft = recipe.inventory_required();
        let fits = character
            .snapshot()
            .inventory_max_items
            .checked_div(per_craft)
            .unwrap_or(0);
        let batch = fits.min(total).min(remaining);
        if batch == 0 {
            return Err(TaskError::InventoryTooSmall {
                item: self.item.clone(),
            });
        }
        let items = recipe
            .items
            .iter()
            .map(|input| ItemQuantity::new(input.code.clone(), input.quantity.saturating_mul(batch)))
            .collect();
        Ok(Transition::Next(CraftState::Withdraw { batch, items }))
    }

    async fn make(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        batch: u32,
    ) -> Result<Transition<CraftState>, TaskError> {
        let recipe = self.recipe(ctx)?;
        character.move_to_workshop(ctx, recipe.skill).await?;
        let result = character.craft(ctx, &self.item, batch).await?;
        self.progress.made = self.progress.made.saturating_add(batch);
        self.progress.xp = self.progress.xp.saturating_add(result.xp);
        debug!(
            character = %character.name(),
            item = %self.item,
            batch,
            made = self.progress.made,
            "Crafted"
        );
        Ok(Transition::Next(CraftState::Plan))
    }
}

/// Crafts possible from inventory plus bank, and from inventory alone.
///
/// A recipe without inputs is never craftable.
pub fn craftable(recipe: &Recipe, character: &CharacterSnapshot, bank: &BankSnapshot) -> (u32, u32) {
    let mut total = u32::MAX;
    let mut in_inventory = u32::MAX;
    for input in &recipe.items {
        let held = character.inventory_quantity(&input.code);
        let banked = bank.quantity(&input.code);
        let available = held.saturating_add(banked);
        total = total.min(available.checked_div(input.quantity).unwrap_or(0));
        in_inventory = in_inventory.min(held.checked_div(input.quantity).unwrap_or(0));
    }
    if recipe.items.is_empty() {
        return (0, 0);
    }
    (total, in_inventory)
}

impl Task for Craft {
    type State = CraftState;

    fn describe(&self) -> String {
        if self.quantity == 0 {
            format!("Crafting {}", self.item)
        } else {
            format!("Crafting {}x {}", self.quantity, self.item)
        }
    }

    fn start(&self) -> CraftState {
        CraftState::Plan
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: CraftState,
    ) -> Result<Transition<CraftState>, TaskError> {
        match state {
            CraftState::Plan => self.plan(ctx, character).await,
            CraftState::Withdraw { batch, items } => {
                move_to_bank_and_deposit_all(ctx, character).await?;
                match withdraw_items(ctx, character, &items).await? {
                    Withdrawal::Complete => Ok(Transition::Next(CraftState::Make { batch })),
                    Withdrawal::Raced => Ok(Transition::Next(CraftState::Plan)),
                }
            }
            CraftState::Make { batch } => self.make(ctx, character, batch).await,
        }
    }
}
