//! Make an item in batches, optionally recycling the output.

use tracing::{info, warn};

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{StopFn, Task, Transition, should_stop};
use crate::tasks::bank::move_to_bank_and_deposit_all;
use crate::tasks::collect::{CollectItems, collect};

/// What a make run has produced so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MakeProgress {
    /// Units made.
    pub made: u32,
    /// Units recycled.
    pub recycled: u32,
    /// Batches finished.
    pub batches: u32,
}

/// Make states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MakeState {
    /// Empty the inventory and collect one batch.
    Collect,
    /// Recycle if asked, then bank everything.
    Finish {
        /// Units the batch produced.
        made: u32,
    },
}

/// Repeatedly collect a batch of an item and bank it.
///
/// Runs until the stop predicate fires; the predicate sees how many units
/// were made.
pub struct MakeItems {
    item: String,
    batch: u32,
    recycle: bool,
    stop: Option<StopFn<MakeProgress>>,
    progress: MakeProgress,
}

impl MakeItems {
    /// Make `item` in batches of `batch` units.
    pub fn new(item: impl Into<String>, batch: u32) -> Self {
        Self {
            item: item.into(),
            batch: batch.max(1),
            recycle: false,
            stop: None,
            progress: MakeProgress::default(),
        }
    }

    /// Recycle each batch after making it (crafting training).
    #[must_use]
    pub const fn recycled(mut self) -> Self {
        self.recycle = true;
        self
    }

    /// Stop once `stop` returns true.
    #[must_use]
    pub fn until(mut self, stop: StopFn<MakeProgress>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Stop once `quantity` units were made.
    #[must_use]
    pub fn until_made(self, quantity: u32) -> Self {
        self.until(Box::new(move |_, progress| progress.made >= quantity))
    }

    /// Progress so far.
    pub const fn progress(&self) -> &MakeProgress {
        &self.progress
    }

    async fn collect_batch(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<MakeState>, TaskError> {
        if should_stop(self.stop.as_ref(), character, &self.progress) {
            return Ok(Transition::Done);
        }
        move_to_bank_and_deposit_all(ctx, character).await?;
        let batch = CollectItems::new(self.item.as_str(), self.batch);
        let collected = collect(ctx, character, batch).await?;
        let made = collected.collected;
        self.progress.made = self.progress.made.saturating_add(made);
        self.progress.batches = self.progress.batches.saturating_add(1);
        info!(
            character = %character.name(),
            item = %self.item,
            made,
            total = self.progress.made,
            "Batch made"
        );
        Ok(Transition::Next(MakeState::Finish { made }))
    }

    async fn finish(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        made: u32,
    ) -> Result<Transition<MakeState>, TaskError> {
        let held = character.snapshot().inventory_quantity(&self.item);
        let to_recycle = made.min(held);
        let recycled = if self.recycle && to_recycle > 0 {
            self.recycle_batch(ctx, character, to_recycle).await
        } else {
            Ok(())
        };
        match recycled {
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) => warn!(
                character = %character.name(),
                item = %self.item,
                error = %error,
                "Recycling failed"
            ),
            Ok(()) => {}
        }
        move_to_bank_and_deposit_all(ctx, character).await?;
        Ok(Transition::Next(MakeState::Collect))
    }

    async fn recycle_batch(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        quantity: u32,
    ) -> Result<(), TaskError> {
        let skill = ctx
            .catalog
            .require_item(&self.item)?
            .recipe
            .as_ref()
            .map(|r| r.skill)
            .ok_or_else(|| TaskError::NoSource {
                item: self.item.clone(),
            })?;
        character.move_to_workshop(ctx, skill).await?;
        character.recycle(ctx, &self.item, quantity).await?;
        self.progress.recycled = self.progress.recycled.saturating_add(quantity);
        Ok(())
    }
}

impl Task for MakeItems {
    type State = MakeState;

    fn describe(&self) -> String {
        format!("Making {} in batches of {}", self.item, self.batch)
    }

    fn start(&self) -> MakeState {
        MakeState::Collect
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: MakeState,
    ) -> Result<Transition<MakeState>, TaskError> {
        match state {
            MakeState::Collect => self.collect_batch(ctx, character).await,
            MakeState::Finish { made } => self.finish(ctx, character, made).await,
        }
    }
}
