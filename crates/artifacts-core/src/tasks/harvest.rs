//! Harvest a resource until told to stop.

use std::collections::BTreeMap;

use artifacts_types::{ContentKind, SkillResult};
use tracing::{debug, info};

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{StopFn, Task, Transition, should_stop};
use crate::tasks::bank::move_to_bank_and_deposit_all;
use crate::tasks::equip::equip_best;

/// What a harvest run has gathered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestProgress {
    /// Successful gather actions.
    pub gathered: u32,
    /// Units received per item code.
    pub drops: BTreeMap<String, u32>,
    /// Skill experience earned.
    pub xp: u64,
}

impl HarvestProgress {
    /// Units of one item received.
    pub fn dropped(&self, code: &str) -> u32 {
        self.drops.get(code).copied().unwrap_or(0)
    }

    fn record(&mut self, result: &SkillResult) {
        self.gathered = self.gathered.saturating_add(1);
        self.xp = self.xp.saturating_add(result.xp);
        for item in &result.items {
            let entry = self.drops.entry(item.code.clone()).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }
    }
}

/// Harvest states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    /// Decide whether to stop, bank, re-equip or gather.
    Check,
    /// Walk to the resource and gather once.
    Gather,
}

/// Gather one resource repeatedly.
///
/// Finishes without acting when the gathering skill is below the
/// resource's level, when the stop predicate fires, when no tile hosts the
/// resource, or when the resource vanished from its tile. Deposits the
/// inventory whenever it is full and re-equips the best tools whenever the
/// bank changed.
pub struct Harvest {
    resource: String,
    stop: Option<StopFn<HarvestProgress>>,
    progress: HarvestProgress,
    bank_seen: Option<u64>,
}

impl Harvest {
    /// Harvest `resource` until stopped.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            stop: None,
            progress: HarvestProgress::default(),
            bank_seen: None,
        }
    }

    /// Stop once `stop` returns true.
    #[must_use]
    pub fn until(mut self, stop: StopFn<HarvestProgress>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Progress so far.
    pub const fn progress(&self) -> &HarvestProgress {
        &self.progress
    }

    async fn check(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<HarvestState>, TaskError> {
        let resource = ctx.catalog.require_resource(&self.resource)?;
        let skill = resource.skill.skill();
        let level = character.snapshot().level(skill);
        if level < resource.level {
            debug!(
                character = %character.name(),
                resource = %resource.code,
                level,
                required = resource.level,
                "Skill too low to harvest"
            );
            return Ok(Transition::Done);
        }
        if should_stop(self.stop.as_ref(), character, &self.progress) {
            return Ok(Transition::Done);
        }
        if ctx
            .catalog
            .locations(ContentKind::Resource, &resource.code)
            .is_empty()
        {
            info!(resource = %resource.code, "Resource is not on the map");
            return Ok(Transition::Done);
        }
        if character.snapshot().is_inventory_full() {
            move_to_bank_and_deposit_all(ctx, character).await?;
            return Ok(Transition::Next(HarvestState::Check));
        }
        if self.bank_seen != Some(ctx.bank.revision()) {
            equip_best(ctx, character, &resource.target_profile()).await?;
            self.bank_seen = Some(ctx.bank.revision());
            return Ok(Transition::Next(HarvestState::Check));
        }
        Ok(Transition::Next(HarvestState::Gather))
    }

    async fn gather(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<HarvestState>, TaskError> {
        character
            .move_to_closest(ctx, ContentKind::Resource, &self.resource)
            .await?;
        match character.gather(ctx).await {
            Ok(result) => {
                self.progress.record(&result);
                Ok(Transition::Next(HarvestState::Check))
            }
            Err(error) if error.is_not_found_on_map() => {
                info!(
                    character = %character.name(),
                    resource = %self.resource,
                    "Resource gone from its tile"
                );
                Ok(Transition::Done)
            }
            Err(error) => Err(error),
        }
    }
}

impl Task for Harvest {
    type State = HarvestState;

    fn describe(&self) -> String {
        format!("Harvesting {}", self.resource)
    }

    fn start(&self) -> HarvestState {
        HarvestState::Check
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: HarvestState,
    ) -> Result<Transition<HarvestState>, TaskError> {
        match state {
            HarvestState::Check => self.check(ctx, character).await,
            HarvestState::Gather => self.gather(ctx, character).await,
        }
    }
}
