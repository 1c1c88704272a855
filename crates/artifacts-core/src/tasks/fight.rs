//! Fight a monster until told to stop.

use std::collections::BTreeMap;

use artifacts_types::{ContentKind, FightOutcome, FightResult};
use tracing::{debug, info};

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{StopFn, Task, Transition, should_stop};
use crate::tasks::bank::move_to_bank_and_deposit_all;
use crate::tasks::equip::equip_best;

/// What a fight run has achieved so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FightProgress {
    /// Fights fought.
    pub fights: u32,
    /// Fights won.
    pub wins: u32,
    /// Fights lost.
    pub losses: u32,
    /// Losses since the last win.
    pub consecutive_losses: u32,
    /// Combat experience earned.
    pub xp: u64,
    /// Gold earned.
    pub gold: u64,
    /// Units received per item code.
    pub drops: BTreeMap<String, u32>,
    /// The best owned gear was not expected to win, so the run stopped
    /// without fighting.
    pub unwinnable: bool,
}

impl FightProgress {
    /// Units of one item received.
    pub fn dropped(&self, code: &str) -> u32 {
        self.drops.get(code).copied().unwrap_or(0)
    }

    fn record(&mut self, result: &FightResult) {
        self.fights = self.fights.saturating_add(1);
        match result.outcome {
            FightOutcome::Win => {
                self.wins = self.wins.saturating_add(1);
                self.consecutive_losses = 0;
            }
            FightOutcome::Lose => {
                self.losses = self.losses.saturating_add(1);
                self.consecutive_losses = self.consecutive_losses.saturating_add(1);
            }
        }
        self.xp = self.xp.saturating_add(result.xp);
        self.gold = self.gold.saturating_add(result.gold);
        for item in &result.drops {
            let entry = self.drops.entry(item.code.clone()).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }
    }
}

/// Fight states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FightState {
    /// Decide whether to stop, bank, re-equip or fight.
    Prepare,
    /// Walk to the monster and fight once.
    Engage,
}

/// Fight one monster repeatedly.
///
/// Finishes when the stop predicate fires, the fight cap is reached, the
/// consecutive-loss limit is reached, no tile hosts the monster, the
/// monster vanished from its tile, or the best owned gear cannot win (see
/// [`FightProgress::unwinnable`]).
pub struct Fight {
    monster: String,
    max_fights: Option<u32>,
    loss_limit: Option<u32>,
    stop: Option<StopFn<FightProgress>>,
    progress: FightProgress,
    bank_seen: Option<u64>,
}

impl Fight {
    /// Fight `monster` until stopped.
    pub fn new(monster: impl Into<String>) -> Self {
        Self {
            monster: monster.into(),
            max_fights: None,
            loss_limit: None,
            stop: None,
            progress: FightProgress::default(),
            bank_seen: None,
        }
    }

    /// Stop after this many fights.
    #[must_use]
    pub const fn max_fights(mut self, fights: u32) -> Self {
        self.max_fights = Some(fights);
        self
    }

    /// Stop after this many losses in a row.
    #[must_use]
    pub const fn loss_limit(mut self, losses: u32) -> Self {
        self.loss_limit = Some(losses);
        self
    }

    /// Stop once `stop` returns true.
    #[must_use]
    pub fn until(mut self, stop: StopFn<FightProgress>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Progress so far.
    pub const fn progress(&self) -> &FightProgress {
        &self.progress
    }

    async fn prepare(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<FightState>, TaskError> {
        let monster = ctx.catalog.require_monster(&self.monster)?;
        if should_stop(self.stop.as_ref(), character, &self.progress) {
            return Ok(Transition::Done);
        }
        if self.max_fights.is_some_and(|max| self.progress.fights >= max) {
            return Ok(Transition::Done);
        }
        if self
            .loss_limit
            .is_some_and(|limit| self.progress.consecutive_losses >= limit)
        {
            info!(
                character = %character.name(),
                monster = %monster.code,
                losses = self.progress.consecutive_losses,
                "Loss limit reached"
            );
            return Ok(Transition::Done);
        }
        if ctx
            .catalog
            .locations(ContentKind::Monster, &monster.code)
            .is_empty()
        {
            info!(monster = %monster.code, "Monster is not on the map");
            return Ok(Transition::Done);
        }
        if character.snapshot().is_inventory_full() {
            move_to_bank_and_deposit_all(ctx, character).await?;
            return Ok(Transition::Next(FightState::Prepare));
        }
        if self.bank_seen != Some(ctx.bank.revision()) {
            let set = equip_best(ctx, character, &monster.stats).await?;
            self.bank_seen = Some(ctx.bank.revision());
            if !set.can_win() {
                info!(
                    character = %character.name(),
                    monster = %monster.code,
                    turns_to_kill = set.turns_to_kill_monster,
                    turns_to_die = set.turns_to_kill_player,
                    "Best gear cannot win"
                );
                self.progress.unwinnable = true;
                return Ok(Transition::Done);
            }
            return Ok(Transition::Next(FightState::Prepare));
        }
        Ok(Transition::Next(FightState::Engage))
    }

    async fn engage(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<FightState>, TaskError> {
        character
            .move_to_closest(ctx, ContentKind::Monster, &self.monster)
            .await?;
        match character.fight(ctx).await {
            Ok(result) => {
                self.progress.record(&result);
                debug!(
                    character = %character.name(),
                    monster = %self.monster,
                    outcome = ?result.outcome,
                    wins = self.progress.wins,
                    losses = self.progress.losses,
                    "Fought"
                );
                Ok(Transition::Next(FightState::Prepare))
            }
            Err(error) if error.is_not_found_on_map() => {
                info!(
                    character = %character.name(),
                    monster = %self.monster,
                    "Monster gone from its tile"
                );
                Ok(Transition::Done)
            }
            Err(error) => Err(error),
        }
    }
}

impl Task for Fight {
    type State = FightState;

    fn describe(&self) -> String {
        format!("Fighting {}", self.monster)
    }

    fn start(&self) -> FightState {
        FightState::Prepare
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: FightState,
    ) -> Result<Transition<FightState>, TaskError> {
        match state {
            FightState::Prepare => self.prepare(ctx, character).await,
            FightState::Engage => self.engage(ctx, character).await,
        }
    }
}
