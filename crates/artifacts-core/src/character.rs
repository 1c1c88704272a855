//! The character handle.
//!
//! A [`Character`] owns the latest snapshot of one character and is the
//! only path through which that character acts. Every action goes through
//! [`Character::perform`], which:
//!
//! 1. waits out the cooldown left by the previous action,
//! 2. sends the action, re-sending it when the server answers "locked" or
//!    "in cooldown" (up to the configured retry budget),
//! 3. replaces the snapshot with the one in the response, updates the
//!    shared bank when the response carries bank contents, publishes the
//!    new state to the roster,
//! 4. waits out the new cooldown.
//!
//! Waits race against the shutdown signal. An action already sent is never
//! abandoned.

use std::time::Duration;

use artifacts_client::codes;
use artifacts_types::{
    Action, ActionDetails, ActionResponse, CharacterSnapshot, ContentKind, FightResult,
    ItemQuantity, Position, Skill, SkillResult, Slot, TaskAssignment, TaskReward, TaskType,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::TaskError;
use crate::roster::CharacterUpdate;

/// Handle through which one character acts.
#[derive(Debug, Clone)]
pub struct Character {
    snapshot: CharacterSnapshot,
    activity: Vec<String>,
}

impl Character {
    /// Wrap a snapshot fetched from the backend.
    pub const fn new(snapshot: CharacterSnapshot) -> Self {
        Self {
            snapshot,
            activity: Vec::new(),
        }
    }

    /// Character name.
    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    /// Latest snapshot.
    pub const fn snapshot(&self) -> &CharacterSnapshot {
        &self.snapshot
    }

    /// Current activity stack, outermost first.
    pub fn activity(&self) -> &[String] {
        &self.activity
    }

    // -----------------------------------------------------------------------
    // Activity and roster
    // -----------------------------------------------------------------------

    /// Push a description of what the character is doing now.
    pub fn push_activity(&mut self, ctx: &Context, description: String) {
        self.activity.push(description);
        self.publish(ctx);
    }

    /// Pop the innermost activity.
    pub fn pop_activity(&mut self, ctx: &Context) {
        self.activity.pop();
        self.publish(ctx);
    }

    /// Publish the current state to the roster.
    pub fn publish(&self, ctx: &Context) {
        ctx.roster.publish(CharacterUpdate {
            snapshot: self.snapshot.clone(),
            activity: self.activity.clone(),
        });
    }

    // -----------------------------------------------------------------------
    // Cooldown
    // -----------------------------------------------------------------------

    /// Time left before the character may act again.
    pub fn cooldown_remaining(&self) -> Duration {
        self.snapshot
            .cooldown_expires
            .signed_duration_since(Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Sleep until the cooldown expires or shutdown is requested.
    pub async fn wait_cooldown(&self, ctx: &Context) {
        let remaining = self.cooldown_remaining();
        if remaining.is_zero() {
            return;
        }
        debug!(
            character = %self.snapshot.name,
            ms = remaining.as_millis(),
            "Waiting for cooldown"
        );
        sleep_or_shutdown(ctx, remaining).await;
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Send one action and apply its response.
    pub async fn perform(
        &mut self,
        ctx: &Context,
        action: &Action,
    ) -> Result<ActionResponse, TaskError> {
        let mut attempt: u32 = 0;
        loop {
            self.wait_cooldown(ctx).await;
            if ctx.shutdown.is_requested() {
                return Err(TaskError::Cancelled);
            }

            match ctx.backend.execute(&self.snapshot.name, action).await {
                Ok(response) => {
                    self.apply(ctx, &response);
                    self.wait_cooldown(ctx).await;
                    return Ok(response);
                }
                Err(error) if error.is_transient() && attempt < ctx.settings.transient_retries => {
                    attempt = attempt.saturating_add(1);
                    warn!(
                        character = %self.snapshot.name,
                        action = action.name(),
                        attempt,
                        error = %error,
                        "Action rejected, retrying"
                    );
                    if error.code() == Some(codes::COOLDOWN) && self.refresh(ctx).await.is_ok() {
                        continue;
                    }
                    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
                    let delay = ctx.settings.transient_backoff().saturating_mul(factor);
                    sleep_or_shutdown(ctx, delay).await;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn apply(&mut self, ctx: &Context, response: &ActionResponse) {
        self.snapshot = response.character.clone();
        if let Some(bank) = &response.bank {
            ctx.bank.replace(bank.clone());
        }
        self.publish(ctx);
    }

    /// Re-read the character from the backend.
    pub async fn refresh(&mut self, ctx: &Context) -> Result<(), TaskError> {
        self.snapshot = ctx.backend.character(&self.snapshot.name).await?;
        self.publish(ctx);
        Ok(())
    }

    /// Re-read the bank from the backend into the shared copy.
    pub async fn refresh_bank(&self, ctx: &Context) -> Result<(), TaskError> {
        let items = ctx.backend.bank_items().await?;
        ctx.bank.replace(items);
        Ok(())
    }

    /// Walk to a tile. Does nothing when already there.
    pub async fn move_to(&mut self, ctx: &Context, position: Position) -> Result<(), TaskError> {
        if self.snapshot.position == position {
            return Ok(());
        }
        match self.perform(ctx, &Action::Move { position }).await {
            Ok(_) => Ok(()),
            Err(TaskError::Api { source })
                if source.code() == Some(codes::ALREADY_AT_DESTINATION) =>
            {
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// Walk to the closest tile hosting the given content.
    pub async fn move_to_closest(
        &mut self,
        ctx: &Context,
        kind: ContentKind,
        code: &str,
    ) -> Result<(), TaskError> {
        let position = ctx
            .catalog
            .closest(kind, code, self.snapshot.position)
            .ok_or_else(|| TaskError::NoLocation {
                kind,
                code: code.to_owned(),
            })?;
        self.move_to(ctx, position).await
    }

    /// Walk to the closest bank.
    pub async fn move_to_bank(&mut self, ctx: &Context) -> Result<(), TaskError> {
        self.move_to_closest(ctx, ContentKind::Bank, ContentKind::Bank.as_str())
            .await
    }

    /// Walk to the closest workshop for a crafting skill.
    pub async fn move_to_workshop(&mut self, ctx: &Context, skill: Skill) -> Result<(), TaskError> {
        self.move_to_closest(ctx, ContentKind::Workshop, skill.as_str())
            .await
    }

    /// Walk to the closest tasks master for a task type.
    pub async fn move_to_tasks_master(
        &mut self,
        ctx: &Context,
        task_type: TaskType,
    ) -> Result<(), TaskError> {
        self.move_to_closest(ctx, ContentKind::TasksMaster, task_type.as_str())
            .await
    }

    /// Harvest the resource on the current tile.
    pub async fn gather(&mut self, ctx: &Context) -> Result<SkillResult, TaskError> {
        let response = self.perform(ctx, &Action::Gather).await?;
        Ok(skill_result(response.details))
    }

    /// Craft at the current workshop.
    pub async fn craft(
        &mut self,
        ctx: &Context,
        code: &str,
        quantity: u32,
    ) -> Result<SkillResult, TaskError> {
        let action = Action::Craft(ItemQuantity::new(code, quantity));
        let response = self.perform(ctx, &action).await?;
        Ok(skill_result(response.details))
    }

    /// Recycle items at the current workshop.
    pub async fn recycle(
        &mut self,
        ctx: &Context,
        code: &str,
        quantity: u32,
    ) -> Result<SkillResult, TaskError> {
        let action = Action::Recycle(ItemQuantity::new(code, quantity));
        let response = self.perform(ctx, &action).await?;
        Ok(skill_result(response.details))
    }

    /// Fight the monster on the current tile.
    pub async fn fight(&mut self, ctx: &Context) -> Result<FightResult, TaskError> {
        let response = self.perform(ctx, &Action::Fight).await?;
        match response.details {
            ActionDetails::Fight(result) => Ok(result),
            _ => Err(TaskError::UnexpectedResponse {
                action: Action::Fight.name(),
            }),
        }
    }

    /// Wear an item from the inventory.
    pub async fn equip(&mut self, ctx: &Context, slot: Slot, code: &str) -> Result<(), TaskError> {
        let action = Action::Equip {
            slot,
            code: code.to_owned(),
        };
        self.perform(ctx, &action).await.map(|_| ())
    }

    /// Move a worn item into the inventory.
    pub async fn unequip(&mut self, ctx: &Context, slot: Slot) -> Result<(), TaskError> {
        self.perform(ctx, &Action::Unequip { slot })
            .await
            .map(|_| ())
    }

    /// Put items into the bank. The character must be on a bank tile.
    pub async fn deposit(
        &mut self,
        ctx: &Context,
        code: &str,
        quantity: u32,
    ) -> Result<(), TaskError> {
        let action = Action::Deposit(ItemQuantity::new(code, quantity));
        self.perform(ctx, &action).await.map(|_| ())
    }

    /// Take items from the bank. The character must be on a bank tile.
    pub async fn withdraw(
        &mut self,
        ctx: &Context,
        code: &str,
        quantity: u32,
    ) -> Result<(), TaskError> {
        let action = Action::Withdraw(ItemQuantity::new(code, quantity));
        self.perform(ctx, &action).await.map(|_| ())
    }

    /// Take a task from the tasks master on the current tile.
    pub async fn accept_task(&mut self, ctx: &Context) -> Result<TaskAssignment, TaskError> {
        let response = self.perform(ctx, &Action::AcceptTask).await?;
        match response.details {
            ActionDetails::Task(task) => Ok(task),
            _ => Err(TaskError::UnexpectedResponse {
                action: Action::AcceptTask.name(),
            }),
        }
    }

    /// Turn in the finished task.
    pub async fn complete_task(&mut self, ctx: &Context) -> Result<TaskReward, TaskError> {
        let response = self.perform(ctx, &Action::CompleteTask).await?;
        Ok(task_reward(response.details))
    }

    /// Trade task coins for a reward.
    pub async fn exchange_task(&mut self, ctx: &Context) -> Result<TaskReward, TaskError> {
        let response = self.perform(ctx, &Action::ExchangeTask).await?;
        Ok(task_reward(response.details))
    }

    /// Abandon the current task.
    pub async fn cancel_task(&mut self, ctx: &Context) -> Result<(), TaskError> {
        self.perform(ctx, &Action::CancelTask).await.map(|_| ())
    }
}

/// Sleep for `duration`, returning early on shutdown.
pub async fn sleep_or_shutdown(ctx: &Context, duration: Duration) {
    tokio::select! {
        () = tokio::time::sleep(duration) => {}
        () = ctx.shutdown.wait() => {}
    }
}

fn skill_result(details: ActionDetails) -> SkillResult {
    match details {
        ActionDetails::Skill(result) => result,
        _ => SkillResult::default(),
    }
}

fn task_reward(details: ActionDetails) -> TaskReward {
    match details {
        ActionDetails::Reward(reward) => reward,
        _ => TaskReward::default(),
    }
}
