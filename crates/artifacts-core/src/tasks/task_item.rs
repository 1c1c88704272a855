//! Obtain task rewards by spending task coins.

use std::collections::BTreeMap;

use artifacts_client::{CANCEL_COST, EXCHANGE_COST, TASKS_COIN};
use artifacts_types::{ItemQuantity, TaskType};
use tracing::info;

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{Task, Transition, run};
use crate::tasks::bank::{Withdrawal, withdraw_items};
use crate::tasks::task_loop::TaskLoop;

/// What a task-item run has obtained so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskItemProgress {
    /// Exchanges made.
    pub exchanges: u32,
    /// Tasks turned in along the way.
    pub tasks_completed: u32,
    /// Tasks abandoned.
    pub cancelled: u32,
    /// Reward units received per item code, from exchanges and tasks.
    pub rewards: BTreeMap<String, u32>,
}

impl TaskItemProgress {
    /// Units of one item received.
    pub fn received(&self, code: &str) -> u32 {
        self.rewards.get(code).copied().unwrap_or(0)
    }

    fn add_rewards(&mut self, items: &[ItemQuantity]) {
        for item in items {
            let entry = self.rewards.entry(item.code.clone()).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }
    }
}

/// Task-item states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskItemState {
    /// Exchange, cancel, or earn more coins.
    Decide,
    /// Bring coins to the tasks master and exchange them.
    Exchange,
    /// Do monster tasks until one is turned in.
    DoTask,
    /// Abandon a task that cannot be done.
    Cancel,
}

/// Earn task coins and exchange them once for a random task reward.
///
/// Keeps a reserve of coins for cancelling tasks and only exchanges once
/// enough coins are spare. A held task that cannot be done is cancelled if
/// a coin is available.
pub struct TaskItem {
    item: String,
    stuck: bool,
    progress: TaskItemProgress,
}

impl TaskItem {
    /// Work towards `item`, a task reward.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            stuck: false,
            progress: TaskItemProgress::default(),
        }
    }

    /// Progress so far.
    pub const fn progress(&self) -> &TaskItemProgress {
        &self.progress
    }

    fn coins(ctx: &Context, character: &Character) -> (u32, u32) {
        (
            character.snapshot().inventory_quantity(TASKS_COIN),
            ctx.bank.quantity(TASKS_COIN),
        )
    }

    fn decide(
        &self,
        ctx: &Context,
        character: &Character,
    ) -> Result<Transition<TaskItemState>, TaskError> {
        let (held, banked) = Self::coins(ctx, character);
        let coins = held.saturating_add(banked);
        let spare = coins.saturating_sub(ctx.settings.coins_reserve);
        if spare >= EXCHANGE_COST {
            return Ok(Transition::Next(TaskItemState::Exchange));
        }
        let stuck_task = character.snapshot().task.as_ref().filter(|_| self.stuck);
        match stuck_task {
            Some(_) if coins >= CANCEL_COST => Ok(Transition::Next(TaskItemState::Cancel)),
            Some(task) => Err(TaskError::TaskStuck {
                task: task.code.clone(),
            }),
            None => Ok(Transition::Next(TaskItemState::DoTask)),
        }
    }

    /// Withdraw coins so the inventory holds at least `needed`.
    async fn fetch_coins(
        ctx: &Context,
        character: &mut Character,
        needed: u32,
    ) -> Result<Withdrawal, TaskError> {
        let (held, banked) = Self::coins(ctx, character);
        let missing = needed
            .saturating_sub(held)
            .min(banked)
            .min(character.snapshot().inventory_free());
        withdraw_items(ctx, character, &[ItemQuantity::new(TASKS_COIN, missing)]).await
    }

    async fn exchange(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<TaskItemState>, TaskError> {
        if Self::fetch_coins(ctx, character, EXCHANGE_COST).await? == Withdrawal::Raced {
            return Ok(Transition::Next(TaskItemState::Decide));
        }
        character.move_to_tasks_master(ctx, TaskType::Monsters).await?;
        let reward = character.exchange_task(ctx).await?;
        self.progress.exchanges = self.progress.exchanges.saturating_add(1);
        self.progress.add_rewards(&reward.items);
        info!(
            character = %character.name(),
            wanted = %self.item,
            received = ?reward.items,
            "Exchanged task coins"
        );
        Ok(Transition::Done)
    }

    async fn cancel(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<TaskItemState>, TaskError> {
        let Some((code, task_type)) = character
            .snapshot()
            .task
            .as_ref()
            .map(|t| (t.code.clone(), t.task_type))
        else {
            self.stuck = false;
            return Ok(Transition::Next(TaskItemState::Decide));
        };
        if Self::fetch_coins(ctx, character, CANCEL_COST).await? == Withdrawal::Raced {
            return Ok(Transition::Next(TaskItemState::Decide));
        }
        character.move_to_tasks_master(ctx, task_type).await?;
        character.cancel_task(ctx).await?;
        self.progress.cancelled = self.progress.cancelled.saturating_add(1);
        self.stuck = false;
        info!(character = %character.name(), task = %code, "Task cancelled");
        Ok(Transition::Next(TaskItemState::Decide))
    }

    async fn do_task(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<TaskItemState>, TaskError> {
        let mut tasks = TaskLoop::new().until_completed(1);
        run(ctx, character, &mut tasks).await?;
        let progress = tasks.progress();
        self.progress.tasks_completed = self
            .progress
            .tasks_completed
            .saturating_add(progress.completed);
        for (code, quantity) in &progress.rewards {
            let entry = self.progress.rewards.entry(code.clone()).or_insert(0);
            *entry = entry.saturating_add(*quantity);
        }
        if progress.unwinnable {
            self.stuck = true;
        }
        Ok(Transition::Next(TaskItemState::Decide))
    }
}

impl Task for TaskItem {
    type State = TaskItemState;

    fn describe(&self) -> String {
        format!("Earning task coins for {}", self.item)
    }

    fn start(&self) -> TaskItemState {
        TaskItemState::Decide
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: TaskItemState,
    ) -> Result<Transition<TaskItemState>, TaskError> {
        match state {
            TaskItemState::Decide => self.decide(ctx, character),
            TaskItemState::Exchange => self.exchange(ctx, character).await,
            TaskItemState::DoTask => self.do_task(ctx, character).await,
            TaskItemState::Cancel => self.cancel(ctx, character).await,
        }
    }
}
