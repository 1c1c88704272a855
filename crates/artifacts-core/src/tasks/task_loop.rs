//! Take, fight for, and turn in monster tasks.

use std::collections::BTreeMap;

use artifacts_types::{TaskReward, TaskType};
use tracing::info;

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::{StopFn, Task, Transition, run, should_stop};
use crate::tasks::fight::Fight;

/// What a task-loop run has achieved so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLoopProgress {
    /// Tasks turned in.
    pub completed: u32,
    /// Reward units received per item code.
    pub rewards: BTreeMap<String, u32>,
    /// Gold received from rewards.
    pub gold: u64,
    /// Fights fought for tasks.
    pub fights: u32,
    /// Losses since the last win.
    pub consecutive_losses: u32,
    /// The current task cannot be done: its monster cannot be beaten, or it
    /// is not a monster task.
    pub unwinnable: bool,
}

impl TaskLoopProgress {
    fn record_reward(&mut self, reward: &TaskReward) {
        self.completed = self.completed.saturating_add(1);
        self.gold = self.gold.saturating_add(reward.gold);
        for item in &reward.items {
            let entry = self.rewards.entry(item.code.clone()).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }
    }
}

/// Task-loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLoopState {
    /// Turn in the current task if it is finished.
    TurnIn,
    /// Stop, accept a task, or hunt for the current one.
    Decide,
    /// Take a monster task from the tasks master.
    Accept,
    /// Fight the task's monster once.
    Hunt,
}

/// Do monster tasks until the stop predicate fires or a task turns out to
/// be undoable.
///
/// A finished task is always turned in first, before the stop predicate is
/// consulted, so stopping after one completion never strands a finished
/// task.
pub struct TaskLoop {
    stop: Option<StopFn<TaskLoopProgress>>,
    progress: TaskLoopProgress,
}

impl Default for TaskLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskLoop {
    /// Do tasks until stopped.
    pub const fn new() -> Self {
        Self {
            stop: None,
            progress: TaskLoopProgress {
                completed: 0,
                rewards: BTreeMap::new(),
                gold: 0,
                fights: 0,
                consecutive_losses: 0,
                unwinnable: false,
            },
        }
    }

    /// Stop once `stop` returns true.
    #[must_use]
    pub fn until(mut self, stop: StopFn<TaskLoopProgress>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Stop after `count` tasks are turned in.
    #[must_use]
    pub fn until_completed(self, count: u32) -> Self {
        self.until(Box::new(move |_, progress| progress.completed >= count))
    }

    /// Progress so far.
    pub const fn progress(&self) -> &TaskLoopProgress {
        &self.progress
    }

    async fn turn_in(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<TaskLoopState>, TaskError> {
        let finished = character
            .snapshot()
            .task
            .as_ref()
            .filter(|task| task.is_finished())
            .map(|task| (task.code.clone(), task.task_type));
        if let Some((code, task_type)) = finished {
            character.move_to_tasks_master(ctx, task_type).await?;
            let reward = character.complete_task(ctx).await?;
            self.progress.record_reward(&reward);
            info!(
                character = %character.name(),
                task = %code,
                completed = self.progress.completed,
                "Task completed"
            );
        }
        Ok(Transition::Next(TaskLoopState::Decide))
    }

    fn decide(&mut self, ctx: &Context, character: &Character) -> Transition<TaskLoopState> {
        if should_stop(self.stop.as_ref(), character, &self.progress) {
            return Transition::Done;
        }
        match &character.snapshot().task {
            None => Transition::Next(TaskLoopState::Accept),
            Some(task) if task.task_type != TaskType::Monsters => {
                info!(
                    character = %character.name(),
                    task = %task.code,
                    "Holding a non-monster task"
                );
                self.progress.unwinnable = true;
                Transition::Done
            }
            Some(_) if self.progress.consecutive_losses >= ctx.settings.consecutive_loss_limit => {
                self.progress.unwinnable = true;
                Transition::Done
            }
            Some(_) => Transition::Next(TaskLoopState::Hunt),
        }
    }

    async fn hunt(
        &mut self,
        ctx: &Context,
        character: &mut Character,
    ) -> Result<Transition<TaskLoopState>, TaskError> {
        let Some(monster) = character.snapshot().task.as_ref().map(|t| t.code.clone()) else {
            return Ok(Transition::Next(TaskLoopState::Decide));
        };
        let mut fight = Fight::new(monster.as_str()).max_fights(1).until(Box::new(|snapshot, _| {
            snapshot
                .task
                .as_ref()
                .is_none_or(|task| task.progress >= task.total)
        }));
        run(ctx, character, &mut fight).await?;

        let progress = fight.progress();
        self.progress.fights = self.progress.fights.saturating_add(progress.fights);
        if progress.fights == 0 {
            info!(
                character = %character.name(),
                monster = %monster,
                "Cannot fight task monster"
            );
            self.progress.unwinnable = true;
            return Ok(Transition::Done);
        }
        if progress.wins > 0 {
            self.progress.consecutive_losses = 0;
        } else {
            self.progress.consecutive_losses = self
                .progress
                .consecutive_losses
                .saturating_add(progress.losses);
        }
        Ok(Transition::Next(TaskLoopState::TurnIn))
    }
}

impl Task for TaskLoop {
    type State = TaskLoopState;

    fn describe(&self) -> String {
        "Doing tasks".to_owned()
    }

    fn start(&self) -> TaskLoopState {
        TaskLoopState::TurnIn
    }

    async fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: TaskLoopState,
    ) -> Result<Transition<TaskLoopState>, TaskError> {
        match state {
            TaskLoopState::TurnIn => self.turn_in(ctx, character).await,
            TaskLoopState::Decide => Ok(self.decide(ctx, character)),
            TaskLoopState::Accept => {
                character.move_to_tasks_master(ctx, TaskType::Monsters).await?;
                let task = character.accept_task(ctx).await?;
                info!(
                    character = %character.name(),
                    task = %task.code,
                    total = task.total,
                    "Task accepted"
                );
                Ok(Transition::Next(TaskLoopState::TurnIn))
            }
            TaskLoopState::Hunt => self.hunt(ctx, character).await,
        }
    }
}
