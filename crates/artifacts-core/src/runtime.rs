//! State-machine runtime.
//!
//! A multi-step goal is a [`Task`]: a value holding the goal's parameters
//! and accumulated progress, plus an enum of states and a transition
//! function. [`run`] drives a task one transition at a time:
//!
//! 1. check the shutdown signal, ending the run with
//!    [`TaskError::Cancelled`] if it fired,
//! 2. call [`Task::step`] with the current state,
//! 3. continue with the returned state, or stop on [`Transition::Done`] or
//!    an error.
//!
//! Tasks that need another task's result run it inline with [`run`]. The
//! recursive ones (collecting an item that needs collecting its inputs)
//! go through a boxed future so the future type stays finite.

use std::fmt::Debug;
use std::future::Future;

use artifacts_types::{CharacterSnapshot, RunId};
use tracing::debug;

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;

/// What a step asks the runtime to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<S> {
    /// Continue with this state.
    Next(S),
    /// The task is finished.
    Done,
}

/// Caller-supplied early exit, checked by a task at its loop head.
///
/// Receives the character's latest snapshot and the task's progress so far.
pub type StopFn<P> = Box<dyn Fn(&CharacterSnapshot, &P) -> bool + Send + Sync>;

/// Evaluate an optional stop predicate.
pub fn should_stop<P>(stop: Option<&StopFn<P>>, character: &Character, progress: &P) -> bool {
    stop.is_some_and(|f| f(character.snapshot(), progress))
}

/// A multi-step goal driven by [`run`].
pub trait Task: Send {
    /// The task's states.
    type State: Send + Debug;

    /// Short description pushed onto the character's activity stack.
    fn describe(&self) -> String;

    /// State the task starts in.
    fn start(&self) -> Self::State;

    /// Perform one transition.
    fn step(
        &mut self,
        ctx: &Context,
        character: &mut Character,
        state: Self::State,
    ) -> impl Future<Output = Result<Transition<Self::State>, TaskError>> + Send;
}

/// Drive a task until it finishes, fails, or shutdown is requested.
pub async fn run<T: Task>(
    ctx: &Context,
    character: &mut Character,
    task: &mut T,
) -> Result<(), TaskError> {
    let run_id = RunId::new();
    let description = task.describe();
    debug!(
        run_id = %run_id,
        character = %character.name(),
        task = %description,
        "Task started"
    );
    character.push_activity(ctx, description);

    let result = drive(ctx, character, task, run_id).await;

    character.pop_activity(ctx);
    match &result {
        Ok(()) => debug!(run_id = %run_id, character = %character.name(), "Task finished"),
        Err(error) => debug!(
            run_id = %run_id,
            character = %character.name(),
            error = %error,
            "Task failed"
        ),
    }
    result
}

async fn drive<T: Task>(
    ctx: &Context,
    character: &mut Character,
    task: &mut T,
    run_id: RunId,
) -> Result<(), TaskError> {
    let mut state = task.start();
    loop {
        if ctx.shutdown.is_requested() {
            return Err(TaskError::Cancelled);
        }
        debug!(run_id = %run_id, character = %character.name(), state = ?state, "Step");
        match task.step(ctx, character, state).await? {
            Transition::Next(next) => state = next,
            Transition::Done => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use artifacts_bank::Bank;
    use artifacts_catalog::Catalog;
    use artifacts_client::{ActionBackend, SimulatedConfig, SimulatedServer};

    use super::*;
    use crate::config::TaskSettings;

    #[derive(Debug)]
    enum Count {
        Up(u32),
    }

    struct Counter {
        limit: u32,
        seen: Vec<u32>,
    }

    impl Task for Counter {
        type State = Count;

        fn describe(&self) -> String {
            format!("Count to {}", self.limit)
        }

        fn start(&self) -> Count {
            Count::Up(0)
        }

        async fn step(
            &mut self,
            _ctx: &Context,
            _character: &mut Character,
            state: Count,
        ) -> Result<Transition<Count>, TaskError> {
            let Count::Up(n) = state;
            self.seen.push(n);
            if n >= self.limit {
                return Ok(Transition::Done);
            }
            Ok(Transition::Next(Count::Up(n.saturating_add(1))))
        }
    }

    fn context() -> Context {
        let catalog = Arc::new(Catalog::default());
        let server = SimulatedServer::new(Arc::clone(&catalog), &SimulatedConfig::default());
        Context::new(
            catalog,
            Arc::new(ActionBackend::Simulated(server)),
            Arc::new(Bank::new()),
            TaskSettings::default(),
        )
    }

    #[tokio::test]
    async fn run_steps_until_done_and_restores_activity() {
        let ctx = context();
        let mut character = Character::new(CharacterSnapshot::new("alice"));
        let mut task = Counter {
            limit: 3,
            seen: Vec::new(),
        };
        let result = run(&ctx, &mut character, &mut task).await;
        assert!(result.is_ok());
        assert_eq!(task.seen, vec![0, 1, 2, 3]);
        assert!(character.activity().is_empty());
        let published = ctx.roster.get("alice").map(|u| u.activity);
        assert_eq!(published, Some(Vec::new()));
    }

    #[tokio::test]
    async fn shutdown_cancels_before_the_first_step() {
        let ctx = context();
        ctx.shutdown.request();
        let mut character = Character::new(CharacterSnapshot::new("alice"));
        let mut task = Counter {
            limit: 3,
            seen: Vec::new(),
        };
        let result = run(&ctx, &mut character, &mut task).await;
        assert!(matches!(result, Err(TaskError::Cancelled)));
        assert!(task.seen.is_empty());
    }
}
