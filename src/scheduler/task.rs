//! Task variants
//!
//! A task is a unit of deferred work on the ready queue. The four variants
//! form a closed union; each knows how to produce a result and where to
//! deliver it.

use std::fmt;

use crate::errors::SchedulerResult;
use crate::value::Value;

use super::barrier::Barrier;
use super::cont::Continuation;

/// A deferred computation taking no arguments.
pub type ThunkFn = Box<dyn FnOnce() -> SchedulerResult<Value>>;

/// A deferred application of a function to a stored argument list.
pub type ApplyFn = Box<dyn FnOnce(Vec<Value>) -> SchedulerResult<Value>>;

/// A spawned CPS body: receives the unit placeholder and the continuation
/// that releases the task's barrier.
pub type SpawnFn = Box<dyn FnOnce(Value, Continuation) -> SchedulerResult<Value>>;

/// Task discriminant, for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Thunk,
    Application,
    Return,
    Spawn,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Thunk => "thunk",
            TaskKind::Application => "application",
            TaskKind::Return => "return",
            TaskKind::Spawn => "spawn",
        };
        f.write_str(name)
    }
}

/// A unit of work placed on the ready queue.
///
/// Executing a task consumes it, so a task runs exactly once and cannot be
/// queued twice.
pub enum Task {
    /// Run a thunk, release the barrier with its result.
    Thunk { thunk: ThunkFn, barrier: Barrier },
    /// Apply a function to a stored argument list, release the barrier with
    /// the result.
    Application {
        fun: ApplyFn,
        args: Vec<Value>,
        barrier: Barrier,
    },
    /// Deliver stored arguments to a continuation. Owns no barrier; the
    /// continuation itself may release one.
    Return {
        cont: Continuation,
        args: Vec<Value>,
    },
    /// Invoke a CPS body with the continuation that releases the barrier.
    /// Completion of the body does not release the barrier; only the body
    /// invoking its continuation does.
    Spawn { body: SpawnFn, barrier: Barrier },
}

impl Task {
    /// Task around a 0-argument function.
    pub fn thunk<F>(barrier: Barrier, thunk: F) -> Self
    where
        F: FnOnce() -> SchedulerResult<Value> + 'static,
    {
        Task::Thunk {
            thunk: Box::new(thunk),
            barrier,
        }
    }

    /// Task around a function and its arguments.
    pub fn application<F>(barrier: Barrier, fun: F, args: Vec<Value>) -> Self
    where
        F: FnOnce(Vec<Value>) -> SchedulerResult<Value> + 'static,
    {
        Task::Application {
            fun: Box::new(fun),
            args,
            barrier,
        }
    }

    /// Task delivering arguments to a continuation on a future turn.
    pub fn return_to(cont: Continuation, args: Vec<Value>) -> Self {
        Task::Return { cont, args }
    }

    /// Task around a spawned CPS body.
    pub fn spawn<F>(barrier: Barrier, body: F) -> Self
    where
        F: FnOnce(Value, Continuation) -> SchedulerResult<Value> + 'static,
    {
        Task::Spawn {
            body: Box::new(body),
            barrier,
        }
    }

    /// The variant discriminant.
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Thunk { .. } => TaskKind::Thunk,
            Task::Application { .. } => TaskKind::Application,
            Task::Return { .. } => TaskKind::Return,
            Task::Spawn { .. } => TaskKind::Spawn,
        }
    }

    /// The barrier this task releases, if it owns one.
    pub fn barrier(&self) -> Option<&Barrier> {
        match self {
            Task::Thunk { barrier, .. }
            | Task::Application { barrier, .. }
            | Task::Spawn { barrier, .. } => Some(barrier),
            Task::Return { .. } => None,
        }
    }

    /// Execute the task.
    ///
    /// Errors raised by the body propagate uncaught; the drain loop treats
    /// them as fatal.
    pub fn execute(self) -> SchedulerResult<()> {
        match self {
            Task::Thunk { thunk, barrier } => {
                let result = thunk()?;
                barrier.release(result)
            }
            Task::Application { fun, args, barrier } => {
                let result = fun(args)?;
                barrier.release(result)
            }
            Task::Return { cont, args } => cont.invoke_many(&args),
            Task::Spawn { body, barrier } => {
                let k = barrier.release_continuation();
                // The body's return value is not the result; the barrier is
                // released only if the body invokes k.
                let _ = body(Value::void(), k)?;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Task");
        s.field("kind", &self.kind());
        if let Some(barrier) = self.barrier() {
            s.field("barrier", &barrier.id());
        }
        s.finish()
    }
}
