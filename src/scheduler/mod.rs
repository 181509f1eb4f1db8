//! CPS task scheduler
//!
//! The execution core for programs produced by a continuation-passing-style
//! transformation: a single FIFO ready queue, a drain loop that is its only
//! consumer, and the entry points generated code uses to inject work and
//! retrieve results.
//!
//! # Architecture
//!
//! - [`Continuation`](cont::Continuation) - "the rest of the computation"
//! - [`Barrier`](barrier::Barrier) - one-shot synchronization cell
//! - [`Task`](task::Task) - the four queueable units of work
//! - [`ReadyQueue`](queue::ReadyQueue) - the FIFO of pending tasks
//! - [`Trampoline`](trampoline::Trampoline) - stack-depth protection seam
//! - [`HostTimer`](timer::HostTimer) - deferred-callback primitive for the
//!   timer-yielding loop
//! - [`Scheduler`] - the drain loop, blocking-wait bridge and entry points
//!
//! Scheduling is strictly single-threaded and cooperative: concurrency is
//! modeled entirely by interleaving tasks, never by parallel execution.
//! Tasks run in FIFO push order; a barrier notifies its waiters in FIFO wait
//! order, synchronously inside `release`.

pub mod barrier;
pub mod cont;
pub mod queue;
pub mod task;
pub mod timer;
pub mod trampoline;

pub use barrier::{Barrier, BarrierId, BarrierIdGenerator};
pub use cont::{Continuation, ContinuationFn, ContinuationOptions};
pub use queue::ReadyQueue;
pub use task::{ApplyFn, SpawnFn, Task, TaskKind, ThunkFn};
pub use timer::{HostTimer, ManualTimer};
pub use trampoline::{CallDirect, TaskCall, Trampoline};

#[cfg(test)]
mod tests;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::errors::{SchedulerError, SchedulerResult};
use crate::observe::{BarrierLedger, ObserverFanout, SchedulerObserver};
use crate::value::Value;

/// Which drain-loop strategy the scheduler runs.
///
/// Selected once at construction and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Spin until the queue is idle. For headless/batch hosts.
    #[default]
    RunToCompletion,
    /// Execute bounded slices, rescheduling on the host timer between them.
    /// For hosts whose event loop must keep running.
    TimerYielding,
}

/// Why a [`Scheduler::drain`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// The ready queue is empty.
    Idle,
    /// Control was handed back to the host timer (timer-yielding mode).
    Yielded,
}

/// Scheduler tunables.
///
/// The delay values are tunable constants, not semantic guarantees.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Drain-loop strategy.
    pub mode: ExecutionMode,
    /// Tasks executed per slice before yielding (timer-yielding mode).
    pub tasks_per_slice: usize,
    /// Reschedule delay while work remains.
    pub busy_delay: Duration,
    /// Reschedule delay once the queue is empty.
    pub idle_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::RunToCompletion,
            tasks_per_slice: 100,
            busy_delay: Duration::from_millis(10),
            idle_delay: Duration::from_millis(50),
        }
    }
}

struct SchedulerInner {
    config: SchedulerConfig,
    queue: ReadyQueue,
    trampoline: Rc<dyn Trampoline>,
    timer: Option<Rc<dyn HostTimer>>,
    ledger: Rc<BarrierLedger>,
    observer: Rc<ObserverFanout>,
    barrier_ids: RefCell<BarrierIdGenerator>,
    fatal: Cell<bool>,
}

/// The CPS scheduler: one ready queue, one logical drain loop.
///
/// `Scheduler` is a cheap-clone handle; continuations capture a clone and
/// re-enter [`Scheduler::push`] from inside task execution. It is not
/// `Send`: the whole model is single-threaded and cooperative.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    /// A run-to-completion scheduler with the default configuration.
    pub fn new() -> Self {
        Self::from_parts(SchedulerConfig::default(), Rc::new(CallDirect), None, None)
    }

    /// Start building a scheduler with injected collaborators.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    fn from_parts(
        config: SchedulerConfig,
        trampoline: Rc<dyn Trampoline>,
        timer: Option<Rc<dyn HostTimer>>,
        user_observer: Option<Rc<dyn SchedulerObserver>>,
    ) -> Self {
        let ledger = Rc::new(BarrierLedger::new());
        let observer = Rc::new(ObserverFanout::new(ledger.clone(), user_observer));
        Self {
            inner: Rc::new(SchedulerInner {
                config,
                queue: ReadyQueue::new(),
                trampoline,
                timer,
                ledger,
                observer,
                barrier_ids: RefCell::new(BarrierIdGenerator::new()),
                fatal: Cell::new(false),
            }),
        }
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// The drain-loop strategy this scheduler was built with.
    #[inline]
    pub fn mode(&self) -> ExecutionMode {
        self.inner.config.mode
    }

    /// Whether a drain loop terminated on a fatal error.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.inner.fatal.get()
    }

    /// Number of tasks currently on the ready queue.
    #[inline]
    pub fn pending_tasks(&self) -> usize {
        self.inner.queue.len()
    }

    /// Barriers created through this scheduler but not yet released, in
    /// creation order.
    pub fn outstanding_barriers(&self) -> Vec<BarrierId> {
        self.inner.ledger.outstanding()
    }

    /// Mint a barrier participating in this scheduler's diagnostics.
    pub fn new_barrier(&self) -> Barrier {
        let id = self.inner.barrier_ids.borrow_mut().next();
        let observer: Rc<dyn SchedulerObserver> = self.inner.observer.clone();
        Barrier::with_observer(id, Some(observer))
    }

    /// Schedule a task for future execution.
    pub fn push(&self, task: Task) {
        trace!("push {} task", task.kind());
        self.inner.queue.push(task);
    }

    /// Run one task through the trampoline collaborator.
    fn execute_one(&self, task: Task) -> SchedulerResult<()> {
        self.inner
            .trampoline
            .call(Box::new(move || task.execute()))
    }

    fn record_fatal(&self, err: &SchedulerError) {
        self.inner.fatal.set(true);
        error!("scheduling stopped on fatal error: {err}");
    }

    /// The scheduling loop.
    ///
    /// Run-to-completion mode pops and executes tasks until the queue is
    /// empty (`Idle`) or a task errors (the error propagates, the fatal flag
    /// is set, and remaining tasks are abandoned). Timer-yielding mode
    /// executes at most [`SchedulerConfig::tasks_per_slice`] tasks, schedules
    /// the next `drain` on the host timer and returns `Yielded`.
    pub fn drain(&self) -> SchedulerResult<DrainStatus> {
        match self.inner.config.mode {
            ExecutionMode::RunToCompletion => self.drain_to_idle(),
            ExecutionMode::TimerYielding => self.drain_slice(),
        }
    }

    fn drain_to_idle(&self) -> SchedulerResult<DrainStatus> {
        trace!("entering drain loop");
        loop {
            let Some(task) = self.inner.queue.pop() else {
                trace!("drain loop idle");
                return Ok(DrainStatus::Idle);
            };
            if let Err(err) = self.execute_one(task) {
                self.record_fatal(&err);
                return Err(err);
            }
        }
    }

    fn drain_slice(&self) -> SchedulerResult<DrainStatus> {
        trace!("entering drain slice");
        for _ in 0..self.inner.config.tasks_per_slice {
            let Some(task) = self.inner.queue.pop() else {
                break;
            };
            if let Err(err) = self.execute_one(task) {
                self.record_fatal(&err);
                return Err(err);
            }
        }
        let delay = if self.inner.queue.is_empty() {
            self.inner.config.idle_delay
        } else {
            self.inner.config.busy_delay
        };
        let timer = self
            .inner
            .timer
            .clone()
            .ok_or(SchedulerError::MissingTimer)?;
        let sched = self.clone();
        timer.schedule(
            delay,
            Box::new(move || {
                if sched.is_fatal() {
                    return;
                }
                // Errors cannot propagate out of a timer callback; the fatal
                // flag and log carry the diagnosis.
                let _ = sched.drain();
            }),
        );
        trace!("drain slice yielded, rescheduled in {delay:?}");
        Ok(DrainStatus::Yielded)
    }

    /// Deliver `value` to `k` on a future scheduler turn.
    ///
    /// This is how CPS code "calls back" without deepening the host call
    /// stack.
    pub fn return_(&self, k: Continuation, value: Value) {
        self.push(Task::return_to(k, vec![value]));
    }

    /// Apply `fun` to `(value, k)` on a future scheduler turn.
    ///
    /// Returns the application's barrier, released with `fun`'s own return
    /// value once the task runs.
    pub fn cps_apply<F>(&self, fun: F, value: Value, k: Continuation) -> Barrier
    where
        F: FnOnce(Value, Continuation) -> SchedulerResult<Value> + 'static,
    {
        let barrier = self.new_barrier();
        let apply = move |mut args: Vec<Value>| {
            let value = if args.is_empty() {
                Value::void()
            } else {
                args.remove(0)
            };
            fun(value, k)
        };
        self.push(Task::application(barrier.clone(), apply, vec![value]));
        barrier
    }

    /// Synchronously force progress until `barrier` releases.
    ///
    /// Pops and executes one task per iteration, through the same trampoline
    /// as [`Scheduler::drain`]. Never yields to the host timer, so it must
    /// not be called from inside a hosted event handler. If the queue
    /// empties while the barrier is still pending, fails with
    /// [`SchedulerError::Deadlock`] listing the outstanding barriers.
    pub fn blocking_wait(&self, barrier: &Barrier) -> SchedulerResult<Value> {
        trace!("blocking wait on {}", barrier.id());
        loop {
            if let Some(result) = barrier.result() {
                return Ok(result);
            }
            let Some(task) = self.inner.queue.pop() else {
                let err = SchedulerError::Deadlock {
                    pending: self.inner.ledger.outstanding(),
                };
                self.record_fatal(&err);
                return Err(err);
            };
            if let Err(err) = self.execute_one(task) {
                self.record_fatal(&err);
                return Err(err);
            }
        }
    }

    /// Launch an asynchronous unit of work; returns the handle to await its
    /// result.
    ///
    /// `body` receives the unit placeholder and a continuation `k`; the
    /// returned barrier is released only when `body` invokes `k`.
    pub fn spawn<F>(&self, body: F) -> Barrier
    where
        F: FnOnce(Value, Continuation) -> SchedulerResult<Value> + 'static,
    {
        let barrier = self.new_barrier();
        debug!("spawn task for {}", barrier.id());
        self.push(Task::spawn(barrier.clone(), body));
        barrier
    }

    /// The conventional top-level entry; equivalent to [`Scheduler::spawn`].
    pub fn main<F>(&self, body: F) -> Barrier
    where
        F: FnOnce(Value, Continuation) -> SchedulerResult<Value> + 'static,
    {
        self.spawn(body)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("mode", &self.mode())
            .field("pending_tasks", &self.pending_tasks())
            .field("fatal", &self.is_fatal())
            .finish()
    }
}

/// Builder for a [`Scheduler`] with injected collaborators.
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    trampoline: Option<Rc<dyn Trampoline>>,
    timer: Option<Rc<dyn HostTimer>>,
    observer: Option<Rc<dyn SchedulerObserver>>,
}

impl SchedulerBuilder {
    /// Create a builder with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the drain-loop strategy.
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Inject the stack-depth protection collaborator.
    pub fn trampoline(mut self, trampoline: Rc<dyn Trampoline>) -> Self {
        self.trampoline = Some(trampoline);
        self
    }

    /// Inject the host timer primitive (required for timer-yielding mode).
    pub fn timer(mut self, timer: Rc<dyn HostTimer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Install an observer for barrier lifecycle events.
    pub fn observer(mut self, observer: Rc<dyn SchedulerObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the scheduler.
    ///
    /// Fails with [`SchedulerError::MissingTimer`] if timer-yielding mode
    /// was selected without a host timer.
    pub fn build(self) -> SchedulerResult<Scheduler> {
        if self.config.mode == ExecutionMode::TimerYielding && self.timer.is_none() {
            return Err(SchedulerError::MissingTimer);
        }
        let trampoline = self
            .trampoline
            .unwrap_or_else(|| Rc::new(CallDirect) as Rc<dyn Trampoline>);
        Ok(Scheduler::from_parts(
            self.config,
            trampoline,
            self.timer,
            self.observer,
        ))
    }
}

impl fmt::Debug for SchedulerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerBuilder")
            .field("config", &self.config)
            .field("trampoline", &self.trampoline.is_some())
            .field("timer", &self.timer.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
