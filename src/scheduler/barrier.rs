//! Synchronization barriers
//!
//! A barrier is a one-shot synchronization cell: it holds either "pending"
//! with a list of waiting continuations, or "released" with a final result.
//! Barriers bridge CPS code and blocking callers: CPS code registers
//! continuations through [`Barrier::wait`], the producing task hands its
//! result to [`Barrier::release`] exactly once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::errors::{SchedulerError, SchedulerResult};
use crate::observe::SchedulerObserver;
use crate::value::Value;

use super::cont::Continuation;

/// Correlation token for a barrier, used in logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarrierId(pub u64);

impl BarrierId {
    /// Returns the inner value.
    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Barrier({})", self.0)
    }
}

/// Generator for unique barrier ids.
#[derive(Debug, Default)]
pub struct BarrierIdGenerator {
    next_id: u64,
}

impl BarrierIdGenerator {
    /// Create a new generator.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next barrier id.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> BarrierId {
        let id = self.next_id;
        self.next_id += 1;
        BarrierId(id)
    }
}

/// Barrier state machine: `Pending -> Released`, terminal.
enum BarrierState {
    /// Continuations registered before release, in wait order.
    Pending {
        waiters: SmallVec<[Continuation; 2]>,
    },
    /// The final result. Never changes once set.
    Released { result: Value },
}

struct BarrierInner {
    id: BarrierId,
    state: RefCell<BarrierState>,
    observer: Option<Rc<dyn SchedulerObserver>>,
}

/// A one-shot synchronization cell.
///
/// Cloning shares the cell; a barrier is never reused.
#[derive(Clone)]
pub struct Barrier {
    inner: Rc<BarrierInner>,
}

impl Barrier {
    /// Create a detached barrier with no observer.
    ///
    /// Barriers minted through [`Scheduler::new_barrier`] participate in the
    /// scheduler's deadlock diagnostics; detached barriers do not.
    ///
    /// [`Scheduler::new_barrier`]: super::Scheduler::new_barrier
    pub fn new(id: BarrierId) -> Self {
        Self::with_observer(id, None)
    }

    pub(crate) fn with_observer(id: BarrierId, observer: Option<Rc<dyn SchedulerObserver>>) -> Self {
        trace!("creating {id}");
        if let Some(observer) = &observer {
            observer.barrier_created(id);
        }
        Self {
            inner: Rc::new(BarrierInner {
                id,
                state: RefCell::new(BarrierState::Pending {
                    waiters: SmallVec::new(),
                }),
                observer,
            }),
        }
    }

    /// The barrier's correlation id.
    #[inline]
    pub fn id(&self) -> BarrierId {
        self.inner.id
    }

    /// Whether the barrier has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        matches!(&*self.inner.state.borrow(), BarrierState::Released { .. })
    }

    /// The stored result, if released.
    pub fn result(&self) -> Option<Value> {
        match &*self.inner.state.borrow() {
            BarrierState::Released { result } => Some(result.clone()),
            BarrierState::Pending { .. } => None,
        }
    }

    /// Number of continuations currently waiting.
    pub fn waiter_count(&self) -> usize {
        match &*self.inner.state.borrow() {
            BarrierState::Pending { waiters } => waiters.len(),
            BarrierState::Released { .. } => 0,
        }
    }

    /// Register a continuation waiting for this barrier.
    ///
    /// If the barrier is already released the continuation is invoked
    /// immediately and synchronously with the stored result; no task is
    /// queued. Otherwise it waits until [`Barrier::release`].
    pub fn wait(&self, k: Continuation) -> SchedulerResult<()> {
        let result = {
            let mut state = self.inner.state.borrow_mut();
            match &mut *state {
                BarrierState::Pending { waiters } => {
                    waiters.push(k);
                    return Ok(());
                }
                BarrierState::Released { result } => result.clone(),
            }
        };
        trace!("late wait on {}, invoking immediately", self.id());
        k.invoke_one(result)
    }

    /// Release the barrier.
    ///
    /// Stores `result` and invokes every waiter with it, in the order they
    /// called [`Barrier::wait`]. Waiter invocation is synchronous; tasks a
    /// waiter pushes land on the ready queue for later turns. Releasing a
    /// barrier twice is a fatal contract violation.
    pub fn release(&self, result: Value) -> SchedulerResult<()> {
        let waiters = {
            let mut state = self.inner.state.borrow_mut();
            match &mut *state {
                BarrierState::Released { .. } => {
                    return Err(SchedulerError::BarrierAlreadyReleased(self.id()));
                }
                BarrierState::Pending { waiters } => {
                    let waiters = std::mem::take(waiters);
                    // Move to the terminal state before running waiters, so a
                    // waiter that re-enters this barrier observes it released.
                    *state = BarrierState::Released {
                        result: result.clone(),
                    };
                    waiters
                }
            }
        };
        debug!("releasing {} to {} waiter(s)", self.id(), waiters.len());
        if let Some(observer) = &self.inner.observer {
            observer.barrier_released(self.id());
        }
        for k in waiters {
            k.invoke_one(result.clone())?;
        }
        Ok(())
    }

    /// A continuation that releases this barrier with its first argument.
    ///
    /// Invoking it with an empty argument list is the fatal
    /// released-without-a-result contract violation.
    pub fn release_continuation(&self) -> Continuation {
        let barrier = self.clone();
        Continuation::new(move |_context, args| {
            let result = args
                .first()
                .cloned()
                .ok_or(SchedulerError::EmptyRelease(barrier.id()))?;
            barrier.release(result)
        })
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("id", &self.id())
            .field("released", &self.is_released())
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
