//! Scheduler observability hooks
//!
//! Barrier lifecycle events are reported through the [`SchedulerObserver`]
//! callback rather than mutable side tables interleaved with the hot path.
//! The scheduler installs a [`BarrierLedger`] through the same hook to back
//! the deadlock diagnostic; embedders may add their own observer on top.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexSet;

use crate::scheduler::barrier::BarrierId;

/// Callbacks invoked on barrier lifecycle events.
///
/// Observers are diagnostics only; they must not push tasks or release
/// barriers.
pub trait SchedulerObserver {
    /// A barrier was minted.
    fn barrier_created(&self, id: BarrierId);

    /// A barrier was released.
    fn barrier_released(&self, id: BarrierId);
}

/// Tracks created-but-unreleased barriers.
///
/// Insertion order is preserved so diagnostics list barriers in the order
/// they were created.
#[derive(Debug, Default)]
pub struct BarrierLedger {
    outstanding: RefCell<IndexSet<BarrierId>>,
    released: Cell<usize>,
}

impl BarrierLedger {
    /// Create an empty ledger.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Barriers created but not yet released, in creation order.
    pub fn outstanding(&self) -> Vec<BarrierId> {
        self.outstanding.borrow().iter().copied().collect()
    }

    /// Number of barriers still pending.
    #[inline]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.borrow().len()
    }

    /// Number of barriers released so far.
    #[inline]
    pub fn released_count(&self) -> usize {
        self.released.get()
    }
}

impl SchedulerObserver for BarrierLedger {
    fn barrier_created(&self, id: BarrierId) {
        self.outstanding.borrow_mut().insert(id);
    }

    fn barrier_released(&self, id: BarrierId) {
        self.outstanding.borrow_mut().shift_remove(&id);
        self.released.set(self.released.get() + 1);
    }
}

/// Forwards barrier events to the scheduler's ledger and, when installed,
/// an embedder-supplied observer.
pub(crate) struct ObserverFanout {
    ledger: Rc<BarrierLedger>,
    user: Option<Rc<dyn SchedulerObserver>>,
}

impl ObserverFanout {
    pub(crate) fn new(ledger: Rc<BarrierLedger>, user: Option<Rc<dyn SchedulerObserver>>) -> Self {
        Self { ledger, user }
    }
}

impl SchedulerObserver for ObserverFanout {
    fn barrier_created(&self, id: BarrierId) {
        self.ledger.barrier_created(id);
        if let Some(user) = &self.user {
            user.barrier_created(id);
        }
    }

    fn barrier_released(&self, id: BarrierId) {
        self.ledger.barrier_released(id);
        if let Some(user) = &self.user {
            user.barrier_released(id);
        }
    }
}
