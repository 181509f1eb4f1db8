//! Scheduler errors

use thiserror::Error;

use crate::scheduler::barrier::BarrierId;

/// Scheduler result
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler errors
///
/// Every variant is fatal: the drain loop that observes one records the
/// fatal state and terminates without retrying. Barriers already released
/// stay released and queued tasks are abandoned.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("{0} released twice")]
    BarrierAlreadyReleased(BarrierId),

    #[error("{0} released without a result")]
    EmptyRelease(BarrierId),

    #[error("Timer-yielding scheduler built without a host timer")]
    MissingTimer,

    #[error("Deadlock: ready queue is empty, unreleased barriers: {pending:?}")]
    Deadlock {
        /// Barriers created but never released, in creation order.
        pending: Vec<BarrierId>,
    },

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl SchedulerError {
    /// Whether this error is the blocking-wait starvation diagnostic.
    #[inline]
    pub fn is_deadlock(&self) -> bool {
        matches!(self, SchedulerError::Deadlock { .. })
    }
}
