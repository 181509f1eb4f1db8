//! Stack-depth protection seam
//!
//! Every task execution — in the drain loop and in the blocking-wait bridge —
//! routes through a [`Trampoline`], the host's "call with stack-depth
//! protection" collaborator. Hosts whose call stacks cannot absorb deeply
//! nested synchronous continuation chains substitute their own
//! implementation; [`CallDirect`] is the default.

use crate::errors::SchedulerResult;

/// A boxed task execution handed to the trampoline.
pub type TaskCall = Box<dyn FnOnce() -> SchedulerResult<()>>;

/// Executes one task body with whatever stack protection the host needs.
pub trait Trampoline {
    /// Run `task` to completion, stack-safely.
    fn call(&self, task: TaskCall) -> SchedulerResult<()>;
}

/// Direct invocation, no stack bookkeeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallDirect;

impl Trampoline for CallDirect {
    #[inline]
    fn call(&self, task: TaskCall) -> SchedulerResult<()> {
        task()
    }
}
