//! CPS scheduler runtime
//!
//! Execution runtime for programs produced by a continuation-passing-style
//! transformation. Computations are split into tasks that run to completion
//! without blocking, communicate results through one-shot barriers, and
//! resume further work by handing a result to an explicit continuation. A
//! single cooperative drain loop executes the ready queue in FIFO order.
//!
//! # Example
//!
//! ```
//! use cps_runtime::{Scheduler, Value};
//!
//! let sched = Scheduler::new();
//! let barrier = sched.spawn(|_void, k| {
//!     k.invoke_one(Value::new(42i64))?;
//!     Ok(Value::void())
//! });
//! let result = sched.blocking_wait(&barrier)?;
//! assert_eq!(result.downcast_ref::<i64>(), Some(&42));
//! # Ok::<(), cps_runtime::SchedulerError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/cps-runtime")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod errors;
pub mod observe;
pub mod scheduler;
pub mod value;

// Utility modules
pub mod util;

// Re-exports
pub use errors::{SchedulerError, SchedulerResult};
pub use observe::{BarrierLedger, SchedulerObserver};
pub use scheduler::{
    Barrier, BarrierId, CallDirect, Continuation, ContinuationOptions, DrainStatus, ExecutionMode,
    HostTimer, ManualTimer, Scheduler, SchedulerBuilder, SchedulerConfig, Task, TaskKind,
    Trampoline,
};
pub use value::Value;

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
