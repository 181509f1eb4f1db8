//! Continuations
//!
//! A continuation is "the rest of the computation": a callback that receives
//! the result of a task once it is available. Generated code hands a
//! continuation to every CPS operation instead of waiting for a return value.

use std::fmt;
use std::rc::Rc;
use std::slice;

use crate::errors::SchedulerResult;
use crate::value::Value;

/// Payload signature: an optional receiver context followed by the
/// positional arguments.
pub type ContinuationFn = dyn Fn(Option<&Value>, &[Value]) -> SchedulerResult<()>;

/// Reserved continuation options.
///
/// A forward-compatibility placeholder; it cannot carry state yet.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct ContinuationOptions {}

/// A one-argument callback plus an optional receiver context.
///
/// Immutable after construction. Cloning shares the payload. The runtime
/// does not prevent re-invocation, but callers must not rely on a
/// continuation being invoked more than once.
#[derive(Clone)]
pub struct Continuation {
    payload: Rc<ContinuationFn>,
    context: Option<Value>,
}

impl Continuation {
    /// Construct a continuation with no receiver context.
    pub fn new<F>(payload: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> SchedulerResult<()> + 'static,
    {
        Self {
            payload: Rc::new(payload),
            context: None,
        }
    }

    /// Construct a continuation whose payload is bound to a receiver.
    pub fn with_context<F>(payload: F, context: Value) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> SchedulerResult<()> + 'static,
    {
        Self {
            payload: Rc::new(payload),
            context: Some(context),
        }
    }

    /// Construct a continuation with explicit options.
    pub fn with_options<F>(payload: F, context: Option<Value>, _options: ContinuationOptions) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> SchedulerResult<()> + 'static,
    {
        Self {
            payload: Rc::new(payload),
            context,
        }
    }

    /// Wrap a single-value callback as a continuation payload.
    ///
    /// The callback receives the first argument, or the unit placeholder if
    /// the continuation is invoked with an empty argument list.
    pub fn on_result<F>(callback: F) -> Self
    where
        F: Fn(Value) -> SchedulerResult<()> + 'static,
    {
        Self::new(move |_context, args| {
            let value = args.first().cloned().unwrap_or_else(Value::void);
            callback(value)
        })
    }

    /// The receiver context, if any.
    #[inline]
    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Deliver a single value.
    ///
    /// Takes the direct path when no receiver needs binding.
    pub fn invoke_one(&self, value: Value) -> SchedulerResult<()> {
        if self.context.is_none() {
            return (self.payload)(None, slice::from_ref(&value));
        }
        self.invoke_many(slice::from_ref(&value))
    }

    /// Deliver a positional argument list, context bound if present.
    pub fn invoke_many(&self, values: &[Value]) -> SchedulerResult<()> {
        (self.payload)(self.context.as_ref(), values)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
