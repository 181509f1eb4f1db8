//! Host timer integration
//!
//! The timer-yielding drain loop hands control back to the host between
//! slices by scheduling its own continuation on a [`HostTimer`], the
//! environment's "run a callback after N milliseconds" primitive.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Deferred-callback primitive supplied by the embedding host.
pub trait HostTimer {
    /// Run `callback` once, roughly `delay` from now.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>);
}

/// Queue-backed timer for tests and polling hosts.
///
/// Callbacks accumulate in FIFO order until the host fires them explicitly;
/// no wall-clock time is involved.
#[derive(Default)]
pub struct ManualTimer {
    queue: RefCell<VecDeque<(Duration, Box<dyn FnOnce()>)>>,
}

impl ManualTimer {
    /// Create an empty timer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting to fire.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Fire the oldest callback, returning the delay it was scheduled with.
    ///
    /// The callback may schedule further callbacks.
    pub fn fire_next(&self) -> Option<Duration> {
        let (delay, callback) = self.queue.borrow_mut().pop_front()?;
        callback();
        Some(delay)
    }

    /// Fire every callback queued at the moment of the call.
    ///
    /// Callbacks scheduled while firing are left for a later call, so a loop
    /// that perpetually reschedules itself cannot spin here. Returns the
    /// number fired.
    pub fn fire_pending(&self) -> usize {
        let count = self.queue.borrow().len();
        for _ in 0..count {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some((_delay, callback)) => callback(),
                None => break,
            }
        }
        count
    }
}

impl HostTimer for ManualTimer {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back((delay, callback));
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimer")
            .field("pending", &self.pending())
            .finish()
    }
}
