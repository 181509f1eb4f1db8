//! Ready queue
//!
//! A single FIFO of tasks awaiting execution. `push` enqueues at the tail,
//! the drain loop dequeues at the head; no priority, no deduplication.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use super::task::Task;

/// FIFO of tasks awaiting execution.
///
/// Single-threaded; interior mutability only so continuations running inside
/// the drain loop can re-enter `push`.
#[derive(Default)]
pub struct ReadyQueue {
    inner: RefCell<VecDeque<Task>>,
}

impl ReadyQueue {
    /// Create a new empty queue.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a task at the tail.
    #[inline]
    pub fn push(&self, task: Task) {
        self.inner.borrow_mut().push_back(task);
    }

    /// Dequeue the head task.
    #[inline]
    pub fn pop(&self) -> Option<Task> {
        self.inner.borrow_mut().pop_front()
    }

    /// Number of queued tasks.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Check if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl fmt::Debug for ReadyQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyQueue")
            .field("len", &self.len())
            .finish()
    }
}
