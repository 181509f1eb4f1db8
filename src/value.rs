//! Dynamically typed result values
//!
//! Tasks, barriers and continuations exchange host values of arbitrary type.
//! [`Value`] is a cheap-to-clone shared cell so a barrier can fan a single
//! result out to every waiter without copying the payload.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A shared, dynamically typed value.
///
/// Values are immutable once constructed. Cloning shares the underlying
/// allocation.
#[derive(Clone)]
pub struct Value {
    inner: Rc<dyn Any>,
}

impl Value {
    /// Wrap a host value.
    ///
    /// Note: wrapping a `Value` in `Value::new` nests it; clone the existing
    /// handle instead.
    #[inline]
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
        }
    }

    /// The unit placeholder handed to spawned bodies.
    #[inline]
    pub fn void() -> Self {
        Self::new(())
    }

    /// Check whether this is the unit placeholder.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.inner.downcast_ref::<()>().is_some()
    }

    /// Borrow the inner value as `T`, if it has that type.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recover the shared inner value as `Rc<T>`, or give the handle back.
    pub fn downcast<T: 'static>(self) -> Result<Rc<T>, Value> {
        self.inner
            .downcast::<T>()
            .map_err(|inner| Value { inner })
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::void()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_void() {
            write!(f, "Value(void)")
        } else {
            write!(f, "Value(..)")
        }
    }
}
