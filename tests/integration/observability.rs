//! Observer hooks and deadlock diagnostics through the public API

use std::cell::Cell;
use std::rc::Rc;

use cps_runtime::{BarrierId, Scheduler, SchedulerError, SchedulerObserver, Value};

#[derive(Debug, Default)]
struct CountingObserver {
    created: Cell<usize>,
    released: Cell<usize>,
}

impl SchedulerObserver for CountingObserver {
    fn barrier_created(&self, _id: BarrierId) {
        self.created.set(self.created.get() + 1);
    }

    fn barrier_released(&self, _id: BarrierId) {
        self.released.set(self.released.get() + 1);
    }
}

#[test]
fn test_user_observer_sees_barrier_lifecycle() {
    let observer = Rc::new(CountingObserver::default());
    let sched = Scheduler::builder()
        .observer(observer.clone())
        .build()
        .unwrap();

    let barrier = sched.spawn(|_void, k| {
        k.invoke_one(Value::new(1i64))?;
        Ok(Value::void())
    });
    assert_eq!(observer.created.get(), 1);
    assert_eq!(observer.released.get(), 0);

    sched.blocking_wait(&barrier).unwrap();
    assert_eq!(observer.created.get(), 1);
    assert_eq!(observer.released.get(), 1);
    assert!(sched.outstanding_barriers().is_empty());
}

#[test]
fn test_deadlock_diagnostic_names_the_culprits() {
    let sched = Scheduler::new();

    // A spawned body that drops its continuation: its barrier can never
    // release.
    let stuck = sched.spawn(|_void, _k| Ok(Value::void()));
    let err = sched.blocking_wait(&stuck).unwrap_err();
    assert!(err.is_deadlock());

    match err {
        SchedulerError::Deadlock { pending } => {
            assert_eq!(pending, vec![stuck.id()]);
        }
        other => panic!("expected deadlock, got {other:?}"),
    }

    // The message is usable as a host-side diagnostic.
    let rendered = sched
        .outstanding_barriers()
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    assert!(rendered.contains(&stuck.id().to_string()));
}

#[test]
fn test_released_barriers_leave_the_outstanding_set() {
    let sched = Scheduler::new();
    let a = sched.new_barrier();
    let b = sched.new_barrier();
    assert_eq!(sched.outstanding_barriers(), vec![a.id(), b.id()]);

    a.release(Value::void()).unwrap();
    assert_eq!(sched.outstanding_barriers(), vec![b.id()]);

    b.release(Value::void()).unwrap();
    assert!(sched.outstanding_barriers().is_empty());
}
