//! End-to-end CPS programs driven through the public API

use std::cell::RefCell;
use std::rc::Rc;

use cps_runtime::{
    Continuation, DrainStatus, Scheduler, SchedulerError, SchedulerResult, Value,
};

#[test]
fn test_round_trip_through_spawn() {
    let sched = Scheduler::new();
    let barrier = sched.spawn(|_void, k| {
        k.invoke_one(Value::new(42i64))?;
        Ok(Value::void())
    });

    let result = sched.blocking_wait(&barrier).unwrap();
    assert_eq!(result.downcast_ref::<i64>(), Some(&42));
}

/// One countdown step: hand `n - 1` back through the scheduler until zero,
/// then deliver to the final continuation. Every step is a fresh queue turn,
/// so the host stack stays flat no matter how large `n` is.
fn countdown(sched: Scheduler, n: u64, k: Continuation) -> SchedulerResult<()> {
    if n == 0 {
        return k.invoke_one(Value::new(0u64));
    }
    let next_sched = sched.clone();
    let next_k = k.clone();
    let step = Continuation::on_result(move |value| {
        let m = value.downcast_ref::<u64>().copied().unwrap_or(0);
        countdown(next_sched.clone(), m, next_k.clone())
    });
    sched.return_(step, Value::new(n - 1));
    Ok(())
}

#[test]
fn test_deep_countdown_runs_entirely_on_the_queue() {
    let sched = Scheduler::new();
    let inner = sched.clone();
    let barrier = sched.main(move |_void, k| {
        countdown(inner.clone(), 10_000, k)?;
        Ok(Value::void())
    });

    let result = sched.blocking_wait(&barrier).unwrap();
    assert_eq!(result.downcast_ref::<u64>(), Some(&0));
}

#[test]
fn test_barrier_fans_result_out_to_every_waiter() {
    let sched = Scheduler::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let barrier = sched.spawn(|_void, k| {
        k.invoke_one(Value::new(7i64))?;
        Ok(Value::void())
    });

    for _ in 0..3 {
        let log = seen.clone();
        barrier
            .wait(Continuation::on_result(move |value| {
                log.borrow_mut()
                    .push(value.downcast_ref::<i64>().copied().unwrap_or(-1));
                Ok(())
            }))
            .unwrap();
    }

    sched.blocking_wait(&barrier).unwrap();
    assert_eq!(*seen.borrow(), vec![7, 7, 7]);
}

/// A CPS function in the generated-code shape: doubles its argument and
/// passes the result on.
fn double(value: Value, k: Continuation) -> SchedulerResult<Value> {
    let v = value.downcast_ref::<i64>().copied().unwrap_or(0);
    k.invoke_one(Value::new(v * 2))?;
    Ok(Value::void())
}

#[test]
fn test_chained_cps_applications() {
    let sched = Scheduler::new();
    let result = Rc::new(RefCell::new(None));

    let done_log = result.clone();
    let done = Continuation::on_result(move |value| {
        *done_log.borrow_mut() = value.downcast_ref::<i64>().copied();
        Ok(())
    });

    // double(double(4)) delivered turn by turn, never nested on the stack.
    let apply_sched = sched.clone();
    let second = Continuation::on_result(move |value| {
        apply_sched.cps_apply(double, value, done.clone());
        Ok(())
    });
    sched.cps_apply(double, Value::new(4i64), second);

    assert_eq!(sched.drain().unwrap(), DrainStatus::Idle);
    assert_eq!(*result.borrow(), Some(16));
}

#[test]
fn test_spawn_inside_spawn() {
    let sched = Scheduler::new();
    let outer_sched = sched.clone();

    let barrier = sched.spawn(move |_void, k| {
        let inner = outer_sched.spawn(|_void, k| {
            k.invoke_one(Value::new(5i64))?;
            Ok(Value::void())
        });
        let outer_k = k.clone();
        inner.wait(Continuation::on_result(move |value| {
            let v = value.downcast_ref::<i64>().copied().unwrap_or(0);
            outer_k.invoke_one(Value::new(v + 1))
        }))?;
        Ok(Value::void())
    });

    let result = sched.blocking_wait(&barrier).unwrap();
    assert_eq!(result.downcast_ref::<i64>(), Some(&6));
}

#[test]
fn test_body_failure_reaches_the_blocking_caller() {
    let sched = Scheduler::new();
    let barrier = sched.spawn(|_void, _k| {
        Err(SchedulerError::TaskFailed("generated code raised".into()))
    });

    let err = sched.blocking_wait(&barrier).unwrap_err();
    assert!(matches!(err, SchedulerError::TaskFailed(_)));
    assert!(sched.is_fatal());
}
