//! # cps-runtime 性能基准测试
//!
//! 使用 Criterion.rs 进行性能基准测试。
//!
//! ## 基准测试分组
//! - `queue`: 就绪队列吞吐量
//! - `barrier`: 屏障释放与扇出
//! - `cps`: 端到端 CPS 调度
//!
//! ## 使用方法
//! ```bash
//! cargo bench          # 运行所有
//! cargo bench queue    # 只运行队列基准
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cps_runtime::{Continuation, Scheduler, SchedulerResult, Task, Value};

// ============================================================================
// Queue throughput
// ============================================================================

fn bench_push_drain_thunks(c: &mut Criterion) {
    c.bench_function("queue/push_drain_1000_thunks", |b| {
        b.iter(|| {
            let sched = Scheduler::new();
            for i in 0..1000u64 {
                let barrier = sched.new_barrier();
                sched.push(Task::thunk(barrier, move || Ok(Value::new(i))));
            }
            sched.drain().unwrap();
            black_box(sched.pending_tasks())
        })
    });
}

fn bench_return_chain(c: &mut Criterion) {
    fn step(sched: Scheduler, n: u64, k: Continuation) -> SchedulerResult<()> {
        if n == 0 {
            return k.invoke_one(Value::new(0u64));
        }
        let next_sched = sched.clone();
        let next_k = k.clone();
        let cont = Continuation::on_result(move |value| {
            let m = value.downcast_ref::<u64>().copied().unwrap_or(0);
            step(next_sched.clone(), m, next_k.clone())
        });
        sched.return_(cont, Value::new(n - 1));
        Ok(())
    }

    c.bench_function("queue/return_chain_1000", |b| {
        b.iter(|| {
            let sched = Scheduler::new();
            let inner = sched.clone();
            let barrier = sched.spawn(move |_void, k| {
                step(inner.clone(), 1000, k)?;
                Ok(Value::void())
            });
            black_box(sched.blocking_wait(&barrier).unwrap())
        })
    });
}

// ============================================================================
// Barrier fan-out
// ============================================================================

fn bench_barrier_fanout(c: &mut Criterion) {
    c.bench_function("barrier/release_to_100_waiters", |b| {
        b.iter(|| {
            let sched = Scheduler::new();
            let barrier = sched.new_barrier();
            for _ in 0..100 {
                barrier
                    .wait(Continuation::on_result(|value| {
                        black_box(value.downcast_ref::<u64>());
                        Ok(())
                    }))
                    .unwrap();
            }
            barrier.release(Value::new(1u64)).unwrap();
        })
    });
}

// ============================================================================
// End-to-end CPS scheduling
// ============================================================================

fn bench_spawn_round_trip(c: &mut Criterion) {
    c.bench_function("cps/spawn_blocking_wait", |b| {
        b.iter(|| {
            let sched = Scheduler::new();
            let barrier = sched.spawn(|_void, k| {
                k.invoke_one(Value::new(42i64))?;
                Ok(Value::void())
            });
            black_box(sched.blocking_wait(&barrier).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_push_drain_thunks,
    bench_return_chain,
    bench_barrier_fanout,
    bench_spawn_round_trip
);
criterion_main!(benches);
