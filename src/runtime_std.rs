//! A minimal `std`-only stand-in for "the host task runtime" (spec §6,
//! listed as an external collaborator). This is **not** part of the sinc's
//! contract — it exists only so the crate is directly usable and testable
//! without wiring up a real many-core task runtime.
//!
//! Modeled as a small fixed-size pool of persistent OS worker threads, each
//! with a stable (shepherd, worker) identity recorded in a thread-local —
//! the same "each execution context gets a stable small-integer identity"
//! shape the spec assumes, built from the plain `std::thread` + channel
//! idiom (no executor crate needed for a pool this small).


use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use std::env;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::topology::Runtime;

thread_local! {
    static IDENTITY: Cell<Option<(usize, usize)>> = const { Cell::new(None) };
}

/// Parse and validate one of the pool-shape env vars: it must be a
/// power-of-two `usize` if present at all, a precondition failure otherwise
/// (spec §4.12, "non-power-of-two or zero values are a precondition
/// failure, not a silent fallback") — values not set fall back to `default`
/// without being validated, since the default is derived from
/// `available_parallelism()` and is not expected to be a power of two.
fn parse_shape_var(name: &str, default: usize) -> usize {
    match env::var(name).ok() {
        Some(raw) => {
            let value: usize = raw
                .parse()
                .unwrap_or_else(|_| panic!("sinc: {name} must be a valid usize, got {raw:?}"));
            assert!(
                value > 0 && value.is_power_of_two(),
                "sinc: {name} must be a power of two, got {value}"
            );
            value
        }
        None => default,
    }
}

/// Shape for the reference pool: `shepherds` locality domains with
/// `workers_per_shepherd` workers each, read from environment variables the
/// same way the teacher's `build.rs` resolves configuration with defaults
/// (`SINC_SHEPHERDS`, `SINC_WORKERS_PER_SHEPHERD`), falling back to one
/// worker per available core.
fn resolve_shape() -> (usize, usize) {
    let default_shepherds = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

    let shepherds = parse_shape_var("SINC_SHEPHERDS", default_shepherds);
    let workers_per_shepherd = parse_shape_var("SINC_WORKERS_PER_SHEPHERD", 1);
    (shepherds, workers_per_shepherd)
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A bounded pool of worker threads, each bound to one (shepherd, worker)
/// identity for its whole lifetime.
pub struct WorkerPool {
    shepherds: usize,
    workers_per_shepherd: usize,
    senders: Vec<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn new(shepherds: usize, workers_per_shepherd: usize) -> Self {
        let mut senders = Vec::with_capacity(shepherds * workers_per_shepherd);
        let mut handles = Vec::with_capacity(shepherds * workers_per_shepherd);

        for s in 0..shepherds {
            for w in 0..workers_per_shepherd {
                let (tx, rx) = mpsc::channel::<Job>();
                let handle = thread::Builder::new()
                    .name(alloc::format!("sinc-worker-{s}-{w}"))
                    .spawn(move || {
                        IDENTITY.with(|id| id.set(Some((s, w))));
                        for job in rx {
                            job();
                        }
                    })
                    .expect("sinc: failed to spawn reference pool worker thread");
                senders.push(tx);
                handles.push(handle);
            }
        }

        Self {
            shepherds,
            workers_per_shepherd,
            senders,
            handles,
        }
    }

    /// Total worker count.
    pub fn workers(&self) -> usize {
        self.shepherds * self.workers_per_shepherd
    }

    /// Run `job` on worker `(shepherd, worker)`.
    pub fn spawn_on(&self, shepherd: usize, worker: usize, job: impl FnOnce() + Send + 'static) {
        let idx = shepherd * self.workers_per_shepherd + worker;
        self.senders[idx]
            .send(Box::new(job))
            .expect("sinc: reference pool worker thread terminated unexpectedly");
    }

    /// Round-robin a job across every worker slot in order `0..workers()`,
    /// useful for tests that want "task i runs on worker i % workers()".
    pub fn spawn_round_robin(&self, index: usize, job: impl FnOnce() + Send + 'static) {
        let idx = index % self.workers();
        let shepherd = idx / self.workers_per_shepherd;
        let worker = idx % self.workers_per_shepherd;
        self.spawn_on(shepherd, worker, job);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Dropping `senders` closes every channel, which ends each worker's
        // `for job in rx` loop.
        self.senders.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

struct PoolRuntime {
    pool: WorkerPool,
}

impl Runtime for PoolRuntime {
    fn total_shepherds(&self) -> usize {
        self.pool.shepherds
    }

    fn total_workers(&self) -> usize {
        self.pool.workers()
    }

    fn current_shepherd(&self) -> usize {
        IDENTITY.with(|id| {
            id.get()
                .expect("sinc: current thread is not a reference-pool worker")
                .0
        })
    }

    fn current_worker(&self) -> usize {
        IDENTITY.with(|id| {
            id.get()
                .expect("sinc: current thread is not a reference-pool worker")
                .1
        })
    }

    fn cacheline_bytes(&self) -> usize {
        64
    }
}

static DEFAULT_POOL: std::sync::OnceLock<Arc<PoolRuntime>> = std::sync::OnceLock::new();

fn default_pool() -> &'static Arc<PoolRuntime> {
    DEFAULT_POOL.get_or_init(|| {
        let (shepherds, workers_per_shepherd) = resolve_shape();
        Arc::new(PoolRuntime {
            pool: WorkerPool::new(shepherds, workers_per_shepherd),
        })
    })
}

/// Lazily build the process-wide reference pool, installed as the default
/// `Runtime` when the caller never installs their own. The pool is
/// intentionally never torn down once created, matching the "process
/// lifetime constants" contract the topology snapshot assumes.
pub(crate) fn default_runtime() -> &'static dyn Runtime {
    let arc: &'static Arc<PoolRuntime> = default_pool();
    arc.as_ref()
}

/// Run `tasks.len()` closures, each on its own reference-pool worker slot
/// (round-robin if there are more tasks than workers), and wait for all of
/// them to finish. Intended for tests and for standalone use of this crate
/// without a real host runtime.
pub fn run_on_pool<F>(tasks: Vec<F>)
where
    F: FnOnce() + Send + 'static,
{
    let pool_rt = default_pool();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let n = tasks.len();
    for (i, task) in tasks.into_iter().enumerate() {
        let done_tx = done_tx.clone();
        pool_rt.pool.spawn_round_robin(i, move || {
            task();
            let _ = done_tx.send(());
        });
    }
    drop(done_tx);
    for _ in 0..n {
        done_rx.recv().expect("sinc: reference pool task panicked");
    }
}
