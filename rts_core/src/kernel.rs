//! The `Kernel` trait abstracts the handful of real-time-kernel
//! capabilities the EDF side consumes (§2 "Kernel Service (external)"):
//! create a periodic worker, wake at an absolute tick, read the clock,
//! read/set a worker's dynamic priority, and query liveness. Everything
//! below that line — the tick timer, the ready queue, context switching
//! itself — stays out of scope and is provided by `tokio`.
//!
//! `TokioKernel` is the production binding; `SimKernel` (test-only)
//! replaces real sleeps with a manually-advanced logical clock so
//! controller/worker interleavings are deterministic in tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An absolute tick count, in the same units as `Task::period`/`arrival`.
pub type Tick = u64;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Kernel: Send + Sync {
    /// Current absolute tick.
    fn now(&self) -> Tick;

    /// Suspend the calling task until `tick` is reached. Absolute, not
    /// relative — repeated calls do not accumulate drift (§4.1 step 3).
    async fn sleep_until(&self, tick: Tick);

    /// A worker's last-written kernel priority, or `None` if `task_index`
    /// is out of range.
    fn priority(&self, task_index: usize) -> Option<u8>;

    /// Overwrite a worker's kernel priority. Observed as atomic per task
    /// (§9 "Priority rewriting atomicity").
    fn set_priority(&self, task_index: usize, priority: u8);

    /// Whether the worker bound to `task_index` is still running.
    fn is_alive(&self, task_index: usize) -> bool;

    /// Record that the worker bound to `task_index` has terminated.
    fn mark_terminated(&self, task_index: usize);
}

/// Production `Kernel`: tasks are tokio tasks, ticks are milliseconds
/// since construction, and a small array of atomics stands in for the
/// kernel's per-task priority/state fields (§5.1).
pub struct TokioKernel {
    epoch: Instant,
    priorities: Vec<AtomicU8>,
    alive: Vec<std::sync::atomic::AtomicBool>,
}

impl TokioKernel {
    pub fn new(n_workers: usize, initial_priority: u8) -> Arc<Self> {
        Arc::new(Self {
            epoch: Instant::now(),
            priorities: (0..n_workers).map(|_| AtomicU8::new(initial_priority)).collect(),
            alive: (0..n_workers)
                .map(|_| std::sync::atomic::AtomicBool::new(true))
                .collect(),
        })
    }

    fn tick_of(&self, instant: Instant) -> Tick {
        instant.saturating_duration_since(self.epoch).as_millis() as Tick
    }

    fn instant_of(&self, tick: Tick) -> Instant {
        self.epoch + Duration::from_millis(tick)
    }
}

#[async_trait]
impl Kernel for TokioKernel {
    fn now(&self) -> Tick {
        self.tick_of(Instant::now())
    }

    async fn sleep_until(&self, tick: Tick) {
        tokio::time::sleep_until(tokio::time::Instant::from_std(self.instant_of(tick))).await;
    }

    fn priority(&self, task_index: usize) -> Option<u8> {
        self.priorities.get(task_index).map(|p| p.load(Ordering::Relaxed))
    }

    fn set_priority(&self, task_index: usize, priority: u8) {
        if let Some(p) = self.priorities.get(task_index) {
            p.store(priority, Ordering::Relaxed);
        }
    }

    fn is_alive(&self, task_index: usize) -> bool {
        self.alive
            .get(task_index)
            .map(|a| a.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn mark_terminated(&self, task_index: usize) {
        if let Some(a) = self.alive.get(task_index) {
            a.store(false, Ordering::Relaxed);
        }
    }
}

/// Test-only `Kernel` with a logical clock advanced by the test itself
/// via [`SimKernel::advance_to`], rather than wall-clock sleeps.
#[cfg(test)]
pub struct SimKernel {
    clock: AtomicUsize,
    notify: tokio::sync::Notify,
    priorities: Vec<AtomicU8>,
    alive: Vec<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl SimKernel {
    pub fn new(n_workers: usize, initial_priority: u8) -> Arc<Self> {
        Arc::new(Self {
            clock: AtomicUsize::new(0),
            notify: tokio::sync::Notify::new(),
            priorities: (0..n_workers).map(|_| AtomicU8::new(initial_priority)).collect(),
            alive: (0..n_workers)
                .map(|_| std::sync::atomic::AtomicBool::new(true))
                .collect(),
        })
    }

    pub fn advance_to(&self, tick: Tick) {
        self.clock.store(tick as usize, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
#[async_trait]
impl Kernel for SimKernel {
    fn now(&self) -> Tick {
        self.clock.load(Ordering::SeqCst) as Tick
    }

    async fn sleep_until(&self, tick: Tick) {
        while self.now() < tick {
            self.notify.notified().await;
        }
    }

    fn priority(&self, task_index: usize) -> Option<u8> {
        self.priorities.get(task_index).map(|p| p.load(Ordering::Relaxed))
    }

    fn set_priority(&self, task_index: usize, priority: u8) {
        if let Some(p) = self.priorities.get(task_index) {
            p.store(priority, Ordering::Relaxed);
        }
    }

    fn is_alive(&self, task_index: usize) -> bool {
        self.alive
            .get(task_index)
            .map(|a| a.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn mark_terminated(&self, task_index: usize) {
        if let Some(a) = self.alive.get(task_index) {
            a.store(false, Ordering::Relaxed);
        }
    }
}
