//! Periodic Worker (§4.1): one per task. Releases one job per period,
//! executes a pluggable body, and publishes its next absolute deadline
//! before sleeping.

use super::{trace, WorkerTable};
use crate::kernel::{Kernel, Tick};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A job body differing only in which simulated sensor it reads
/// (§9 "Function-pointer job bodies"); takes the 1-based job sequence
/// number and returns the reading to print in the `END` trace line.
pub type JobBody = Arc<dyn Fn(u64) -> i64 + Send + Sync>;

pub struct Worker<K: Kernel> {
    pub name: &'static str,
    pub index: usize,
    pub period: u64,
    pub kernel: Arc<K>,
    pub table: WorkerTable,
    pub hyperperiod: Tick,
    pub complete: Arc<AtomicBool>,
    pub body: JobBody,
}

impl<K: Kernel> Worker<K> {
    pub async fn run(self) {
        let mut last_wake = self.kernel.now();
        let mut job_counter: u32 = 1;

        loop {
            if self.complete.load(Ordering::Relaxed) {
                break;
            }

            let next_deadline = last_wake + self.period;
            self.table.write_deadline(self.index, next_deadline);

            last_wake += self.period;
            self.kernel.sleep_until(last_wake).await;

            let tick = self.kernel.now();
            if tick > self.hyperperiod {
                self.complete.store(true, Ordering::Relaxed);
                break;
            }

            trace::job_start(self.name, tick, job_counter, next_deadline);
            let value = (self.body)(job_counter as u64);
            let end_tick = self.kernel.now();
            trace::job_end(self.name, end_tick, job_counter, value);

            job_counter = job_counter.wrapping_add(1);
        }

        self.kernel.mark_terminated(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edf::WorkerSlot;
    use crate::kernel::SimKernel;

    #[tokio::test]
    async fn worker_publishes_deadline_before_sleeping_and_terminates_at_hyperperiod() {
        let table = WorkerTable::new(vec![WorkerSlot {
            name: "TempTask",
            index: 0,
            period_ticks: 500,
            next_deadline_tick: 500,
            last_known_priority: 1,
        }]);
        let kernel = SimKernel::new(1, 1);
        let complete = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            name: "TempTask",
            index: 0,
            period: 500,
            kernel: kernel.clone(),
            table: table.clone(),
            hyperperiod: 1000,
            complete: complete.clone(),
            body: Arc::new(|_| 42),
        };
        let handle = tokio::spawn(worker.run());

        tokio::task::yield_now().await;
        assert_eq!(table.snapshot()[0].next_deadline_tick, 500);

        kernel.advance_to(500);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(table.snapshot()[0].next_deadline_tick, 1000);

        kernel.advance_to(1000);
        tokio::task::yield_now().await;
        kernel.advance_to(1500);
        handle.await.unwrap();
        assert!(!kernel.is_alive(0));
    }
}
