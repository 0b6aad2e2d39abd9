// lib.rs — shared scheduling vocabulary (tasks, jobs, schedule entries)
//
// Depended on by every binary/library in the workspace the same way
// `shared_protocol` backs both ends of the wire in the sibling project:
// here the two consumers are the live EDF controller and the offline
// RM-RCS simulator, and the shared vocabulary is tasks/jobs/deadlines
// rather than packets.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod error;
pub mod time;

pub use error::RtsTypesError;
pub use time::{EPSILON, SimTime};

// =============================== Limits =====================================

/// Sanity bound carried over from the reference's fixed `Task tasks[MAX_TASKS]`
/// array; this implementation still validates against it at parse time even
/// though storage itself grows dynamically past that point (see DESIGN.md).
pub const MAX_TASKS: usize = 20;
/// Sanity bound carried over from the reference's fixed `Job jobs[MAX_JOBS]`
/// array.
pub const MAX_JOBS: usize = 1000;

// =============================== Task =======================================

/// Static configuration for one periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// 1-based task identity.
    pub id: u32,
    /// Release offset of the task's first job, in time units.
    pub arrival: i64,
    /// Worst-case execution time, in time units.
    pub wcet: i64,
    /// Strictly positive period, in time units.
    pub period: i64,
    /// Observed execution time (real, ≥ 0); defaults to `wcet` when absent.
    pub actual: f64,
}

impl Task {
    pub fn new(id: u32, arrival: i64, wcet: i64, period: i64) -> Result<Self, RtsTypesError> {
        Self::with_actual(id, arrival, wcet, period, wcet as f64)
    }

    pub fn with_actual(
        id: u32,
        arrival: i64,
        wcet: i64,
        period: i64,
        actual: f64,
    ) -> Result<Self, RtsTypesError> {
        if period <= 0 {
            return Err(RtsTypesError::NonPositivePeriod { id, period });
        }
        if arrival < 0 {
            return Err(RtsTypesError::NegativeArrival { id, arrival });
        }
        if wcet > period {
            return Err(RtsTypesError::WcetExceedsPeriod { id, wcet, period });
        }
        if actual < 0.0 {
            return Err(RtsTypesError::NegativeActual { id, actual });
        }
        Ok(Self {
            id,
            arrival,
            wcet,
            period,
            actual,
        })
    }

    /// RM priority ordering: shorter period wins; ties broken by lower id.
    /// `self` has RM-higher priority than `other` iff this returns `Less`.
    pub fn rm_cmp(&self, other: &Task) -> Ordering {
        self.period.cmp(&other.period).then(self.id.cmp(&other.id))
    }

    pub fn rm_has_higher_priority_than(&self, other: &Task) -> bool {
        self.rm_cmp(other) == Ordering::Less
    }
}

/// `H = lcm(period_i)` over the given tasks.
///
/// Invariant: `H mod period_i == 0` for every task (§8, "Hyperperiod
/// correctness").
pub fn hyperperiod(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .map(|t| t.period)
        .fold(1i64, |acc, p| lcm(acc, p))
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn lcm(a: i64, b: i64) -> i64 {
    a / gcd(a, b) * b
}

// =============================== Job ========================================

/// One dynamic instance of a task, generated over a single hyperperiod.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Job<T: SimTime> {
    pub task_id: u32,
    /// 1-based per-task job sequence number.
    pub job_id: u32,
    pub release: T,
    pub deadline: T,
    pub remaining: T,
    /// Original WCET, kept alongside `remaining` so the actual-time variant
    /// can still report WCET-based figures where needed.
    pub wcet: i64,
    pub first_job: bool,
}

impl<T: SimTime> Job<T> {
    pub fn is_ready(&self, now: T) -> bool {
        self.release <= now && self.remaining > T::ZERO
    }

    pub fn is_complete(&self) -> bool {
        self.remaining <= T::EPSILON
    }
}

/// Expand `tasks` into every job released strictly before `hyperperiod`.
///
/// Job `k` (0-based) of task `i` has `release = arrival_i + k * period_i` and
/// `deadline = release + period_i` (implicit-deadline model). The first job
/// of every task always carries `remaining = wcet`; later jobs carry
/// `remaining = actual` when `T = f64`, or `wcet` when `T = i64` (the
/// WCET-only variant has no concept of "actual" distinct from WCET).
pub fn generate_jobs<T: SimTime>(tasks: &[Task], hyperperiod: i64) -> Vec<Job<T>> {
    let mut jobs = Vec::new();
    for task in tasks {
        let num_jobs = hyperperiod / task.period;
        for k in 0..num_jobs {
            let release = task.arrival + k * task.period;
            if release >= hyperperiod {
                continue;
            }
            let first_job = k == 0;
            let remaining = if first_job {
                T::from_wcet(task.wcet)
            } else {
                T::from_actual(task.actual, task.wcet)
            };
            jobs.push(Job {
                task_id: task.id,
                job_id: (k + 1) as u32,
                release: T::from_ticks(release),
                deadline: T::from_ticks(release + task.period),
                remaining,
                wcet: task.wcet,
                first_job,
            });
        }
    }
    jobs
}

// =============================== Schedule ===================================

/// One run of the CPU (or idle) over `[start, end)`.
///
/// `task_id == 0` denotes idle, matching the reference's sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry<T: SimTime> {
    pub start: T,
    pub end: T,
    pub task_id: u32,
    pub job_id: u32,
    pub context_switch: bool,
}

impl<T: SimTime> ScheduleEntry<T> {
    pub fn is_idle(&self) -> bool {
        self.task_id == 0
    }

    pub fn duration(&self) -> T {
        self.end - self.start
    }
}

/// Forward pass merging adjacent entries carrying the same `(task_id, job_id)`
/// whose boundaries touch within `EPSILON`. The merged entry inherits the
/// earlier entry's `context_switch` flag.
///
/// Idempotent: running this twice yields the same result as running it once
/// (§8, "Merge idempotence") because no two adjacent entries in the output
/// ever again satisfy the merge predicate.
pub fn merge_schedule<T: SimTime>(entries: &[ScheduleEntry<T>]) -> Vec<ScheduleEntry<T>> {
    if entries.len() <= 1 {
        return entries.to_vec();
    }
    let mut merged: Vec<ScheduleEntry<T>> = Vec::with_capacity(entries.len());
    merged.push(entries[0]);
    for entry in &entries[1..] {
        let last = merged.last_mut().expect("merged is non-empty");
        let touching = entry.start.touches(last.end);
        if entry.task_id == last.task_id && entry.job_id == last.job_id && touching {
            last.end = entry.end;
        } else {
            merged.push(*entry);
        }
    }
    merged
}

// =============================== Tests ======================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperperiod_is_lcm_of_periods() {
        let tasks = vec![
            Task::new(1, 0, 1, 3).unwrap(),
            Task::new(2, 0, 2, 5).unwrap(),
            Task::new(3, 0, 2, 7).unwrap(),
        ];
        let h = hyperperiod(&tasks);
        assert_eq!(h, 105);
        for t in &tasks {
            assert_eq!(h % t.period, 0);
        }
    }

    #[test]
    fn generate_jobs_counts_and_releases() {
        let tasks = vec![Task::new(1, 0, 1, 3).unwrap()];
        let h = hyperperiod(&tasks);
        let jobs: Vec<Job<i64>> = generate_jobs(&tasks, h);
        assert_eq!(jobs.len() as i64, h / tasks[0].period);
        for (k, job) in jobs.iter().enumerate() {
            assert_eq!(job.release, k as i64 * tasks[0].period);
            assert_eq!(job.deadline, job.release + tasks[0].period);
        }
    }

    #[test]
    fn rm_priority_shorter_period_wins_ties_by_id() {
        let a = Task::new(1, 0, 1, 10).unwrap();
        let b = Task::new(2, 0, 1, 5).unwrap();
        assert!(b.rm_has_higher_priority_than(&a));

        let c = Task::new(1, 0, 1, 5).unwrap();
        let d = Task::new(2, 0, 1, 5).unwrap();
        assert!(c.rm_has_higher_priority_than(&d));
    }

    #[test]
    fn merge_schedule_is_idempotent() {
        let entries = vec![
            ScheduleEntry {
                start: 0i64,
                end: 1,
                task_id: 1,
                job_id: 1,
                context_switch: false,
            },
            ScheduleEntry {
                start: 1,
                end: 2,
                task_id: 1,
                job_id: 1,
                context_switch: false,
            },
            ScheduleEntry {
                start: 2,
                end: 4,
                task_id: 2,
                job_id: 1,
                context_switch: true,
            },
        ];
        let once = merge_schedule(&entries);
        let twice = merge_schedule(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
        assert_eq!(once[0].start, 0);
        assert_eq!(once[0].end, 2);
    }

    #[test]
    fn task_construction_rejects_invalid_fields() {
        assert!(matches!(
            Task::new(1, 0, 1, 0),
            Err(RtsTypesError::NonPositivePeriod { .. })
        ));
        assert!(matches!(
            Task::new(1, -1, 1, 5),
            Err(RtsTypesError::NegativeArrival { .. })
        ));
        assert!(matches!(
            Task::new(1, 0, 6, 5),
            Err(RtsTypesError::WcetExceedsPeriod { .. })
        ));
    }
}
