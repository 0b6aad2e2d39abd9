//! Feasibility Oracle & Extension Search (§4.4): decides whether
//! continuing the current low-priority job for `Δ` more time units
//! keeps every job meeting its deadline within the hyperperiod, and
//! binary-searches the largest such `Δ`.
//!
//! Grounded on `main_actual_time.c`'s `is_extension_feasible`/
//! `find_max_extension`, generalized over [`SimTime`] so the same
//! binary search serves both the integer and real-valued variants
//! (the WCET-only reference uses a cruder fixed quantum; this
//! implementation's generic engine subsumes it, per §9 "Real vs
//! integer time").

use rts_types::time::EPSILON as EPS_F64;
use rts_types::{Job, SimTime, Task};

pub(crate) fn task_by_id(tasks: &[Task], id: u32) -> &Task {
    tasks
        .iter()
        .find(|t| t.id == id)
        .expect("job task_id must reference a task in the same task set")
}

/// Highest-RM-priority ready job, or `None` if none is ready now.
pub(crate) fn pick_ready_job<T: SimTime>(jobs: &[Job<T>], tasks: &[Task], now: T) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, job) in jobs.iter().enumerate() {
        if !job.is_ready(now) {
            continue;
        }
        match best {
            None => best = Some(i),
            Some(b) => {
                let job_task = task_by_id(tasks, job.task_id);
                let best_task = task_by_id(tasks, jobs[b].task_id);
                if job_task.rm_has_higher_priority_than(best_task) {
                    best = Some(i);
                }
            }
        }
    }
    best
}

/// Earliest future release strictly after `now`, clamped to `hyperperiod`.
pub(crate) fn next_release_time<T: SimTime>(jobs: &[Job<T>], now: T, hyperperiod: T) -> T {
    let mut next = hyperperiod;
    for j in jobs {
        if j.release > now && j.release < next {
            next = j.release;
        }
    }
    next
}

/// Earliest future release or deadline strictly after `now`, clamped to
/// `hyperperiod` — the event horizon the main loop and oracle both
/// clamp execution against (§4.3 step 4, §4.4 step 4).
pub(crate) fn next_event_time<T: SimTime>(jobs: &[Job<T>], now: T, hyperperiod: T) -> T {
    let mut next = hyperperiod;
    for j in jobs {
        if j.release > now && j.release < next {
            next = j.release;
        }
        if j.deadline > now && j.deadline < next {
            next = j.deadline;
        }
    }
    next
}

/// `feasible(current_job, now, Δ)` (§4.4 steps 1-6).
pub fn is_extension_feasible<T: SimTime>(
    jobs: &[Job<T>],
    tasks: &[Task],
    current_idx: usize,
    now: T,
    delta: T,
    hyperperiod: T,
) -> bool {
    let mut sim: Vec<Job<T>> = jobs.to_vec();
    sim[current_idx].remaining -= delta;
    if sim[current_idx].remaining.as_f64() < -EPS_F64 {
        return false;
    }

    let mut t = now + delta;
    loop {
        if t.as_f64() >= hyperperiod.as_f64() {
            break;
        }
        match pick_ready_job(&sim, tasks, t) {
            None => {
                let next_release = next_release_time(&sim, t, hyperperiod);
                if next_release.as_f64() >= hyperperiod.as_f64() {
                    break;
                }
                t = next_release;
            }
            Some(idx) => {
                let next_event = next_event_time(&sim, t, hyperperiod);
                let mut exec = sim[idx].remaining;
                if next_event.as_f64() < hyperperiod.as_f64() {
                    let avail = next_event - t;
                    if avail.as_f64() < exec.as_f64() {
                        exec = avail;
                    }
                }
                t = t + exec;
                sim[idx].remaining -= exec;

                let missed =
                    t.as_f64() > sim[idx].deadline.as_f64() + EPS_F64 && sim[idx].remaining.as_f64() > EPS_F64;
                if missed {
                    return false;
                }
            }
        }
    }

    sim.iter()
        .all(|j| !(j.remaining.as_f64() > EPS_F64 && j.deadline.as_f64() <= hyperperiod.as_f64() + EPS_F64))
}

/// `max_extension(current_job, now)` (§4.4 "Maximum-extension search").
pub fn max_extension<T: SimTime>(
    jobs: &[Job<T>],
    tasks: &[Task],
    current_idx: usize,
    now: T,
    hyperperiod: T,
) -> T {
    let current_task = task_by_id(tasks, jobs[current_idx].task_id);

    let mut pending_higher = T::ZERO;
    let mut earliest_higher_deadline = hyperperiod;
    for job in jobs {
        if job.release <= now && job.remaining > T::ZERO {
            let job_task = task_by_id(tasks, job.task_id);
            if job_task.rm_has_higher_priority_than(current_task) {
                pending_higher += job.remaining;
                if job.deadline < earliest_higher_deadline {
                    earliest_higher_deadline = job.deadline;
                }
            }
        }
    }

    let mut hi = jobs[current_idx].remaining;
    if pending_higher > T::ZERO {
        let slack = earliest_higher_deadline - now - pending_higher;
        if slack.as_f64() <= 0.0 {
            return T::ZERO;
        }
        if slack.as_f64() < hi.as_f64() {
            hi = slack;
        }
    }

    let mut lo = T::ZERO;
    let mut best = T::ZERO;
    while !T::search_done(lo, hi) {
        let mid = T::midpoint(lo, hi);
        if is_extension_feasible(jobs, tasks, current_idx, now, mid, hyperperiod) {
            best = mid;
            lo = mid;
        } else {
            hi = mid;
        }
    }
    best
}
