//! RM-RCS main event loop (§4.3): picks the highest-RM-priority ready
//! job each cycle, optionally extends the currently running
//! lower-priority job via the oracle, and records a schedule entry
//! per step. Grounded on `main_wcet_only.c`'s `simulate_rmrcs` and
//! `main_actual_time.c`'s float-typed counterpart, merged into one
//! generic engine.

use super::oracle;
use crate::errors::RtsError;
use rts_types::time::EPSILON as EPS_F64;
use rts_types::{Job, ScheduleEntry, SimTime, Task};

pub struct SimOutput<T: SimTime> {
    pub schedule: Vec<ScheduleEntry<T>>,
    pub context_switches: u32,
    pub idle_time: T,
}

/// Run the event loop to completion (`now >= H`). Returns
/// [`RtsError::DeadlineMissed`] the moment a job finishes past its own
/// deadline — under a feasible RM-schedulable task set this never
/// triggers, since the oracle rejects any extension that would cause
/// one (§4.4 "Failure model").
pub fn simulate<T: SimTime>(
    tasks: &[Task],
    mut jobs: Vec<Job<T>>,
    hyperperiod: i64,
) -> Result<SimOutput<T>, RtsError> {
    let h = T::from_ticks(hyperperiod);
    let mut schedule = Vec::new();
    let mut context_switches = 0u32;
    let mut idle_time = T::ZERO;
    let mut now = T::ZERO;
    // `current`: the not-yet-completed job (if any) eligible for the
    // extension check in step 3; cleared the moment its job completes.
    let mut current: Option<usize> = None;
    // `last_task_id`: the task identity of the most recent *job* entry
    // (idle periods are transparent to it), used to count context
    // switches (§8 "Context switch": identity change between job
    // entries; idle segments are tracked separately via `idle_time`
    // and never themselves counted, per scenario S2).
    let mut last_task_id: Option<u32> = None;

    while now.as_f64() < h.as_f64() {
        let ready = oracle::pick_ready_job(&jobs, tasks, now);

        let Some(j_star) = ready else {
            let next_release = oracle::next_release_time(&jobs, now, h);
            let advance_to = if next_release.as_f64() >= h.as_f64() {
                h
            } else {
                next_release
            };
            idle_time += advance_to - now;
            schedule.push(ScheduleEntry {
                start: now,
                end: advance_to,
                task_id: 0,
                job_id: 0,
                context_switch: false,
            });
            current = None;
            now = advance_to;
            continue;
        };

        if let Some(cur_idx) = current {
            let current_task = oracle::task_by_id(tasks, jobs[cur_idx].task_id);
            let star_task = oracle::task_by_id(tasks, jobs[j_star].task_id);
            if cur_idx != j_star
                && jobs[cur_idx].remaining > T::ZERO
                && star_task.rm_has_higher_priority_than(current_task)
            {
                let delta = oracle::max_extension(&jobs, tasks, cur_idx, now, h);
                if delta.as_f64() > EPS_F64 {
                    schedule.push(ScheduleEntry {
                        start: now,
                        end: now + delta,
                        task_id: jobs[cur_idx].task_id,
                        job_id: jobs[cur_idx].job_id,
                        context_switch: false,
                    });
                    jobs[cur_idx].remaining -= delta;
                    now = now + delta;
                    continue;
                }
            }
        }

        let task_id_star = jobs[j_star].task_id;
        let context_switch = match last_task_id {
            Some(prev) => prev != task_id_star,
            None => false,
        };
        if context_switch {
            context_switches += 1;
        }
        last_task_id = Some(task_id_star);
        current = Some(j_star);

        let next_event = oracle::next_event_time(&jobs, now, h);
        let mut exec = jobs[j_star].remaining;
        if next_event.as_f64() < h.as_f64() {
            let avail = next_event - now;
            if avail.as_f64() < exec.as_f64() {
                exec = avail;
            }
        }

        if exec.as_f64() <= EPS_F64 {
            // No progress possible before the next event; this only
            // happens at a boundary tick, so just step to it.
            now = next_event;
            continue;
        }

        schedule.push(ScheduleEntry {
            start: now,
            end: now + exec,
            task_id: jobs[j_star].task_id,
            job_id: jobs[j_star].job_id,
            context_switch,
        });
        jobs[j_star].remaining -= exec;
        now = now + exec;

        if jobs[j_star].is_complete() {
            if now.as_f64() > jobs[j_star].deadline.as_f64() + EPS_F64 {
                return Err(RtsError::DeadlineMissed {
                    task_id: jobs[j_star].task_id,
                    job_id: jobs[j_star].job_id,
                    deadline: jobs[j_star].deadline.as_f64(),
                    now: now.as_f64(),
                });
            }
            current = None;
        }
    }

    for job in &jobs {
        if job.deadline.as_f64() <= h.as_f64() + EPS_F64 && job.remaining.as_f64() > EPS_F64 {
            return Err(RtsError::DeadlineMissed {
                task_id: job.task_id,
                job_id: job.job_id,
                deadline: job.deadline.as_f64(),
                now: h.as_f64(),
            });
        }
    }

    Ok(SimOutput {
        schedule,
        context_switches,
        idle_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rts_types::{generate_jobs, hyperperiod, merge_schedule};

    /// S1: three tasks, H=105. The task set's own WCET demand over one
    /// hyperperiod is 35*1 + 21*2 + 15*2 = 107 execution units against
    /// H=105 (U = 1/3 + 2/5 + 2/7 ≈ 1.019 > 1) — it is not RM-feasible,
    /// so at least one job necessarily misses its deadline regardless
    /// of any RCS extension (see DESIGN.md's Open Question resolution).
    /// `simulate` surfaces that as `Err(DeadlineMissed)` rather than a
    /// silently-short schedule.
    #[test]
    fn scenario_s1_is_infeasible_and_reports_deadline_missed() {
        let tasks = vec![
            Task::new(1, 0, 1, 3).unwrap(),
            Task::new(2, 0, 2, 5).unwrap(),
            Task::new(3, 0, 2, 7).unwrap(),
        ];
        let h = hyperperiod(&tasks);
        assert_eq!(h, 105);
        let jobs: Vec<Job<i64>> = generate_jobs(&tasks, h);
        assert_eq!(jobs.len(), 35 + 21 + 15);
        match simulate(&tasks, jobs, h) {
            Err(RtsError::DeadlineMissed { .. }) => {}
            Err(other) => panic!("expected DeadlineMissed, got a different error: {other}"),
            Ok(_) => panic!("expected DeadlineMissed on an over-utilized task set, got Ok"),
        }
    }

    /// Per-job accounting (§8): each job's total executed time equals
    /// its WCET, and its latest `end` never exceeds its deadline.
    #[test]
    fn per_job_accounting_matches_wcet_and_deadline() {
        let tasks = vec![
            Task::new(1, 0, 1, 3).unwrap(),
            Task::new(2, 0, 2, 5).unwrap(),
            Task::new(3, 0, 2, 7).unwrap(),
        ];
        let h = hyperperiod(&tasks);
        let jobs: Vec<Job<i64>> = generate_jobs(&tasks, h);
        let job_specs: Vec<(u32, u32, i64, i64)> = jobs
            .iter()
            .map(|j| (j.task_id, j.job_id, j.deadline, j.wcet))
            .collect();
        let output = simulate(&tasks, jobs, h).unwrap();

        for (task_id, job_id, deadline, wcet) in job_specs {
            let matching: Vec<_> = output
                .schedule
                .iter()
                .filter(|e| e.task_id == task_id && e.job_id == job_id)
                .collect();
            let executed: i64 = matching.iter().map(|e| e.duration()).sum();
            assert_eq!(executed, wcet, "T{task_id}j{job_id} executed time");
            let latest_end = matching.iter().map(|e| e.end).max().unwrap();
            assert!(latest_end <= deadline, "T{task_id}j{job_id} missed its deadline");
        }
    }

    /// S2: T1=(0,1,2), T2=(0,1,4); pure RM with no beneficial extension.
    #[test]
    fn scenario_s2_matches_hand_computed_schedule() {
        let tasks = vec![
            Task::new(1, 0, 1, 2).unwrap(),
            Task::new(2, 0, 1, 4).unwrap(),
        ];
        let h = hyperperiod(&tasks);
        assert_eq!(h, 4);
        let jobs: Vec<Job<i64>> = generate_jobs(&tasks, h);
        let output = simulate(&tasks, jobs, h).unwrap();
        let merged = merge_schedule(&output.schedule);

        assert_eq!(merged.len(), 4);
        assert_eq!((merged[0].task_id, merged[0].start, merged[0].end), (1, 0, 1));
        assert_eq!((merged[1].task_id, merged[1].start, merged[1].end), (2, 1, 2));
        assert_eq!((merged[2].task_id, merged[2].start, merged[2].end), (1, 2, 3));
        assert!(merged[3].is_idle());
        assert_eq!((merged[3].start, merged[3].end), (3, 4));
        assert_eq!(output.context_switches, 2);
        assert_eq!(output.idle_time, 1);
    }

    /// S3: T1=(0,2,4), T2=(0,2,8); after merge exactly one T1j1, one T1j2.
    #[test]
    fn scenario_s3_merge_produces_one_entry_per_job() {
        let tasks = vec![
            Task::new(1, 0, 2, 4).unwrap(),
            Task::new(2, 0, 2, 8).unwrap(),
        ];
        let h = hyperperiod(&tasks);
        let jobs: Vec<Job<i64>> = generate_jobs(&tasks, h);
        let output = simulate(&tasks, jobs, h).unwrap();
        let merged = merge_schedule(&output.schedule);

        let t1j1 = merged.iter().filter(|e| e.task_id == 1 && e.job_id == 1).count();
        let t1j2 = merged.iter().filter(|e| e.task_id == 1 && e.job_id == 2).count();
        assert_eq!(t1j1, 1);
        assert_eq!(t1j2, 1);
    }

    /// S6: with actual == wcet, the f64 variant's schedule matches the
    /// i64 variant modulo numeric formatting.
    #[test]
    fn scenario_s6_actual_time_matches_wcet_only_when_actual_equals_wcet() {
        let tasks = vec![
            Task::new(1, 0, 1, 3).unwrap(),
            Task::new(2, 0, 2, 5).unwrap(),
        ];
        let h = hyperperiod(&tasks);

        let int_jobs: Vec<Job<i64>> = generate_jobs(&tasks, h);
        let int_out = simulate(&tasks, int_jobs, h).unwrap();

        let real_jobs: Vec<Job<f64>> = generate_jobs(&tasks, h);
        let real_out = simulate(&tasks, real_jobs, h).unwrap();

        assert_eq!(int_out.schedule.len(), real_out.schedule.len());
        for (a, b) in int_out.schedule.iter().zip(real_out.schedule.iter()) {
            assert_eq!(a.task_id, b.task_id);
            assert_eq!(a.job_id, b.job_id);
            assert!((a.start as f64 - b.start).abs() < rts_types::time::EPSILON);
            assert!((a.end as f64 - b.end).abs() < rts_types::time::EPSILON);
        }
    }
}
