//! Offline RM-RCS simulator (§4.3): reads a task set, expands it into
//! one hyperperiod of jobs, runs the event-driven simulation, and
//! writes the merged schedule plus analytics.

pub mod io;
pub mod oracle;
pub mod sim;

use crate::config::Config;
use crate::errors::RtsError;
use rts_types::{generate_jobs, hyperperiod, merge_schedule, SimTime, Task, MAX_JOBS};
use std::fs;

/// Run the simulation for one numeric instantiation and render both the
/// canonical text grammar and, optionally, a JSON rendering of the
/// merged schedule.
pub fn simulate_and_report<T: SimTime>(tasks: &[Task], json: bool) -> Result<(String, Option<String>), RtsError> {
    let h = hyperperiod(tasks);
    let jobs = generate_jobs::<T>(tasks, h);
    if jobs.len() > MAX_JOBS {
        return Err(rts_types::RtsTypesError::TooManyJobs {
            count: jobs.len(),
            limit: MAX_JOBS,
        }
        .into());
    }

    let output = sim::simulate(tasks, jobs, h)?;
    let merged = merge_schedule(&output.schedule);
    let text = io::write_schedule(h, &merged, tasks, output.context_switches, output.idle_time);
    let json_text = if json {
        Some(serde_json::to_string_pretty(&merged)?)
    } else {
        None
    };
    Ok((text, json_text))
}

/// Entry point used by `main`: reads `tasks.txt` (and `actual.txt` if
/// configured), picks the `i64` or `f64` instantiation based on whether
/// an actual-time file was supplied, and writes the schedule output.
pub fn run_offline(cfg: &Config) -> Result<(), RtsError> {
    let tasks_contents = fs::read_to_string(&cfg.tasks_path)?;
    let mut tasks = io::parse_tasks(&tasks_contents)?;

    // `--actual` defaults to `actual.txt` *if present*: an explicit
    // path is always honored, but an omitted flag still picks up the
    // conventional sibling file rather than silently skipping it.
    let actual_path = cfg
        .actual_path
        .clone()
        .or_else(|| Some("actual.txt".to_string()).filter(|p| fs::metadata(p).is_ok()));

    let use_actual_variant = if let Some(actual_path) = &actual_path {
        let actual_contents = fs::read_to_string(actual_path)?;
        io::apply_actual(&mut tasks, &actual_contents)?;
        true
    } else {
        false
    };

    let (text, json_text) = if use_actual_variant {
        simulate_and_report::<f64>(&tasks, cfg.json)?
    } else {
        simulate_and_report::<i64>(&tasks, cfg.json)?
    };

    fs::write(&cfg.schedule_out, text)?;
    if let Some(json_text) = json_text {
        fs::write(format!("{}.json", cfg.schedule_out), json_text)?;
    }
    Ok(())
}
