//! `tasks.txt`/`actual.txt` parsing and the `schedule.txt`/`schedule3.txt`
//! writer (§6 "External interfaces"). Grounded on `main_wcet_only.c`'s
//! `load_tasks`/`print_schedule` and `main_g.c`'s count-prefixed variant.

use rts_types::{RtsTypesError, ScheduleEntry, SimTime, Task, MAX_TASKS};
use std::fmt::Write as _;

/// Parse `tasks.txt`: whitespace-separated `arrival wcet period` triples,
/// one task per triple, 1-based task ids assigned in file order. Accepts
/// both the plain form and the `main_g` count-prefixed form (a leading
/// token equal to the number of following triples).
pub fn parse_tasks(contents: &str) -> Result<Vec<Task>, RtsTypesError> {
    let tokens: Vec<&str> = contents.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let count_prefixed = tokens[0]
        .parse::<usize>()
        .map(|n| tokens.len() - 1 == n * 3)
        .unwrap_or(false);
    let triples: &[&str] = if count_prefixed { &tokens[1..] } else { &tokens[..] };

    if triples.len() % 3 != 0 {
        return Err(RtsTypesError::MalformedTaskLine {
            line_no: 0,
            line: contents.lines().next().unwrap_or("").to_string(),
            reason: "token count is not a multiple of 3".to_string(),
        });
    }

    let mut tasks = Vec::with_capacity(triples.len() / 3);
    for (i, chunk) in triples.chunks(3).enumerate() {
        let parse_field = |field: &str, name: &str| {
            field.parse::<i64>().map_err(|e| RtsTypesError::MalformedTaskLine {
                line_no: i + 1,
                line: chunk.join(" "),
                reason: format!("{name}: {e}"),
            })
        };
        let arrival = parse_field(chunk[0], "arrival")?;
        let wcet = parse_field(chunk[1], "wcet")?;
        let period = parse_field(chunk[2], "period")?;
        tasks.push(Task::new((i + 1) as u32, arrival, wcet, period)?);
    }

    if tasks.len() > MAX_TASKS {
        return Err(RtsTypesError::TooManyTasks {
            count: tasks.len(),
            limit: MAX_TASKS,
        });
    }
    Ok(tasks)
}

/// Apply `actual.txt`: one real number per line, positional with
/// `tasks` in file order; missing trailing lines leave `actual = wcet`.
pub fn apply_actual(tasks: &mut [Task], contents: &str) -> Result<(), RtsTypesError> {
    for (i, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(task) = tasks.get_mut(i) else { break };
        let actual: f64 = trimmed.parse().map_err(|e: std::num::ParseFloatError| {
            RtsTypesError::MalformedActualLine {
                line_no: i + 1,
                line: trimmed.to_string(),
                reason: e.to_string(),
            }
        })?;
        if actual < 0.0 {
            return Err(RtsTypesError::NegativeActual { id: task.id, actual });
        }
        task.actual = actual;
    }
    Ok(())
}

/// Render the exact schedule grammar from §6, including the optional
/// turnaround-time block (a supplement over `main_actual_time.c`, which
/// dropped the turnaround report the WCET-only variant has).
pub fn write_schedule<T: SimTime>(
    hyperperiod: i64,
    entries: &[ScheduleEntry<T>],
    tasks: &[Task],
    context_switches: u32,
    idle_time: T,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schedule (Hyperperiod: {hyperperiod}):");
    let _ = writeln!(out, "TaskJob | Start-End | Context Switch");
    for e in entries {
        if e.is_idle() {
            let _ = writeln!(out, "Idle {}-{}", e.start.format_time(), e.end.format_time());
        } else {
            let cs = if e.context_switch { " | CS" } else { "" };
            let _ = writeln!(
                out,
                "T{}j{} {}-{}{}",
                e.task_id,
                e.job_id,
                e.start.format_time(),
                e.end.format_time(),
                cs
            );
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Analysis:");
    let _ = writeln!(out, "Total Context Switches: {context_switches}");
    let _ = writeln!(out, "Total Idle Time: {}", idle_time.format_time());

    if !tasks.is_empty() {
        let _ = writeln!(out, "Turnaround Times:");
        for task in tasks {
            let num_jobs = hyperperiod / task.period;
            let mut total = 0.0;
            let mut counted = 0;
            for job_id in 1..=num_jobs {
                let release = task.arrival + (job_id - 1) * task.period;
                let release_t = T::from_ticks(release);
                let finish = entries
                    .iter()
                    .filter(|e| e.task_id == task.id && e.job_id as i64 == job_id)
                    .map(|e| e.end)
                    .fold(None, |acc: Option<T>, v| match acc {
                        None => Some(v),
                        Some(a) => Some(if v.as_f64() > a.as_f64() { v } else { a }),
                    });
                if let Some(finish_t) = finish {
                    let turnaround = finish_t - release_t;
                    let _ = writeln!(out, "  T{} Job {}: {}", task.id, job_id, turnaround.format_time());
                    total += turnaround.as_f64();
                    counted += 1;
                }
            }
            if counted > 0 {
                let _ = writeln!(out, "  Average for T{}: {:.2}", task.id, total / counted as f64);
            }
        }
    }

    out
}
