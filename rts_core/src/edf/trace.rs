//! Exact-grammar EDF trace lines (§6 "Trace output"), printed straight
//! to stdout the way the reference's `printf`/`fflush` pairs are. This
//! is a documented wire format, not a log level, so it stays separate
//! from the `tracing` diagnostics emitted elsewhere in this module.

use crate::kernel::Tick;

const NAME_WIDTH: usize = 12;
const TICK_WIDTH: usize = 5;

pub fn job_start(name: &str, tick: Tick, job: u32, deadline: Tick) {
    println!(
        "[{name:NAME_WIDTH$}] Tick={tick:<TICK_WIDTH$} START Job {job} (Deadline:{deadline})"
    );
}

pub fn job_end(name: &str, tick: Tick, job: u32, value: i64) {
    println!("[{name:NAME_WIDTH$}] Tick={tick:<TICK_WIDTH$} END Job {job} (Value:{value})");
}

pub fn priority_updates_header(tick: Tick) {
    println!("[Scheduler] Tick={tick:<TICK_WIDTH$} Priority Updates:");
}

pub fn priority_transition(name: &str, old: u8, new: u8, deadline: Tick) {
    println!("  - {name:NAME_WIDTH$}: {old} -> {new} (Deadline: {deadline})");
}

pub fn new_priority_order(order: &[(&str, u8)]) {
    let rendered = order
        .iter()
        .map(|(name, prio)| format!("{name}({prio})"))
        .collect::<Vec<_>>()
        .join(" > ");
    println!("  New Priority Order: {rendered}");
}

pub fn context_switch(new_name: &str, old_name: &str) {
    println!("  Context Switch: {new_name} preempts {old_name} (earlier deadline)");
}

pub fn summary(hyperperiod: Tick) {
    println!("[Scheduler] Hyperperiod {hyperperiod} exceeded, stopping.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_padding_matches_grammar() {
        // Exercised for the side effect of not panicking on format specs;
        // the printed grammar itself is asserted end-to-end in edf::tests.
        job_start("TempTask", 0, 1, 500);
        job_end("TempTask", 10, 1, 42);
        priority_updates_header(0);
        priority_transition("TempTask", 1, 3, 500);
        new_priority_order(&[("TempTask", 3), ("HeightTask", 2), ("PressureTask", 1)]);
        context_switch("TempTask", "HeightTask");
    }
}
