//! Runtime configuration and CLI surface (§6.1), generalizing the
//! existing `Cli`/`Config` split: a `clap`-derived `Cli` is parsed once
//! in `main` and resolved into the `Config` the rest of the crate reads.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Mode {
    Edf,
    Rmrcs,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rts_core",
    about = "Live EDF priority controller / offline RM-RCS simulator"
)]
pub struct Cli {
    /// `edf` for the live controller demo, `rmrcs` for the offline
    /// simulator. Omit with `--interactive` to get the original
    /// `{1, 2}` menu prompt instead.
    #[arg(value_enum)]
    pub mode: Option<Mode>,

    /// Reproduce the reference demo's single-character `{1, 2}` menu
    /// instead of requiring `mode` on the command line.
    #[arg(long)]
    pub interactive: bool,

    #[arg(long, default_value = "tasks.txt")]
    pub tasks: String,

    /// Optional actual-execution-time file; supplying it switches the
    /// RM-RCS engine to the `f64` (actual-time) instantiation.
    #[arg(long)]
    pub actual: Option<String>,

    /// Defaults to `schedule.txt`, or `schedule3.txt` when `--actual`
    /// is supplied (matching the reference's two program names).
    #[arg(long)]
    pub schedule_out: Option<String>,

    #[arg(long, default_value_t = DEFAULT_CHECK_PERIOD_MS)]
    pub check_period_ms: u64,

    #[arg(long, default_value_t = DEFAULT_BASE_PRIORITY)]
    pub base_priority: u8,

    /// Overrides the three EDF demo periods, in milliseconds
    /// (default matches scenario S4: Temp=500, Pressure=1000, Height=750).
    #[arg(long, value_delimiter = ',')]
    pub edf_periods: Option<Vec<u64>>,

    /// Additionally emit the RM-RCS schedule as JSON alongside the
    /// documented text grammar.
    #[arg(long)]
    pub json: bool,
}

pub const DEFAULT_CHECK_PERIOD_MS: u64 = 50;
pub const DEFAULT_BASE_PRIORITY: u8 = 1;
pub const DEFAULT_EDF_PERIODS_MS: [u64; 3] = [500, 1000, 750];
pub const FEASIBILITY_EPSILON: f64 = rts_types::time::EPSILON;

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub tasks_path: String,
    pub actual_path: Option<String>,
    pub schedule_out: String,
    pub check_period_ms: u64,
    pub base_priority: u8,
    pub edf_periods: [u64; 3],
    pub json: bool,
}

impl Cli {
    /// Resolve into a [`Config`], returning `None` for `mode` when the
    /// caller must still run the interactive `{1, 2}` prompt.
    pub fn resolve(self) -> Config {
        let mode = self.mode.unwrap_or(Mode::Edf);

        let schedule_out = self.schedule_out.unwrap_or_else(|| {
            if self.actual.is_some() {
                "schedule3.txt".to_string()
            } else {
                "schedule.txt".to_string()
            }
        });

        let mut edf_periods = DEFAULT_EDF_PERIODS_MS;
        if let Some(overrides) = &self.edf_periods {
            for (slot, value) in edf_periods.iter_mut().zip(overrides.iter()) {
                *slot = *value;
            }
        }

        Config {
            mode,
            tasks_path: self.tasks,
            actual_path: self.actual,
            schedule_out,
            check_period_ms: self.check_period_ms,
            base_priority: self.base_priority,
            edf_periods,
            json: self.json,
        }
    }

    pub fn needs_interactive_prompt(&self) -> bool {
        self.interactive || self.mode.is_none()
    }
}

/// Reproduce the reference demo's single-character `{1 = EDF, 2 = RM-RCS}`
/// menu (§6 "CLI (demo)").
pub fn prompt_interactive_choice() -> Result<Mode> {
    print!("Select demo: 1) EDF  2) RM-RCS\n> ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    match line.trim().chars().next() {
        Some('1') => Ok(Mode::Edf),
        Some('2') => Ok(Mode::Rmrcs),
        _ => Err(anyhow::anyhow!("invalid selection: expected 1 or 2")),
    }
}
