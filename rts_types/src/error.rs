//! Errors raised while constructing or parsing the shared scheduling types.
//!
//! Mirrors `satellite_ocs::errors::OcsError`'s use of `thiserror` for a flat,
//! display-ready error enum rather than a generic string error.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RtsTypesError {
    #[error("task {id}: period must be > 0, got {period}")]
    NonPositivePeriod { id: u32, period: i64 },

    #[error("task {id}: arrival must be >= 0, got {arrival}")]
    NegativeArrival { id: u32, arrival: i64 },

    #[error("task {id}: wcet ({wcet}) must not exceed period ({period})")]
    WcetExceedsPeriod { id: u32, wcet: i64, period: i64 },

    #[error("task {id}: actual execution time must be >= 0, got {actual}")]
    NegativeActual { id: u32, actual: f64 },

    #[error("task set has {count} tasks, exceeding the {limit} bound")]
    TooManyTasks { count: usize, limit: usize },

    #[error("hyperperiod has {count} jobs, exceeding the {limit} bound")]
    TooManyJobs { count: usize, limit: usize },

    #[error("could not parse task line {line_no} ({line:?}): {reason}")]
    MalformedTaskLine {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("could not parse actual-time line {line_no} ({line:?}): {reason}")]
    MalformedActualLine {
        line_no: usize,
        line: String,
        reason: String,
    },
}
