//! Binary-level error type (§7.1), mirroring the reference's
//! `OcsError`: one flat `thiserror` enum wrapping I/O, the shared
//! vocabulary crate's parsing errors, and the one simulation-level
//! failure mode the main loop itself can raise.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RtsError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Types(#[from] rts_types::RtsTypesError),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "deadline missed: task {task_id} job {job_id} deadline {deadline} now {now} \
         (task set is not RM-feasible)"
    )]
    DeadlineMissed {
        task_id: u32,
        job_id: u32,
        deadline: f64,
        now: f64,
    },

    #[error("worker task join failed: {0}")]
    Join(String),
}
