//! Well-known task status names reported by the Wiro API.
//!
//! The same labels arrive as the `status` field of a polled task record
//! and as the `type` field of socket messages, so one classifier serves
//! both watch producers.

/// The task is being prepared on a worker.
pub const TASK_START: &str = "task_start";

/// Partial output from a running task.
pub const TASK_OUTPUT: &str = "task_output";

/// A non-fatal error line from a running task.
pub const TASK_ERROR: &str = "task_error";

/// The model finished; outputs may still be post-processing.
pub const TASK_END: &str = "task_end";

/// Post-processing finished and outputs are available.
pub const TASK_POSTPROCESS_END: &str = "task_postprocess_end";

/// The task was cancelled by the user.
pub const TASK_CANCEL: &str = "task_cancel";

/// The task failed and will not produce outputs.
pub const TASK_ERROR_FULL: &str = "task_error_full";

/// Statuses after which a task makes no further progress.
pub const TERMINAL_STATUSES: &[&str] = &[
    TASK_POSTPROCESS_END,
    TASK_CANCEL,
    TASK_END,
    TASK_ERROR_FULL,
];

/// Whether `status` is terminal. Unknown and empty values are not.
pub fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}
