//! Structured logging helpers.
//!
//! Every job and target log line carries the same field names so logs can be
//! joined with bus events and dispatch records:
//! - `subsystem`: emitting subsystem (capability-store, orchestrator, ...)
//! - `job_id` / `target_id`: the entity the line is about
//! - additional context fields

/// Log a job-related event with standard fields.
///
/// ```rust,ignore
/// log_job_event!(info, "orchestrator", "Job approved", job.id, job.target_id, margin = 0.4);
/// ```
#[macro_export]
macro_rules! log_job_event {
    ($level:ident, $subsystem:expr, $msg:expr, $job_id:expr, $target_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            job_id = %$job_id,
            target_id = %$target_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a target-related event with standard fields.
#[macro_export]
macro_rules! log_target_event {
    ($level:ident, $subsystem:expr, $msg:expr, $target_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            target_id = %$target_id,
            $($($field)*,)?
            $msg
        )
    };
}
