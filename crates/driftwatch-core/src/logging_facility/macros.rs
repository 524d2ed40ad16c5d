//! Canonical logging macros
//!
//! Every operation boundary logs exactly one `start` and one `end` or
//! `end_error` event with the same `op` name.

/// Log the start of an operation
///
/// ```
/// # use driftwatch_core::log_op_start;
/// log_op_start!("analyze_drift");
/// log_op_start!("analyze_drift", tenant_id = "t1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = driftwatch_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = driftwatch_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use driftwatch_core::log_op_end;
/// log_op_end!("analyze_drift", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = driftwatch_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = driftwatch_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error from a borrowed [`ExError`](crate::errors::ExError)
///
/// ```
/// # use driftwatch_core::log_op_error;
/// # use driftwatch_core::errors::{ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::NotFound).with_message("snapshot not found");
/// log_op_error!("resolve_snapshots", &err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: &$crate::errors::ExError = $err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = driftwatch_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: &$crate::errors::ExError = $err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = driftwatch_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message(),
            $($field)*
        );
    }};
}
