//! Canonical logging macros
//!
//! Every engine operation brackets itself with a start event and exactly
//! one end or end_error event.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use cmdstack_core::log_op_start;
/// log_op_start!("do_command");
/// log_op_start!("do_command", cmd_name = "setPathValue");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use cmdstack_core::log_op_end;
/// log_op_end!("undo_command", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError`.
///
/// # Example
///
/// ```
/// # use cmdstack_core::{log_op_error, errors::CommandError};
/// let err = CommandError::NotRegistered { name: "missing".to_string() };
/// log_op_error!("create_command", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_severity = ex_err.severity().as_str(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_severity = ex_err.severity().as_str(),
            $($field)*
        );
    }};
}

/// Log an operation that had nothing to do
///
/// Used for log-only conditions such as an empty undo stack.
///
/// # Example
///
/// ```
/// # use cmdstack_core::log_op_skipped;
/// log_op_skipped!("undo_command", "nothing to undo");
/// ```
#[macro_export]
macro_rules! log_op_skipped {
    ($op:expr, $reason:expr) => {
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_SKIPPED,
            reason = $reason,
        );
    };
}
