//! Canonical logging macros

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use prodex_core::log_op_start;
/// log_op_start!("validate_type");
/// log_op_start!("validate_type", type_name = "motor.Policy");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = prodex_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = prodex_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use prodex_core::log_op_end;
/// log_op_end!("validate_type", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = prodex_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = prodex_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into a `PxError` so the stable code is logged.
///
/// # Example
///
/// ```
/// # use prodex_core::{log_op_error, errors::ProdexError};
/// let err = ProdexError::TypeNotFound { type_name: "x.Y".to_string() };
/// log_op_error!("validate_type", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::PxError;
        let px_err: PxError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = prodex_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?px_err.kind(),
            err_code = px_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::PxError;
        let px_err: PxError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = prodex_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?px_err.kind(),
            err_code = px_err.code(),
            $($field)*
        );
    }};
}
