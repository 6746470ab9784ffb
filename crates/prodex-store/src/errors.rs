//! Error handling for prodex-store
//!
//! Wraps prodex-core PxError with store-specific helpers

use prodex_core::errors::{ProdexError, PxError, PxErrorKind};

/// Result type alias using PxError
pub type Result<T> = std::result::Result<T, PxError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> PxError {
    PxError::new(PxErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> PxError {
    PxError::new(PxErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a model file validation error
pub fn model_file_validation(reason: &str) -> PxError {
    PxError::new(PxErrorKind::InvalidInput)
        .with_op("model_file_parse")
        .with_message(reason.to_string())
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> PxError {
    PxError::new(PxErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> PxError {
    PxError::new(PxErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Wrap a stored document that could not be decoded
pub fn document_error(handle: &str, err: ProdexError) -> PxError {
    let cause: PxError = err.into();
    PxError::new(cause.kind())
        .with_op("load_component")
        .with_entity_id(handle)
        .with_message(format!("Stored document of {} is unreadable", handle))
        .with_source(cause)
}
