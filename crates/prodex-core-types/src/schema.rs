//! Canonical schema constants for structured logging and events
//!
//! These constants keep log output consistent across the model kernel,
//! the store and the CLI.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_TYPE_NAME: &str = "type_name";
pub const FIELD_COMPONENT_NAME: &str = "component_name";
pub const FIELD_HANDLE: &str = "handle";

// Collection sizes
pub const FIELD_NODE_COUNT: &str = "node_count";
pub const FIELD_MESSAGE_COUNT: &str = "message_count";
pub const FIELD_COPY_COUNT: &str = "copy_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_TYPE_NAME.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_error_field_keys_match_macro_output() {
        assert_eq!(FIELD_ERR_KIND, "err_kind");
        assert_eq!(FIELD_ERR_CODE, "err_code");
    }
}
