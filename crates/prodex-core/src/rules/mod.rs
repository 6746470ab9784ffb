//! Model validation rules
//!
//! Each rule set inspects one kind of model element and returns its
//! findings as a `MessageList`.

pub mod association_rules;
pub mod component_rules;
pub mod duplicate_property;
pub mod messages;
pub mod type_rules;

pub use association_rules::{
    find_constrainable_association_candidates, find_derived_union_candidates,
    find_matching_association, validate_association, validate_associations,
};
pub use component_rules::{validate_component, validate_component_cached};
pub use duplicate_property::validate_duplicate_properties;
pub use messages::{Message, MessageCode, MessageList, ObjectProperty, Severity};
pub use type_rules::{check_type, validate_type, validate_type_cached};
