//! Prodex Core - product model kernel
//!
//! In-memory model of policy and product type hierarchies and the product
//! components that configure them:
//! - type hierarchy navigation with cycle-tolerant walks
//! - association, duplicate property, type and component validation
//! - product structures built from component links
//! - deep copy of component structures
//! - formula parameter resolution
//! - document encoding for persistence

pub mod cache;
pub mod copy;
pub mod errors;
pub mod formula;
pub mod hierarchy;
pub mod logging_facility;
pub mod model;
pub mod notify;
pub mod ops;
pub mod persistence;
pub mod rules;
pub mod settings;
pub mod structure;

// Re-export commonly used types
pub use cache::ValidationCache;
pub use copy::{CopyOutcome, CopyRequest, DeepCopyEngine, PersistenceTarget};
pub use errors::{ProdexError, PxError, PxErrorKind, Result};
pub use formula::{resolve_parameters, CompileOutcome, FormulaCompiler, FormulaContext};
pub use model::{Association, Attribute, ProductComponent, Type, TypeKind};
pub use notify::{ChangeBroadcaster, ChangeEvent, ChangeListener};
pub use ops::ModelStore;
pub use rules::{Message, MessageCode, MessageList, Severity};
pub use settings::ModelSettings;
pub use structure::{ComponentSource, NodeId, ProductStructure};
