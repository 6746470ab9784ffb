//! Model files
//!
//! Provides:
//! - Model File Format v0 schema
//! - YAML parser with validation
//! - Importer into the in-memory index and the component repository

pub mod format_v0;
pub mod importer;
pub mod parser;

pub use format_v0::ModelFileV0;
pub use importer::{build_model_store, import_model_file, load_model_file, ImportSummary};
pub use parser::{parse_model_file, parse_model_str};
