//! Prodex Store - persistence for product models
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - Component repository storing encoded document trees with digests
//! - Model file format v0 (YAML) parser and importer

pub mod db;
pub mod errors;
pub mod migrations;
pub mod model_file;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use model_file::{load_model_file, ModelFileV0};
pub use repo::SqliteComponentRepo;
