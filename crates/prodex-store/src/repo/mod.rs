//! Repository layer for persisting product components to SQLite
//!
//! Components are stored as encoded document trees next to their digest;
//! reads go through a content cache checked against each row's stamp.

pub mod content_cache;
pub mod sqlite_repo;

pub use content_cache::{CacheStats, ContentCache, RowStamp};
pub use sqlite_repo::SqliteComponentRepo;
