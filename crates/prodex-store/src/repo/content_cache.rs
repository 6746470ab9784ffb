//! Decoded component cache
//!
//! Entries are keyed by handle and remember the row stamp they were decoded
//! from. A lookup with a different stamp drops the entry.

use prodex_core::model::ProductComponent;
use std::collections::HashMap;

/// Cheap identity of a stored row revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStamp {
    pub modified_at: i64,
    pub digest: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<String, (RowStamp, ProductComponent)>,
    stats: CacheStats,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached component for `handle` if it was decoded from `stamp`
    pub fn get(&mut self, handle: &str, stamp: &RowStamp) -> Option<ProductComponent> {
        match self.entries.get(handle) {
            Some((cached, component)) if cached == stamp => {
                self.stats.hits += 1;
                Some(component.clone())
            }
            Some(_) => {
                self.entries.remove(handle);
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, handle: &str, stamp: RowStamp, component: ProductComponent) {
        self.entries.insert(handle.to_string(), (stamp, component));
    }

    pub fn invalidate(&mut self, handle: &str) {
        self.entries.remove(handle);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
