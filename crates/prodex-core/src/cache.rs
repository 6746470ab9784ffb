//! Validation result cache
//!
//! Results are keyed by object part and are valid for exactly one model
//! modification stamp. Any stamp change drops every entry: cross-object
//! dependencies are not tracked, so a change anywhere may affect any result.

use std::collections::HashMap;

use crate::rules::messages::MessageList;

pub fn type_key(type_name: &str) -> String {
    format!("type:{}", type_name)
}

pub fn component_key(component_name: &str) -> String {
    format!("component:{}", component_name)
}

#[derive(Debug, Default)]
pub struct ValidationCache {
    stamp: Option<u64>,
    entries: HashMap<String, MessageList>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries if they were computed for a different stamp
    fn sync(&mut self, stamp: u64) {
        if self.stamp != Some(stamp) {
            if !self.entries.is_empty() {
                tracing::debug!(
                    entries = self.entries.len(),
                    stamp,
                    "validation cache invalidated"
                );
            }
            self.entries.clear();
            self.stamp = Some(stamp);
        }
    }

    /// Cached result for `key`, if still valid at `stamp`
    pub fn get(&mut self, stamp: u64, key: &str) -> Option<&MessageList> {
        self.sync(stamp);
        self.entries.get(key)
    }

    pub fn insert(&mut self, stamp: u64, key: impl Into<String>, messages: MessageList) {
        self.sync(stamp);
        self.entries.insert(key.into(), messages);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stamp = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
