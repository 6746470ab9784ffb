//! SQLite component repository
//!
//! Owns a migrated connection. Implements `ComponentSource` so structures
//! can be built straight from the database, and `PersistenceTarget` so deep
//! copies commit into it in one transaction.

#![allow(clippy::result_large_err)]

use crate::db;
use crate::errors::{document_error, from_rusqlite, Result};
use crate::migrations::apply_migrations;
use crate::repo::content_cache::{CacheStats, ContentCache, RowStamp};
use prodex_core::copy::PersistenceTarget;
use prodex_core::errors::{ProdexError, PxError};
use prodex_core::model::ProductComponent;
use prodex_core::persistence::{decode_component, document_digest, encode_component};
use prodex_core::structure::ComponentSource;
use prodex_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

pub struct SqliteComponentRepo {
    conn: Connection,
    cache: RefCell<ContentCache>,
    /// Edits staged in memory and not yet flushed
    staged: BTreeMap<String, ProductComponent>,
}

impl SqliteComponentRepo {
    /// Open (and migrate) the repository database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = db::open(path)?;
        db::configure(&conn)?;
        Self::from_connection(conn)
    }

    /// In-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn,
            cache: RefCell::new(ContentCache::new()),
            staged: BTreeMap::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or replace one component
    ///
    /// Returns whether the stored document changed.
    pub fn save(&mut self, component: &ProductComponent) -> Result<bool> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let changed = upsert_tx(&tx, component)?;
        tx.commit().map_err(from_rusqlite)?;

        if changed {
            self.cache.borrow_mut().invalidate(&component.name);
        }
        Ok(changed)
    }

    /// Upsert many components in one transaction
    ///
    /// Rows whose digest already matches are not touched. Returns the
    /// handles that were written.
    pub fn sync_components<'a, I>(&mut self, components: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a ProductComponent>,
    {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let mut written = Vec::new();
        for component in components {
            if upsert_tx(&tx, component)? {
                written.push(component.name.clone());
            }
        }
        tx.commit().map_err(from_rusqlite)?;

        let mut cache = self.cache.borrow_mut();
        for handle in &written {
            cache.invalidate(handle);
        }
        Ok(written)
    }

    /// Load the stored revision of a component
    ///
    /// Staged edits are not visible here; see `load_component`.
    pub fn load(&self, handle: &str) -> Result<Option<ProductComponent>> {
        let Some(stamp) = self.stamp(handle)? else {
            self.cache.borrow_mut().invalidate(handle);
            return Ok(None);
        };

        if let Some(component) = self.cache.borrow_mut().get(handle, &stamp) {
            return Ok(Some(component));
        }

        let document: String = self
            .conn
            .query_row(
                "SELECT document FROM components WHERE handle = ?1",
                [handle],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        let component = decode_component(&document).map_err(|e| document_error(handle, e))?;

        self.cache
            .borrow_mut()
            .insert(handle, stamp, component.clone());
        Ok(Some(component))
    }

    /// Digest of the stored document, if the handle exists
    pub fn digest(&self, handle: &str) -> Result<Option<String>> {
        Ok(self.stamp(handle)?.map(|s| s.digest))
    }

    pub fn list_handles(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT handle FROM components ORDER BY handle")
            .map_err(from_rusqlite)?;
        let handles = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(handles)
    }

    /// Delete a stored component; returns whether a row existed
    pub fn delete(&mut self, handle: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM components WHERE handle = ?1", [handle])
            .map_err(from_rusqlite)?;
        self.cache.borrow_mut().invalidate(handle);
        self.staged.remove(handle);
        Ok(removed > 0)
    }

    /// Stage an edit in memory; the handle is dirty until flushed
    pub fn stage(&mut self, component: ProductComponent) {
        self.staged.insert(component.name.clone(), component);
    }

    /// Write all staged edits in one transaction
    pub fn flush(&mut self) -> Result<Vec<String>> {
        let staged = std::mem::take(&mut self.staged);
        match self.sync_components(staged.values()) {
            Ok(written) => Ok(written),
            Err(e) => {
                self.staged = staged;
                Err(e)
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    fn stamp(&self, handle: &str) -> Result<Option<RowStamp>> {
        self.conn
            .query_row(
                "SELECT modified_at, digest FROM components WHERE handle = ?1",
                [handle],
                |row| {
                    Ok(RowStamp {
                        modified_at: row.get(0)?,
                        digest: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(from_rusqlite)
    }

    fn write_batch_impl(&mut self, components: &[ProductComponent]) -> Result<()> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        for component in components {
            if exists_tx(&tx, &component.name)? {
                // Dropping the transaction rolls back earlier inserts.
                return Err(ProdexError::HandleAlreadyExists {
                    handle: component.name.clone(),
                }
                .into());
            }
            insert_tx(&tx, component)?;
        }
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }
}

fn exists_tx(tx: &Transaction, handle: &str) -> Result<bool> {
    let found: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM components WHERE handle = ?1",
            [handle],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(found.is_some())
}

fn insert_tx(tx: &Transaction, component: &ProductComponent) -> Result<()> {
    let document = encode_component(component)?;
    let digest = document_digest(&document);
    tx.execute(
        "INSERT INTO components (handle, policy_type, project, document, digest, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            component.name,
            component.policy_type,
            component.project,
            document,
            digest,
            chrono::Utc::now().timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Insert or update; returns false when the stored digest already matches
fn upsert_tx(tx: &Transaction, component: &ProductComponent) -> Result<bool> {
    let document = encode_component(component)?;
    let digest = document_digest(&document);

    let stored: Option<String> = tx
        .query_row(
            "SELECT digest FROM components WHERE handle = ?1",
            [&component.name],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;
    if stored.as_deref() == Some(digest.as_str()) {
        return Ok(false);
    }

    tx.execute(
        "INSERT INTO components (handle, policy_type, project, document, digest, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(handle) DO UPDATE SET
            policy_type = excluded.policy_type,
            project = excluded.project,
            document = excluded.document,
            digest = excluded.digest,
            modified_at = excluded.modified_at",
        rusqlite::params![
            component.name,
            component.policy_type,
            component.project,
            document,
            digest,
            chrono::Utc::now().timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(true)
}

impl ComponentSource for SqliteComponentRepo {
    fn load_component(&self, name: &str) -> std::result::Result<Option<ProductComponent>, PxError> {
        if let Some(staged) = self.staged.get(name) {
            return Ok(Some(staged.clone()));
        }
        self.load(name)
    }
}

impl PersistenceTarget for SqliteComponentRepo {
    fn exists(&self, handle: &str) -> std::result::Result<bool, PxError> {
        Ok(self.staged.contains_key(handle) || self.stamp(handle)?.is_some())
    }

    fn is_dirty(&self, handle: &str) -> std::result::Result<bool, PxError> {
        Ok(self.staged.contains_key(handle))
    }

    /// Insert every component in one transaction, or none
    fn write_batch(
        &mut self,
        components: Vec<ProductComponent>,
    ) -> std::result::Result<(), PxError> {
        log_op_start!("write_batch", component_count = components.len());
        let start = Instant::now();

        self.write_batch_impl(&components).map_err(|e| {
            log_op_error!(
                "write_batch",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "write_batch",
            duration_ms = start.elapsed().as_millis() as u64,
            component_count = components.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use prodex_core::model::{Generation, Link};

    fn component(name: &str) -> ProductComponent {
        let mut c = ProductComponent::new(name, "motor.MotorPolicy");
        let mut g = Generation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        g.add_link(Link::new("Coverage", "motor.Collision"));
        c.add_generation(g);
        c
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut repo = SqliteComponentRepo::in_memory().unwrap();
        assert!(repo.save(&component("motor.Basic")).unwrap());
        assert_eq!(repo.load("motor.Basic").unwrap(), Some(component("motor.Basic")));
        assert_eq!(repo.load("motor.Missing").unwrap(), None);
    }

    #[test]
    fn test_unchanged_save_is_skipped() {
        let mut repo = SqliteComponentRepo::in_memory().unwrap();
        assert!(repo.save(&component("motor.Basic")).unwrap());
        assert!(!repo.save(&component("motor.Basic")).unwrap());
    }

    #[test]
    fn test_staged_edit_is_dirty_until_flushed() {
        let mut repo = SqliteComponentRepo::in_memory().unwrap();
        repo.stage(component("motor.Basic"));
        assert!(repo.is_dirty("motor.Basic").unwrap());
        assert!(repo.exists("motor.Basic").unwrap());
        assert_eq!(repo.load("motor.Basic").unwrap(), None);

        assert_eq!(repo.flush().unwrap(), vec!["motor.Basic"]);
        assert!(!repo.is_dirty("motor.Basic").unwrap());
        assert!(repo.load("motor.Basic").unwrap().is_some());
    }
}
