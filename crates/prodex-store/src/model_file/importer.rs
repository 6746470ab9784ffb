//! Model file import
//!
//! Loads a model file into the in-memory index and, for `import_model_file`,
//! stores its product components in the component repository.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::model_file::format_v0::ModelFileV0;
use crate::model_file::parser::parse_model_file;
use crate::repo::SqliteComponentRepo;
use prodex_core::ops::ModelStore;
use prodex_core::{log_op_end, log_op_error, log_op_start};
use std::path::Path;
use std::time::Instant;

/// What an import wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub types: usize,
    pub components: usize,
    /// Components whose stored document changed
    pub written: Vec<String>,
}

/// Build the in-memory index for a parsed model file
pub fn build_model_store(file: ModelFileV0) -> ModelStore {
    let mut store = ModelStore::new();
    for project in file.projects {
        store.insert_project(project);
    }
    for datatype in file.enums {
        store.insert_enum(datatype);
    }
    for ty in file.types {
        store.insert_type(ty);
    }
    for component in file.components {
        store.insert_component(component);
    }
    store
}

/// Parse a model file and load it into a fresh index
pub fn load_model_file(path: &Path) -> Result<ModelStore> {
    log_op_start!("load_model_file", path = %path.display());
    let start = Instant::now();

    let store = parse_model_file(path)
        .map(build_model_store)
        .map_err(|e| {
            log_op_error!(
                "load_model_file",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "load_model_file",
        duration_ms = start.elapsed().as_millis() as u64,
        type_count = store.list_types().len(),
        component_count = store.list_components().len()
    );
    Ok(store)
}

/// Load a model file and store its components in the repository
///
/// Components whose stored digest already matches are left untouched.
/// Returns the index together with what was written.
pub fn import_model_file(
    path: &Path,
    repo: &mut SqliteComponentRepo,
) -> Result<(ModelStore, ImportSummary)> {
    let store = load_model_file(path)?;
    let written = repo.sync_components(store.list_components())?;

    let summary = ImportSummary {
        types: store.list_types().len(),
        components: store.list_components().len(),
        written,
    };
    Ok((store, summary))
}
