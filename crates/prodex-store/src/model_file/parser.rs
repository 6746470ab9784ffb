//! Model file parser with validation
//!
//! Parses YAML and validates the schema version, name uniqueness and the
//! references a model file must resolve on its own.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, model_file_validation, Result};
use crate::model_file::format_v0::ModelFileV0;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parse a model file from a path
pub fn parse_model_file(path: &Path) -> Result<ModelFileV0> {
    let content = fs::read_to_string(path).map_err(|e| io_error("read_model_file", e))?;
    parse_model_str(&content)
}

/// Parse a model file from a string
pub fn parse_model_str(content: &str) -> Result<ModelFileV0> {
    let mut file: ModelFileV0 = serde_yaml::from_str(content)
        .map_err(|e| model_file_validation(&format!("YAML parse error: {}", e)))?;

    validate_model_file(&file)?;
    file.apply_default_project();
    Ok(file)
}

fn validate_model_file(file: &ModelFileV0) -> Result<()> {
    if file.schema_version != 0 {
        return Err(model_file_validation(&format!(
            "Unsupported schema_version: {}. Expected 0",
            file.schema_version
        )));
    }

    let projects = unique_names("project", file.projects.iter().map(|p| p.name.as_str()))?;
    unique_names("enum", file.enums.iter().map(|e| e.name.as_str()))?;
    let types = unique_names("type", file.types.iter().map(|t| t.qualified_name.as_str()))?;
    unique_names("component", file.components.iter().map(|c| c.name.as_str()))?;

    for project in &file.projects {
        for dependency in &project.dependencies {
            if !projects.contains(dependency.as_str()) {
                return Err(model_file_validation(&format!(
                    "Project {} depends on undeclared project {}",
                    project.name, dependency
                )));
            }
        }
    }

    if let Some(default) = &file.project {
        if !projects.is_empty() && !projects.contains(default.as_str()) {
            return Err(model_file_validation(&format!(
                "Default project {} is not declared",
                default
            )));
        }
    }

    // Supertypes and twins may live in another model file; a component's
    // policy type may not.
    for component in &file.components {
        if !types.contains(component.policy_type.as_str()) {
            return Err(model_file_validation(&format!(
                "Component {} references unknown policy type {}",
                component.name, component.policy_type
            )));
        }
        let mut dates = HashSet::new();
        for generation in &component.generations {
            if !dates.insert(generation.valid_from) {
                return Err(model_file_validation(&format!(
                    "Component {} has two generations valid from {}",
                    component.name, generation.valid_from
                )));
            }
        }
    }

    Ok(())
}

fn unique_names<'a>(
    what: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(model_file_validation(&format!(
                "Duplicate {} name: {}",
                what, name
            )));
        }
    }
    Ok(seen)
}
