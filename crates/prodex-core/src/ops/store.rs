use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{ProdexError, Result};
use crate::model::{EnumDatatype, ProductComponent, Project, Type};

/// In-memory project index for types, datatypes and product components
///
/// Single-threaded, like the rest of the kernel. Every mutation bumps the
/// modification stamp, which is what validation caches key their validity on.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    pub(crate) projects: BTreeMap<String, Project>,
    pub(crate) types: BTreeMap<String, Type>,
    pub(crate) enums: BTreeMap<String, EnumDatatype>,
    pub(crate) components: BTreeMap<String, ProductComponent>,
    stamp: u64,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current modification stamp
    pub fn modification_stamp(&self) -> u64 {
        self.stamp
    }

    /// Record a modification made outside the insert/get_mut API
    pub fn touch(&mut self) {
        self.stamp += 1;
    }

    // ===== Projects =====

    pub fn insert_project(&mut self, project: Project) {
        self.projects.insert(project.name.clone(), project);
        self.touch();
    }

    /// Get a project by name
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` if no project with that name is registered.
    pub fn get_project(&self, name: &str) -> Result<&Project> {
        self.projects
            .get(name)
            .ok_or_else(|| ProdexError::ProjectNotFound {
                project: name.to_string(),
            })
    }

    /// Projects whose types are visible from `project`
    ///
    /// The project itself plus everything reachable through dependency
    /// edges. Dependency cycles are tolerated.
    pub fn visible_projects<'a>(&'a self, project: &'a str) -> BTreeSet<&'a str> {
        let mut visible = BTreeSet::new();
        let mut pending = vec![project];
        while let Some(name) = pending.pop() {
            if !visible.insert(name) {
                continue;
            }
            if let Some(p) = self.projects.get(name) {
                pending.extend(p.dependencies.iter().map(String::as_str));
            }
        }
        visible
    }

    // ===== Types =====

    pub fn insert_type(&mut self, ty: Type) {
        self.types.insert(ty.qualified_name.clone(), ty);
        self.touch();
    }

    /// Get a type by qualified name, ignoring project visibility
    ///
    /// # Errors
    ///
    /// Returns `TypeNotFound` if the type is not in the index.
    pub fn get_type(&self, name: &str) -> Result<&Type> {
        self.types
            .get(name)
            .ok_or_else(|| ProdexError::TypeNotFound {
                type_name: name.to_string(),
            })
    }

    /// Get a mutable reference to a type; bumps the modification stamp
    ///
    /// # Errors
    ///
    /// Returns `TypeNotFound` if the type is not in the index.
    pub fn get_type_mut(&mut self, name: &str) -> Result<&mut Type> {
        self.stamp += 1;
        self.types
            .get_mut(name)
            .ok_or_else(|| ProdexError::TypeNotFound {
                type_name: name.to_string(),
            })
    }

    /// Resolve a type name as seen from `project`
    ///
    /// Only types owned by a visible project match; a type that exists in an
    /// unrelated project is reported as absent.
    pub fn find_type(&self, project: &str, name: &str) -> Option<&Type> {
        let ty = self.types.get(name)?;
        if ty.project == project || self.visible_projects(project).contains(ty.project.as_str())
        {
            Some(ty)
        } else {
            None
        }
    }

    pub fn list_types(&self) -> Vec<&Type> {
        self.types.values().collect()
    }

    // ===== Datatypes =====

    pub fn insert_enum(&mut self, datatype: EnumDatatype) {
        self.enums.insert(datatype.name.clone(), datatype);
        self.touch();
    }

    /// Find an enum datatype by qualified or simple name
    pub fn find_enum(&self, name: &str) -> Option<&EnumDatatype> {
        self.enums
            .get(name)
            .or_else(|| self.enums.values().find(|e| e.simple_name() == name))
    }

    // ===== Product components =====

    pub fn insert_component(&mut self, component: ProductComponent) {
        self.components.insert(component.name.clone(), component);
        self.touch();
    }

    /// Get a product component by name
    ///
    /// # Errors
    ///
    /// Returns `ComponentNotFound` if no component has that name.
    pub fn get_component(&self, name: &str) -> Result<&ProductComponent> {
        self.components
            .get(name)
            .ok_or_else(|| ProdexError::ComponentNotFound {
                component_name: name.to_string(),
            })
    }

    /// Get a mutable reference to a component; bumps the modification stamp
    ///
    /// # Errors
    ///
    /// Returns `ComponentNotFound` if no component has that name.
    pub fn get_component_mut(&mut self, name: &str) -> Result<&mut ProductComponent> {
        self.stamp += 1;
        self.components
            .get_mut(name)
            .ok_or_else(|| ProdexError::ComponentNotFound {
                component_name: name.to_string(),
            })
    }

    /// Cheap existence check, no materialization
    pub fn component_exists(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn remove_component(&mut self, name: &str) -> Option<ProductComponent> {
        let removed = self.components.remove(name);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn list_components(&self) -> Vec<&ProductComponent> {
        self.components.values().collect()
    }
}
