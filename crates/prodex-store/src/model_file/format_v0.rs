//! Model File Format v0 schema
//!
//! A YAML document listing projects, enum datatypes, types and product
//! components. Entities embed the core model's own serde form.

use prodex_core::model::{EnumDatatype, ProductComponent, Project, Type};
use serde::{Deserialize, Serialize};

/// Root model file structure (schema version 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFileV0 {
    pub schema_version: u32,

    /// Project assigned to types and components that name none
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default)]
    pub enums: Vec<EnumDatatype>,

    #[serde(default)]
    pub types: Vec<Type>,

    #[serde(default)]
    pub components: Vec<ProductComponent>,
}

impl ModelFileV0 {
    /// Fill in the default project where an entity leaves it empty
    pub fn apply_default_project(&mut self) {
        let Some(project) = self.project.clone() else {
            return;
        };
        for ty in &mut self.types {
            if ty.project.is_empty() {
                ty.project = project.clone();
            }
        }
        for component in &mut self.components {
            if component.project.is_empty() {
                component.project = project.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodex_core::model::TypeKind;

    #[test]
    fn test_minimal_model_file() {
        let yaml = r#"
schema_version: 0
types:
  - qualified_name: motor.MotorPolicy
    kind: policy
"#;
        let file: ModelFileV0 = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.schema_version, 0);
        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].kind, TypeKind::Policy);
        assert!(file.components.is_empty());
    }

    #[test]
    fn test_default_project_only_fills_gaps() {
        let yaml = r#"
schema_version: 0
project: motor
types:
  - qualified_name: motor.MotorPolicy
    kind: policy
  - qualified_name: base.Policy
    kind: policy
    project: base
components:
  - name: motor.Basic
    policy_type: motor.MotorPolicy
"#;
        let mut file: ModelFileV0 = serde_yaml::from_str(yaml).unwrap();
        file.apply_default_project();
        assert_eq!(file.types[0].project, "motor");
        assert_eq!(file.types[1].project, "base");
        assert_eq!(file.components[0].project, "motor");
    }
}
