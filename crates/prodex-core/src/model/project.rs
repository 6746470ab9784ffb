use serde::{Deserialize, Serialize};

/// Project - a visibility scope for types
///
/// Types declared in a project can see the types of the project itself and
/// of every project reachable through `dependencies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    /// Names of the projects this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, project: impl Into<String>) -> Self {
        self.dependencies.push(project.into());
        self
    }
}

/// Enumeration datatype with a closed list of values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDatatype {
    /// Qualified name (the last segment is used in formulas)
    pub name: String,

    pub values: Vec<String>,
}

impl EnumDatatype {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Name as written in formula text
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}
