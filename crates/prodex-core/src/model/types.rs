use serde::{Deserialize, Serialize};

use super::association::Association;
use super::attribute::Attribute;

/// Which of the twin hierarchies a type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Policy-side type (instances are contracts/coverages)
    Policy,
    /// Product-side type (instances are product components)
    Product,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Policy => "policy",
            TypeKind::Product => "product",
        }
    }

    /// The kind of the twin hierarchy
    pub fn twin(&self) -> TypeKind {
        match self {
            TypeKind::Policy => TypeKind::Product,
            TypeKind::Product => TypeKind::Policy,
        }
    }
}

/// Type - a node in the policy or product type hierarchy
///
/// Owns its attributes, associations and methods. The supertype and the
/// configured twin are name-based references resolved through the project
/// index at use time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    /// Qualified name, unique within the index (e.g. `motor.MotorPolicy`)
    pub qualified_name: String,

    /// Policy or product side
    pub kind: TypeKind,

    /// Project that owns this type
    #[serde(default)]
    pub project: String,

    /// Qualified name of the supertype, if any
    #[serde(default)]
    pub supertype: Option<String>,

    #[serde(default)]
    pub is_abstract: bool,

    /// Qualified name of the twin type (policy -> product, product -> policy)
    #[serde(default)]
    pub configures: Option<String>,

    #[serde(default)]
    pub attributes: Vec<Attribute>,

    #[serde(default)]
    pub associations: Vec<Association>,

    #[serde(default)]
    pub methods: Vec<Method>,
}

impl Type {
    /// Create a new concrete type without supertype, twin or parts
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            project: String::new(),
            supertype: None,
            is_abstract: false,
            configures: None,
            attributes: Vec::new(),
            associations: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Name without the package prefix
    pub fn unqualified_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn has_supertype(&self) -> bool {
        self.supertype.is_some()
    }

    /// A type is configurable when it is linked to a twin type
    pub fn is_configurable(&self) -> bool {
        self.configures.is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Own association by singular role name
    pub fn association(&self, role_singular: &str) -> Option<&Association> {
        self.associations
            .iter()
            .find(|a| a.target_role_singular == role_singular)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Own formula signature by name
    pub fn formula_signature(&self, name: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.formula_signature && m.name == name)
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn add_association(&mut self, association: Association) {
        self.associations.push(association);
    }

    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }
}

/// A method parameter (name + datatype reference)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub datatype: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
        }
    }
}

/// Method declared on a type
///
/// On product types a method flagged as `formula_signature` declares a
/// formula: product components supply its expression and the parameters are
/// what that expression may reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,

    /// Result datatype
    pub datatype: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub formula_signature: bool,
}

impl Method {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            parameters: Vec::new(),
            formula_signature: false,
        }
    }

    /// Create a formula signature with the given parameters
    pub fn formula(
        name: impl Into<String>,
        datatype: impl Into<String>,
        parameters: Vec<Parameter>,
    ) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            parameters,
            formula_signature: true,
        }
    }
}
