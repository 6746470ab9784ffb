pub mod association;
pub mod attribute;
pub mod component;
pub mod project;
pub mod types;

pub use association::{Association, AssociationKind, Cardinality};
pub use attribute::{Attribute, Modifier, ValueSet};
pub use component::{
    ConfigElement, ConfigValue, Formula, FormulaTestCase, FormulaTestInputValue, Generation,
    Link, ProductComponent, TableContentUsage,
};
pub use project::{EnumDatatype, Project};
pub use types::{Method, Parameter, Type, TypeKind};
