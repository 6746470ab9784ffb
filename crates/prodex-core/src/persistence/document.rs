//! Tree document encoding of model entities
//!
//! Every persisted entity converts to and from a `DocumentNode`: a named
//! element with string attributes, ordered child elements and optional
//! text. Optional fields are encoded by attribute presence, so `None` and
//! `Some("")` survive a round trip as different values.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{ProdexError, Result};
use crate::model::{
    Association, AssociationKind, Attribute, Cardinality, ConfigElement, ConfigValue, Formula,
    FormulaTestCase, FormulaTestInputValue, Generation, Link, Method, Modifier, Parameter,
    ProductComponent, TableContentUsage, Type, TypeKind, ValueSet,
};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocumentNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the attribute only when a value is present
    pub fn with_opt_attr(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.attributes.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = DocumentNode>,
    {
        self.children.extend(children);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns `InvalidDocument` if the attribute is absent.
    pub fn required_attr(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| self.invalid(format!("missing attribute '{}'", key)))
    }

    /// Boolean attribute; absent means false
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` if the value is not `true` or `false`.
    pub fn bool_attr(&self, key: &str) -> Result<bool> {
        match self.attr(key) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(self.invalid(format!("'{}' is not a boolean: {}", key, other))),
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidDocument` if the value is not a non-negative number.
    pub fn u32_attr(&self, key: &str) -> Result<u32> {
        let text = self.required_attr(key)?;
        text.parse()
            .map_err(|_| self.invalid(format!("'{}' is not a number: {}", key, text)))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocumentNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&DocumentNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// # Errors
    ///
    /// Returns `InvalidDocument` if the node has a different name.
    pub fn expect_name(&self, name: &str) -> Result<()> {
        if self.name == name {
            Ok(())
        } else {
            Err(self.invalid(format!("expected <{}>", name)))
        }
    }

    pub fn invalid(&self, reason: impl Into<String>) -> ProdexError {
        ProdexError::InvalidDocument {
            node: self.name.clone(),
            reason: reason.into(),
        }
    }
}

pub trait ToDocumentNode {
    fn to_document_node(&self) -> DocumentNode;
}

pub trait FromDocumentNode: Sized {
    /// # Errors
    ///
    /// Returns `InvalidDocument` if the node does not describe a valid entity.
    fn from_document_node(node: &DocumentNode) -> Result<Self>;
}

fn decode_all<T: FromDocumentNode>(node: &DocumentNode, name: &str) -> Result<Vec<T>> {
    node.children_named(name).map(T::from_document_node).collect()
}

fn parse_date(node: &DocumentNode, key: &str) -> Result<NaiveDate> {
    let text = node.required_attr(key)?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| node.invalid(format!("'{}' is not a date: {}", key, e)))
}

fn parse_cardinality(node: &DocumentNode, key: &str) -> Result<Cardinality> {
    let text = node.required_attr(key)?;
    Cardinality::parse(text).ok_or_else(|| node.invalid(format!("'{}' is not a cardinality: {}", key, text)))
}

// ===== Types =====

impl ToDocumentNode for Type {
    fn to_document_node(&self) -> DocumentNode {
        DocumentNode::new("Type")
            .with_attr("qualified_name", &self.qualified_name)
            .with_attr("kind", self.kind.as_str())
            .with_attr("project", &self.project)
            .with_opt_attr("supertype", self.supertype.as_deref())
            .with_attr("abstract", self.is_abstract)
            .with_opt_attr("configures", self.configures.as_deref())
            .with_children(self.attributes.iter().map(ToDocumentNode::to_document_node))
            .with_children(self.associations.iter().map(ToDocumentNode::to_document_node))
            .with_children(self.methods.iter().map(ToDocumentNode::to_document_node))
    }
}

impl FromDocumentNode for Type {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("Type")?;
        let kind = match node.required_attr("kind")? {
            "policy" => TypeKind::Policy,
            "product" => TypeKind::Product,
            other => return Err(node.invalid(format!("unknown type kind '{}'", other))),
        };
        Ok(Self {
            qualified_name: node.required_attr("qualified_name")?.to_string(),
            kind,
            project: node.attr("project").unwrap_or_default().to_string(),
            supertype: node.attr("supertype").map(str::to_string),
            is_abstract: node.bool_attr("abstract")?,
            configures: node.attr("configures").map(str::to_string),
            attributes: decode_all(node, "Attribute")?,
            associations: decode_all(node, "Association")?,
            methods: decode_all(node, "Method")?,
        })
    }
}

impl ToDocumentNode for Attribute {
    fn to_document_node(&self) -> DocumentNode {
        let modifier = match self.modifier {
            Modifier::Published => "published",
            Modifier::Public => "public",
        };
        DocumentNode::new("Attribute")
            .with_attr("name", &self.name)
            .with_attr("datatype", &self.datatype)
            .with_opt_attr("default_value", self.default_value.as_deref())
            .with_attr("modifier", modifier)
            .with_attr("changing_over_time", self.changing_over_time)
            .with_attr("overwrite", self.overwrite)
            .with_child(value_set_node(&self.value_set))
    }
}

impl FromDocumentNode for Attribute {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("Attribute")?;
        let modifier = match node.attr("modifier").unwrap_or("published") {
            "published" => Modifier::Published,
            "public" => Modifier::Public,
            other => return Err(node.invalid(format!("unknown modifier '{}'", other))),
        };
        let value_set = match node.child("ValueSet") {
            Some(child) => decode_value_set(child)?,
            None => ValueSet::Unrestricted,
        };
        Ok(Self {
            name: node.required_attr("name")?.to_string(),
            datatype: node.required_attr("datatype")?.to_string(),
            default_value: node.attr("default_value").map(str::to_string),
            value_set,
            modifier,
            changing_over_time: node.bool_attr("changing_over_time")?,
            overwrite: node.bool_attr("overwrite")?,
        })
    }
}

fn value_set_node(value_set: &ValueSet) -> DocumentNode {
    match value_set {
        ValueSet::Unrestricted => DocumentNode::new("ValueSet").with_attr("kind", "unrestricted"),
        ValueSet::Range { lower, upper, step } => DocumentNode::new("ValueSet")
            .with_attr("kind", "range")
            .with_opt_attr("lower", lower.as_deref())
            .with_opt_attr("upper", upper.as_deref())
            .with_opt_attr("step", step.as_deref()),
        ValueSet::Enum { values } => DocumentNode::new("ValueSet")
            .with_attr("kind", "enum")
            .with_children(values.iter().map(|v| DocumentNode::new("Value").with_text(v))),
    }
}

fn decode_value_set(node: &DocumentNode) -> Result<ValueSet> {
    match node.required_attr("kind")? {
        "unrestricted" => Ok(ValueSet::Unrestricted),
        "range" => Ok(ValueSet::Range {
            lower: node.attr("lower").map(str::to_string),
            upper: node.attr("upper").map(str::to_string),
            step: node.attr("step").map(str::to_string),
        }),
        "enum" => Ok(ValueSet::Enum {
            values: node
                .children_named("Value")
                .map(|v| v.text.clone().unwrap_or_default())
                .collect(),
        }),
        other => Err(node.invalid(format!("unknown value set kind '{}'", other))),
    }
}

impl ToDocumentNode for Association {
    fn to_document_node(&self) -> DocumentNode {
        DocumentNode::new("Association")
            .with_attr("target", &self.target)
            .with_attr("target_role_singular", &self.target_role_singular)
            .with_attr("target_role_plural", &self.target_role_plural)
            .with_attr("min_cardinality", self.min_cardinality)
            .with_attr("max_cardinality", self.max_cardinality)
            .with_attr("kind", self.kind.as_str())
            .with_attr("derived_union", self.derived_union)
            .with_opt_attr("subsetted_derived_union", self.subsetted_derived_union.as_deref())
            .with_attr("constrain", self.constrain)
            .with_opt_attr("inverse_association", self.inverse_association.as_deref())
            .with_attr("qualified", self.qualified)
    }
}

impl FromDocumentNode for Association {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("Association")?;
        let kind_text = node.required_attr("kind")?;
        let kind = AssociationKind::parse(kind_text)
            .ok_or_else(|| node.invalid(format!("unknown association kind '{}'", kind_text)))?;
        Ok(Self {
            target: node.required_attr("target")?.to_string(),
            target_role_singular: node.required_attr("target_role_singular")?.to_string(),
            target_role_plural: node.attr("target_role_plural").unwrap_or_default().to_string(),
            min_cardinality: node.u32_attr("min_cardinality")?,
            max_cardinality: parse_cardinality(node, "max_cardinality")?,
            kind,
            derived_union: node.bool_attr("derived_union")?,
            subsetted_derived_union: node.attr("subsetted_derived_union").map(str::to_string),
            constrain: node.bool_attr("constrain")?,
            inverse_association: node.attr("inverse_association").map(str::to_string),
            qualified: node.bool_attr("qualified")?,
        })
    }
}

impl ToDocumentNode for Method {
    fn to_document_node(&self) -> DocumentNode {
        DocumentNode::new("Method")
            .with_attr("name", &self.name)
            .with_attr("datatype", &self.datatype)
            .with_attr("formula_signature", self.formula_signature)
            .with_children(self.parameters.iter().map(|p| {
                DocumentNode::new("Parameter")
                    .with_attr("name", &p.name)
                    .with_attr("datatype", &p.datatype)
            }))
    }
}

impl FromDocumentNode for Method {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("Method")?;
        let parameters = node
            .children_named("Parameter")
            .map(|p| -> Result<Parameter> {
                Ok(Parameter::new(
                    p.required_attr("name")?,
                    p.required_attr("datatype")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: node.required_attr("name")?.to_string(),
            datatype: node.required_attr("datatype")?.to_string(),
            parameters,
            formula_signature: node.bool_attr("formula_signature")?,
        })
    }
}

// ===== Product components =====

impl ToDocumentNode for ProductComponent {
    fn to_document_node(&self) -> DocumentNode {
        DocumentNode::new("ProductComponent")
            .with_attr("name", &self.name)
            .with_attr("policy_type", &self.policy_type)
            .with_attr("project", &self.project)
            .with_children(self.generations.iter().map(ToDocumentNode::to_document_node))
    }
}

impl FromDocumentNode for ProductComponent {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("ProductComponent")?;
        Ok(Self {
            name: node.required_attr("name")?.to_string(),
            policy_type: node.required_attr("policy_type")?.to_string(),
            project: node.attr("project").unwrap_or_default().to_string(),
            generations: decode_all(node, "Generation")?,
        })
    }
}

impl ToDocumentNode for Generation {
    fn to_document_node(&self) -> DocumentNode {
        DocumentNode::new("Generation")
            .with_attr("valid_from", self.valid_from.format("%Y-%m-%d"))
            .with_children(self.config_elements.iter().map(ToDocumentNode::to_document_node))
            .with_children(self.links.iter().map(ToDocumentNode::to_document_node))
            .with_children(self.table_content_usages.iter().map(|u| {
                DocumentNode::new("TableContentUsage")
                    .with_attr("structure_usage", &u.structure_usage)
                    .with_attr("table_content", &u.table_content)
            }))
    }
}

impl FromDocumentNode for Generation {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("Generation")?;
        let table_content_usages = node
            .children_named("TableContentUsage")
            .map(|u| -> Result<TableContentUsage> {
                Ok(TableContentUsage {
                    structure_usage: u.required_attr("structure_usage")?.to_string(),
                    table_content: u.required_attr("table_content")?.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            valid_from: parse_date(node, "valid_from")?,
            config_elements: decode_all(node, "ConfigElement")?,
            links: decode_all(node, "Link")?,
            table_content_usages,
        })
    }
}

impl ToDocumentNode for ConfigElement {
    fn to_document_node(&self) -> DocumentNode {
        let node = DocumentNode::new("ConfigElement").with_attr("property", &self.property);
        match &self.value {
            ConfigValue::Value { value } => node
                .with_attr("kind", "value")
                .with_opt_attr("value", value.as_deref()),
            ConfigValue::Formula(formula) => node
                .with_attr("kind", "formula")
                .with_child(DocumentNode::new("Expression").with_text(&formula.expression))
                .with_children(formula.test_cases.iter().map(test_case_node)),
        }
    }
}

impl FromDocumentNode for ConfigElement {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("ConfigElement")?;
        let value = match node.required_attr("kind")? {
            "value" => ConfigValue::Value {
                value: node.attr("value").map(str::to_string),
            },
            "formula" => {
                let expression = node
                    .child("Expression")
                    .and_then(|e| e.text.clone())
                    .unwrap_or_default();
                let test_cases = node
                    .children_named("FormulaTestCase")
                    .map(decode_test_case)
                    .collect::<Result<Vec<_>>>()?;
                ConfigValue::Formula(Formula {
                    expression,
                    test_cases,
                })
            }
            other => return Err(node.invalid(format!("unknown config element kind '{}'", other))),
        };
        Ok(Self {
            property: node.required_attr("property")?.to_string(),
            value,
        })
    }
}

fn test_case_node(test_case: &FormulaTestCase) -> DocumentNode {
    DocumentNode::new("FormulaTestCase")
        .with_attr("name", &test_case.name)
        .with_opt_attr("expected_result", test_case.expected_result.as_deref())
        .with_children(test_case.input_values.iter().map(|v| {
            DocumentNode::new("InputValue")
                .with_attr("identifier", &v.identifier)
                .with_opt_attr("value", v.value.as_deref())
        }))
}

fn decode_test_case(node: &DocumentNode) -> Result<FormulaTestCase> {
    let input_values = node
        .children_named("InputValue")
        .map(|v| -> Result<FormulaTestInputValue> {
            Ok(FormulaTestInputValue {
                identifier: v.required_attr("identifier")?.to_string(),
                value: v.attr("value").map(str::to_string),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FormulaTestCase {
        name: node.required_attr("name")?.to_string(),
        input_values,
        expected_result: node.attr("expected_result").map(str::to_string),
    })
}

impl ToDocumentNode for Link {
    fn to_document_node(&self) -> DocumentNode {
        DocumentNode::new("Link")
            .with_attr("association", &self.association)
            .with_attr("target", &self.target)
            .with_attr("min_cardinality", self.min_cardinality)
            .with_attr("max_cardinality", self.max_cardinality)
    }
}

impl FromDocumentNode for Link {
    fn from_document_node(node: &DocumentNode) -> Result<Self> {
        node.expect_name("Link")?;
        Ok(Self {
            association: node.required_attr("association")?.to_string(),
            target: node.required_attr("target")?.to_string(),
            min_cardinality: node.u32_attr("min_cardinality")?,
            max_cardinality: parse_cardinality(node, "max_cardinality")?,
        })
    }
}
