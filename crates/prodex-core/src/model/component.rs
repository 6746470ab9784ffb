use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::association::Cardinality;

/// Product component - a configured instance of a product type
///
/// References its policy type by name; the product type follows from the
/// policy type's twin. Owns its generations exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductComponent {
    /// Qualified name, the persisted identity of the component
    pub name: String,

    /// Qualified name of the configured policy type
    pub policy_type: String,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub generations: Vec<Generation>,
}

impl ProductComponent {
    pub fn new(name: impl Into<String>, policy_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy_type: policy_type.into(),
            project: String::new(),
            generations: Vec::new(),
        }
    }

    /// The generation in effect on `date`
    ///
    /// That is the generation with the latest `valid_from` not after `date`.
    pub fn generation_effective_on(&self, date: NaiveDate) -> Option<&Generation> {
        self.generations
            .iter()
            .filter(|g| g.valid_from <= date)
            .max_by_key(|g| g.valid_from)
    }

    pub fn latest_generation(&self) -> Option<&Generation> {
        self.generations.iter().max_by_key(|g| g.valid_from)
    }

    pub fn has_generations(&self) -> bool {
        !self.generations.is_empty()
    }

    pub fn add_generation(&mut self, generation: Generation) {
        self.generations.push(generation);
    }
}

/// Generation - the component's configuration from `valid_from` onwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub valid_from: NaiveDate,

    #[serde(default)]
    pub config_elements: Vec<ConfigElement>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub table_content_usages: Vec<TableContentUsage>,
}

impl Generation {
    pub fn new(valid_from: NaiveDate) -> Self {
        Self {
            valid_from,
            config_elements: Vec::new(),
            links: Vec::new(),
            table_content_usages: Vec::new(),
        }
    }

    pub fn config_element(&self, property: &str) -> Option<&ConfigElement> {
        self.config_elements.iter().find(|c| c.property == property)
    }

    pub fn config_element_mut(&mut self, property: &str) -> Option<&mut ConfigElement> {
        self.config_elements
            .iter_mut()
            .find(|c| c.property == property)
    }

    /// Links that instantiate one association
    pub fn links_for<'a>(&'a self, association: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.association == association)
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn add_config_element(&mut self, element: ConfigElement) {
        self.config_elements.push(element);
    }
}

/// Value binding for one configured property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigElement {
    /// Attribute name, or formula signature name for formulas
    pub property: String,

    #[serde(flatten)]
    pub value: ConfigValue,
}

impl ConfigElement {
    pub fn value(property: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            property: property.into(),
            value: ConfigValue::Value {
                value: value.map(str::to_string),
            },
        }
    }

    pub fn formula(property: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: ConfigValue::Formula(Formula::new(expression)),
        }
    }

    pub fn as_formula(&self) -> Option<&Formula> {
        match &self.value {
            ConfigValue::Formula(f) => Some(f),
            ConfigValue::Value { .. } => None,
        }
    }

    pub fn as_formula_mut(&mut self) -> Option<&mut Formula> {
        match &mut self.value {
            ConfigValue::Formula(f) => Some(f),
            ConfigValue::Value { .. } => None,
        }
    }
}

/// Either a plain value or a formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigValue {
    Value {
        #[serde(default)]
        value: Option<String>,
    },
    Formula(Formula),
}

/// Formula expression with its test cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub expression: String,

    #[serde(default)]
    pub test_cases: Vec<FormulaTestCase>,
}

impl Formula {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            test_cases: Vec::new(),
        }
    }
}

/// Named set of input values plus the expected result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTestCase {
    pub name: String,

    #[serde(default)]
    pub input_values: Vec<FormulaTestInputValue>,

    #[serde(default)]
    pub expected_result: Option<String>,
}

impl FormulaTestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_values: Vec::new(),
            expected_result: None,
        }
    }

    pub fn input_value(&self, identifier: &str) -> Option<&FormulaTestInputValue> {
        self.input_values
            .iter()
            .find(|v| v.identifier == identifier)
    }

    /// Align the input values with the identifiers a formula uses
    ///
    /// Adds an empty input for every new identifier and drops inputs whose
    /// identifier is no longer used. Existing values are kept. Returns
    /// whether anything changed.
    pub fn sync_input_values<'a, I>(&mut self, identifiers: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: Vec<&str> = identifiers.into_iter().collect();
        let before = self.input_values.len();
        self.input_values
            .retain(|v| wanted.contains(&v.identifier.as_str()));
        let mut changed = self.input_values.len() != before;

        for identifier in wanted {
            if self.input_value(identifier).is_none() {
                self.input_values.push(FormulaTestInputValue {
                    identifier: identifier.to_string(),
                    value: None,
                });
                changed = true;
            }
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaTestInputValue {
    /// Parameter name or dotted attribute path
    pub identifier: String,

    #[serde(default)]
    pub value: Option<String>,
}

/// Link - an instance of a product-side association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Singular role name of the instantiated association
    pub association: String,

    /// Name of the target product component
    pub target: String,

    #[serde(default)]
    pub min_cardinality: u32,

    #[serde(default)]
    pub max_cardinality: Cardinality,
}

impl Link {
    pub fn new(association: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            association: association.into(),
            target: target.into(),
            min_cardinality: 0,
            max_cardinality: Cardinality::Bounded(1),
        }
    }
}

/// Binding of a table structure usage to a concrete table content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContentUsage {
    pub structure_usage: String,
    pub table_content: String,
}
