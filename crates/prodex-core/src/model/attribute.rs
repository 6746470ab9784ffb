use serde::{Deserialize, Serialize};

/// Visibility modifier of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    #[default]
    Published,
    Public,
}

/// Allowed values of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSet {
    #[default]
    Unrestricted,
    Range {
        #[serde(default)]
        lower: Option<String>,
        #[serde(default)]
        upper: Option<String>,
        #[serde(default)]
        step: Option<String>,
    },
    Enum {
        values: Vec<String>,
    },
}

impl ValueSet {
    /// Check whether a value lies in the set
    ///
    /// Returns `None` when containment cannot be decided without the
    /// datatype (range bounds or value that do not parse as numbers). A
    /// missing value is always contained.
    pub fn contains(&self, value: Option<&str>) -> Option<bool> {
        let Some(value) = value else {
            return Some(true);
        };
        match self {
            ValueSet::Unrestricted => Some(true),
            ValueSet::Enum { values } => Some(values.iter().any(|v| v == value)),
            ValueSet::Range { lower, upper, step } => {
                let v: f64 = value.trim().parse().ok()?;
                if let Some(lower) = lower {
                    let lower: f64 = lower.trim().parse().ok()?;
                    if v < lower {
                        return Some(false);
                    }
                    if let Some(step) = step {
                        let step: f64 = step.trim().parse().ok()?;
                        if step > 0.0 {
                            let steps = (v - lower) / step;
                            if (steps - steps.round()).abs() > 1e-9 {
                                return Some(false);
                            }
                        }
                    }
                }
                if let Some(upper) = upper {
                    let upper: f64 = upper.trim().parse().ok()?;
                    if v > upper {
                        return Some(false);
                    }
                }
                Some(true)
            }
        }
    }
}

fn default_changing_over_time() -> bool {
    true
}

/// Attribute owned by a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,

    /// Datatype reference, resolved by the datatype registry
    pub datatype: String,

    #[serde(default)]
    pub default_value: Option<String>,

    #[serde(default)]
    pub value_set: ValueSet,

    #[serde(default)]
    pub modifier: Modifier,

    /// Whether values may differ between generations
    #[serde(default = "default_changing_over_time")]
    pub changing_over_time: bool,

    /// Shadows a same-named attribute of a supertype
    #[serde(default)]
    pub overwrite: bool,
}

impl Attribute {
    /// Create a published, changing-over-time attribute without value set
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            default_value: None,
            value_set: ValueSet::Unrestricted,
            modifier: Modifier::Published,
            changing_over_time: true,
            overwrite: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_value_set() {
        let set = ValueSet::Enum {
            values: vec!["A".into(), "B".into()],
        };
        assert_eq!(set.contains(Some("A")), Some(true));
        assert_eq!(set.contains(Some("C")), Some(false));
        assert_eq!(set.contains(None), Some(true));
    }

    #[test]
    fn test_range_value_set() {
        let set = ValueSet::Range {
            lower: Some("0".into()),
            upper: Some("100".into()),
            step: Some("10".into()),
        };
        assert_eq!(set.contains(Some("50")), Some(true));
        assert_eq!(set.contains(Some("55")), Some(false));
        assert_eq!(set.contains(Some("110")), Some(false));
        assert_eq!(set.contains(Some("-10")), Some(false));
    }

    #[test]
    fn test_range_with_non_numeric_value_is_undecided() {
        let set = ValueSet::Range {
            lower: Some("0".into()),
            upper: None,
            step: None,
        };
        assert_eq!(set.contains(Some("abc")), None);
    }

    #[test]
    fn test_new_attribute_defaults() {
        let attr = Attribute::new("premium", "Decimal");
        assert_eq!(attr.modifier, Modifier::Published);
        assert!(attr.changing_over_time);
        assert!(!attr.overwrite);
        assert_eq!(attr.value_set, ValueSet::Unrestricted);
    }
}
