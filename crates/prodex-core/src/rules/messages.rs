//! Validation findings
//!
//! Findings are values, never errors: a validation pass collects every
//! finding it encounters into a `MessageList` and returns it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Stable finding codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    // Types
    SupertypeNotFound,
    SupertypeHierarchyCycle,
    SupertypeKindMismatch,
    MustImplementDerivedUnion,
    ConfiguredTypeNotFound,
    ConfiguredTypeMismatch,
    DuplicatePropertyName,

    // Attributes
    AttributeNameMissing,
    OverwrittenAttributeNotFound,
    OverwrittenAttributeDifferentModifier,
    OverwrittenAttributeDifferentChangingOverTime,
    OverwrittenAttributeDifferentDatatype,
    DefaultValueNotInValueSet,

    // Associations
    TargetDoesNotExist,
    TargetRoleSingularMustBeSet,
    TargetRolePluralMustBeSet,
    TargetRolePluralEqualsTargetRoleSingular,
    MaxIsLessThanMin,
    #[serde(rename = "MAX_CARDINALITY_MUST_BE_AT_LEAST_1")]
    MaxCardinalityMustBeAtLeast1,
    DerivedUnionNotFound,
    NotMarkedAsDerivedUnion,
    DerivedUnionSubsetNotSameAsDerivedUnion,
    TargetOfDerivedUnionDoesNotExist,
    TargetTypeNotASubtype,
    SubsetOfDerivedUnionSameMaxCardinality,
    InverseAssociationDoesNotExist,
    InverseAssociationMismatch,
    ConstrainedSingularNotFound,
    ConstrainedPluralNotFound,
    ConstrainDerivedUnion,
    ConstrainSubsetDerivedUnion,
    ConstrainedDerivedUnion,
    ConstrainedSubsetDerivedUnion,
    ConstrainedTargetSupertypNotCovariant,
    MinCardinalityNotEqualToSuperAssociation,
    MaxCardinalityNotEqualToSuperAssociation,
    AssociationTypeNotEqualToSuperAssociation,
    ConstrainInvalidMatchingAssociation,

    // Product components
    PolicyTypeNotFound,
    ProductTypeNotFound,
    AttributeNotFound,
    ValueNotInValueSet,
    AssociationNotFound,
    LinkTargetNotFound,
    LinkTargetTypeMismatch,
    NotEnoughLinks,
    TooManyLinks,
    FormulaInvalid,
    FormulaDatatypeMismatch,
    FormulaIdentifierUnresolved,
    DuplicateGenerationDate,
}

impl MessageCode {
    pub fn code(&self) -> &'static str {
        match self {
            MessageCode::SupertypeNotFound => "SUPERTYPE_NOT_FOUND",
            MessageCode::SupertypeHierarchyCycle => "SUPERTYPE_HIERARCHY_CYCLE",
            MessageCode::SupertypeKindMismatch => "SUPERTYPE_KIND_MISMATCH",
            MessageCode::MustImplementDerivedUnion => "MUST_IMPLEMENT_DERIVED_UNION",
            MessageCode::ConfiguredTypeNotFound => "CONFIGURED_TYPE_NOT_FOUND",
            MessageCode::ConfiguredTypeMismatch => "CONFIGURED_TYPE_MISMATCH",
            MessageCode::DuplicatePropertyName => "DUPLICATE_PROPERTY_NAME",
            MessageCode::AttributeNameMissing => "ATTRIBUTE_NAME_MISSING",
            MessageCode::OverwrittenAttributeNotFound => "OVERWRITTEN_ATTRIBUTE_NOT_FOUND",
            MessageCode::OverwrittenAttributeDifferentModifier => {
                "OVERWRITTEN_ATTRIBUTE_DIFFERENT_MODIFIER"
            }
            MessageCode::OverwrittenAttributeDifferentChangingOverTime => {
                "OVERWRITTEN_ATTRIBUTE_DIFFERENT_CHANGING_OVER_TIME"
            }
            MessageCode::OverwrittenAttributeDifferentDatatype => {
                "OVERWRITTEN_ATTRIBUTE_DIFFERENT_DATATYPE"
            }
            MessageCode::DefaultValueNotInValueSet => "DEFAULT_VALUE_NOT_IN_VALUE_SET",
            MessageCode::TargetDoesNotExist => "TARGET_DOES_NOT_EXIST",
            MessageCode::TargetRoleSingularMustBeSet => "TARGET_ROLE_SINGULAR_MUST_BE_SET",
            MessageCode::TargetRolePluralMustBeSet => "TARGET_ROLE_PLURAL_MUST_BE_SET",
            MessageCode::TargetRolePluralEqualsTargetRoleSingular => {
                "TARGET_ROLE_PLURAL_EQUALS_TARGET_ROLE_SINGULAR"
            }
            MessageCode::MaxIsLessThanMin => "MAX_IS_LESS_THAN_MIN",
            MessageCode::MaxCardinalityMustBeAtLeast1 => "MAX_CARDINALITY_MUST_BE_AT_LEAST_1",
            MessageCode::DerivedUnionNotFound => "DERIVED_UNION_NOT_FOUND",
            MessageCode::NotMarkedAsDerivedUnion => "NOT_MARKED_AS_DERIVED_UNION",
            MessageCode::DerivedUnionSubsetNotSameAsDerivedUnion => {
                "DERIVED_UNION_SUBSET_NOT_SAME_AS_DERIVED_UNION"
            }
            MessageCode::TargetOfDerivedUnionDoesNotExist => {
                "TARGET_OF_DERIVED_UNION_DOES_NOT_EXIST"
            }
            MessageCode::TargetTypeNotASubtype => "TARGET_TYPE_NOT_A_SUBTYPE",
            MessageCode::SubsetOfDerivedUnionSameMaxCardinality => {
                "SUBSET_OF_DERIVED_UNION_SAME_MAX_CARDINALITY"
            }
            MessageCode::InverseAssociationDoesNotExist => "INVERSE_ASSOCIATION_DOES_NOT_EXIST",
            MessageCode::InverseAssociationMismatch => "INVERSE_ASSOCIATION_MISMATCH",
            MessageCode::ConstrainedSingularNotFound => "CONSTRAINED_SINGULAR_NOT_FOUND",
            MessageCode::ConstrainedPluralNotFound => "CONSTRAINED_PLURAL_NOT_FOUND",
            MessageCode::ConstrainDerivedUnion => "CONSTRAIN_DERIVED_UNION",
            MessageCode::ConstrainSubsetDerivedUnion => "CONSTRAIN_SUBSET_DERIVED_UNION",
            MessageCode::ConstrainedDerivedUnion => "CONSTRAINED_DERIVED_UNION",
            MessageCode::ConstrainedSubsetDerivedUnion => "CONSTRAINED_SUBSET_DERIVED_UNION",
            MessageCode::ConstrainedTargetSupertypNotCovariant => {
                "CONSTRAINED_TARGET_SUPERTYP_NOT_COVARIANT"
            }
            MessageCode::MinCardinalityNotEqualToSuperAssociation => {
                "MIN_CARDINALITY_NOT_EQUAL_TO_SUPER_ASSOCIATION"
            }
            MessageCode::MaxCardinalityNotEqualToSuperAssociation => {
                "MAX_CARDINALITY_NOT_EQUAL_TO_SUPER_ASSOCIATION"
            }
            MessageCode::AssociationTypeNotEqualToSuperAssociation => {
                "ASSOCIATION_TYPE_NOT_EQUAL_TO_SUPER_ASSOCIATION"
            }
            MessageCode::ConstrainInvalidMatchingAssociation => {
                "CONSTRAIN_INVALID_MATCHING_ASSOCIATION"
            }
            MessageCode::PolicyTypeNotFound => "POLICY_TYPE_NOT_FOUND",
            MessageCode::ProductTypeNotFound => "PRODUCT_TYPE_NOT_FOUND",
            MessageCode::AttributeNotFound => "ATTRIBUTE_NOT_FOUND",
            MessageCode::ValueNotInValueSet => "VALUE_NOT_IN_VALUE_SET",
            MessageCode::AssociationNotFound => "ASSOCIATION_NOT_FOUND",
            MessageCode::LinkTargetNotFound => "LINK_TARGET_NOT_FOUND",
            MessageCode::LinkTargetTypeMismatch => "LINK_TARGET_TYPE_MISMATCH",
            MessageCode::NotEnoughLinks => "NOT_ENOUGH_LINKS",
            MessageCode::TooManyLinks => "TOO_MANY_LINKS",
            MessageCode::FormulaInvalid => "FORMULA_INVALID",
            MessageCode::FormulaDatatypeMismatch => "FORMULA_DATATYPE_MISMATCH",
            MessageCode::FormulaIdentifierUnresolved => "FORMULA_IDENTIFIER_UNRESOLVED",
            MessageCode::DuplicateGenerationDate => "DUPLICATE_GENERATION_DATE",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The (object, property) pair a finding is attached to
///
/// `object` is a path such as `motor.Policy#coverage` for an association or
/// `motor.Standard@2024-01-01` for a generation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub object: String,
    pub property: String,
}

impl ObjectProperty {
    pub fn new(object: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for ObjectProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property.is_empty() {
            write!(f, "{}", self.object)
        } else {
            write!(f, "{}.{}", self.object, self.property)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub code: MessageCode,
    pub severity: Severity,
    pub text: String,
    pub invalid_properties: Vec<ObjectProperty>,
}

impl Message {
    pub fn error(code: MessageCode, text: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            text: text.into(),
            invalid_properties: Vec::new(),
        }
    }

    pub fn warning(code: MessageCode, text: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            text: text.into(),
            invalid_properties: Vec::new(),
        }
    }

    /// Attach an invalid (object, property) pair
    pub fn on(mut self, object: impl Into<String>, property: impl Into<String>) -> Self {
        self.invalid_properties
            .push(ObjectProperty::new(object, property));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}] {}", severity, self.code, self.text)?;
        if !self.invalid_properties.is_empty() {
            let props: Vec<String> = self
                .invalid_properties
                .iter()
                .map(ToString::to_string)
                .collect();
            write!(f, " ({})", props.join(", "))?;
        }
        Ok(())
    }
}

/// Ordered collection of findings from one or more validation passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageList {
    messages: Vec<Message>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, other: MessageList) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn contains_code(&self, code: MessageCode) -> bool {
        self.messages.iter().any(|m| m.code == code)
    }

    pub fn count_code(&self, code: MessageCode) -> usize {
        self.messages.iter().filter(|m| m.code == code).count()
    }

    pub fn with_code(&self, code: MessageCode) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.code == code).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(Message::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_error()).count()
    }

    /// Findings attached to the given object
    pub fn for_object(&self, object: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.invalid_properties.iter().any(|p| p.object == object))
            .collect()
    }
}

impl IntoIterator for MessageList {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageList {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl FromIterator<Message> for MessageList {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

/// Object path of a type
pub fn type_object(type_name: &str) -> String {
    type_name.to_string()
}

/// Object path of a part owned by a type
pub fn part_object(type_name: &str, part: &str) -> String {
    format!("{}#{}", type_name, part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_strings_match_serde_names() {
        for code in [
            MessageCode::ConstrainedTargetSupertypNotCovariant,
            MessageCode::MaxCardinalityMustBeAtLeast1,
            MessageCode::DuplicatePropertyName,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.code()));
        }
    }

    #[test]
    fn test_message_list_queries() {
        let mut list = MessageList::new();
        list.add(
            Message::warning(MessageCode::FormulaIdentifierUnresolved, "unused")
                .on("motor.Standard", "premium"),
        );
        assert!(!list.has_errors());

        list.add(Message::error(MessageCode::AttributeNotFound, "missing").on("motor.Standard", "x"));
        list.add(Message::error(MessageCode::AttributeNotFound, "missing").on("motor.Other", "y"));

        assert!(list.has_errors());
        assert_eq!(list.error_count(), 2);
        assert_eq!(list.count_code(MessageCode::AttributeNotFound), 2);
        assert_eq!(list.for_object("motor.Standard").len(), 2);
    }

    #[test]
    fn test_message_display() {
        let msg = Message::error(MessageCode::TargetDoesNotExist, "Target Foo does not exist")
            .on("motor.Policy#coverage", "target");
        assert_eq!(
            msg.to_string(),
            "error [TARGET_DOES_NOT_EXIST] Target Foo does not exist (motor.Policy#coverage.target)"
        );
    }
}
