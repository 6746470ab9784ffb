//! Type-level validation
//!
//! Combines the supertype, twin, attribute, association and duplicate
//! property checks of one type into a single message list.

use std::collections::HashSet;

use crate::cache::{type_key, ValidationCache};
use crate::errors::Result;
use crate::hierarchy::{find_overwritten_attribute, find_supertype, walk};
use crate::model::{Attribute, Type};
use crate::ops::ModelStore;
use crate::rules::association_rules::validate_associations;
use crate::rules::duplicate_property::validate_duplicate_properties;
use crate::rules::messages::{part_object, type_object, Message, MessageCode, MessageList};
use crate::settings::ModelSettings;
use crate::{log_op_end, log_op_error, log_op_start};

/// Validate a type by qualified name
///
/// # Errors
///
/// Returns `TypeNotFound` if the type is not in the store. Everything else
/// is reported as findings.
pub fn validate_type(
    store: &ModelStore,
    type_name: &str,
    settings: &ModelSettings,
) -> Result<MessageList> {
    log_op_start!("validate_type", type_name = type_name);
    let start = std::time::Instant::now();

    let messages = store
        .get_type(type_name)
        .map(|ty| check_type(store, ty, settings))
        .map_err(|e| {
            log_op_error!(
                "validate_type",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "validate_type",
        duration_ms = start.elapsed().as_millis() as u64,
        type_name = type_name,
        message_count = messages.len()
    );
    Ok(messages)
}

/// Validate a type, reusing a cached result computed at the current stamp
///
/// # Errors
///
/// Returns `TypeNotFound` if the type is not in the store.
pub fn validate_type_cached(
    store: &ModelStore,
    type_name: &str,
    settings: &ModelSettings,
    cache: &mut ValidationCache,
) -> Result<MessageList> {
    let stamp = store.modification_stamp();
    let key = type_key(type_name);
    if let Some(cached) = cache.get(stamp, &key) {
        return Ok(cached.clone());
    }
    let messages = validate_type(store, type_name, settings)?;
    cache.insert(stamp, key, messages.clone());
    Ok(messages)
}

/// Run every type-level check on `ty`
pub fn check_type(store: &ModelStore, ty: &Type, settings: &ModelSettings) -> MessageList {
    let mut list = MessageList::new();
    check_supertype(store, ty, &mut list);
    check_derived_unions_implemented(store, ty, &mut list);
    check_twin(store, ty, &mut list);
    for attribute in &ty.attributes {
        check_attribute(store, ty, attribute, &mut list);
    }
    list.extend(validate_associations(store, ty));
    list.extend(validate_duplicate_properties(
        store,
        ty,
        settings.case_insensitive_property_names,
    ));
    list
}

fn check_supertype(store: &ModelStore, ty: &Type, list: &mut MessageList) {
    let Some(super_name) = ty.supertype.as_deref() else {
        return;
    };
    let object = type_object(&ty.qualified_name);

    let Some(supertype) = find_supertype(store, ty) else {
        list.add(
            Message::error(
                MessageCode::SupertypeNotFound,
                format!("Supertype {} does not exist", super_name),
            )
            .on(&object, "supertype"),
        );
        return;
    };

    if supertype.kind != ty.kind {
        list.add(
            Message::error(
                MessageCode::SupertypeKindMismatch,
                format!(
                    "{} type {} cannot extend {} type {}",
                    ty.kind.as_str(),
                    ty.qualified_name,
                    supertype.kind.as_str(),
                    supertype.qualified_name
                ),
            )
            .on(&object, "supertype"),
        );
    }

    if let Some(chain) = walk(store, ty).cycle {
        list.add(
            Message::error(
                MessageCode::SupertypeHierarchyCycle,
                format!("Supertype hierarchy is cyclic: {}", chain.join(" -> ")),
            )
            .on(&object, "supertype"),
        );
    }
}

fn check_derived_unions_implemented(store: &ModelStore, ty: &Type, list: &mut MessageList) {
    if ty.is_abstract {
        return;
    }
    let hierarchy = walk(store, ty);
    let implemented: HashSet<&str> = hierarchy
        .types
        .iter()
        .flat_map(|t| t.associations.iter())
        .filter_map(|a| a.subsetted_derived_union.as_deref())
        .collect();

    for owner in &hierarchy.types {
        for union in owner.associations.iter().filter(|a| a.derived_union) {
            if implemented.contains(union.name()) {
                continue;
            }
            list.add(
                Message::error(
                    MessageCode::MustImplementDerivedUnion,
                    format!(
                        "{} must implement derived union {}",
                        ty.qualified_name,
                        part_object(&owner.qualified_name, union.name())
                    ),
                )
                .on(type_object(&ty.qualified_name), "")
                .on(part_object(&owner.qualified_name, union.name()), "derived_union"),
            );
        }
    }
}

fn check_twin(store: &ModelStore, ty: &Type, list: &mut MessageList) {
    let Some(twin_name) = ty.configures.as_deref() else {
        return;
    };
    let object = type_object(&ty.qualified_name);

    let Some(twin) = store.find_type(&ty.project, twin_name) else {
        list.add(
            Message::error(
                MessageCode::ConfiguredTypeNotFound,
                format!("Configured type {} does not exist", twin_name),
            )
            .on(&object, "configures"),
        );
        return;
    };

    let points_back = twin.configures.as_deref() == Some(ty.qualified_name.as_str());
    if twin.kind != ty.kind.twin() || !points_back {
        list.add(
            Message::error(
                MessageCode::ConfiguredTypeMismatch,
                format!(
                    "{} type {} does not configure {}",
                    twin.kind.as_str(),
                    twin.qualified_name,
                    ty.qualified_name
                ),
            )
            .on(&object, "configures"),
        );
    }
}

fn check_attribute(store: &ModelStore, ty: &Type, attribute: &Attribute, list: &mut MessageList) {
    let object = part_object(&ty.qualified_name, &attribute.name);

    if attribute.name.trim().is_empty() {
        list.add(
            Message::error(MessageCode::AttributeNameMissing, "Attribute name is missing")
                .on(&object, "name"),
        );
        return;
    }

    if attribute.value_set.contains(attribute.default_value.as_deref()) == Some(false) {
        list.add(
            Message::error(
                MessageCode::DefaultValueNotInValueSet,
                format!(
                    "Default value {} is not in the value set",
                    attribute.default_value.as_deref().unwrap_or_default()
                ),
            )
            .on(&object, "default_value"),
        );
    }

    if !attribute.overwrite {
        return;
    }
    let Some((_, overwritten)) = find_overwritten_attribute(store, ty, &attribute.name) else {
        list.add(
            Message::error(
                MessageCode::OverwrittenAttributeNotFound,
                format!("No supertype declares an attribute {}", attribute.name),
            )
            .on(&object, "overwrite"),
        );
        return;
    };

    if overwritten.modifier != attribute.modifier {
        list.add(
            Message::error(
                MessageCode::OverwrittenAttributeDifferentModifier,
                "Overwriting attribute must keep the modifier",
            )
            .on(&object, "modifier"),
        );
    }
    if overwritten.changing_over_time != attribute.changing_over_time {
        list.add(
            Message::error(
                MessageCode::OverwrittenAttributeDifferentChangingOverTime,
                "Overwriting attribute must keep the changing-over-time flag",
            )
            .on(&object, "changing_over_time"),
        );
    }
    if overwritten.datatype != attribute.datatype {
        list.add(
            Message::error(
                MessageCode::OverwrittenAttributeDifferentDatatype,
                format!(
                    "Datatype {} differs from {} of the overwritten attribute",
                    attribute.datatype, overwritten.datatype
                ),
            )
            .on(&object, "datatype"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProdexError;
    use crate::model::{Association, Modifier, TypeKind, ValueSet};

    fn store_with(types: Vec<Type>) -> ModelStore {
        let mut store = ModelStore::new();
        for ty in types {
            store.insert_type(ty);
        }
        store
    }

    fn sub(name: &str, supertype: &str, kind: TypeKind) -> Type {
        let mut ty = Type::new(name, kind);
        ty.supertype = Some(supertype.to_string());
        ty
    }

    fn validate(store: &ModelStore, name: &str) -> MessageList {
        validate_type(store, name, &ModelSettings::default()).unwrap()
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let store = ModelStore::new();
        let err = validate_type(&store, "Nope", &ModelSettings::default()).unwrap_err();
        assert!(matches!(err, ProdexError::TypeNotFound { .. }));
    }

    #[test]
    fn test_supertype_findings() {
        let store = store_with(vec![
            sub("A", "Missing", TypeKind::Policy),
            Type::new("P", TypeKind::Product),
            sub("B", "P", TypeKind::Policy),
            sub("X", "Y", TypeKind::Policy),
            sub("Y", "X", TypeKind::Policy),
        ]);

        assert!(validate(&store, "A").contains_code(MessageCode::SupertypeNotFound));
        assert!(validate(&store, "B").contains_code(MessageCode::SupertypeKindMismatch));
        let cyclic = validate(&store, "X");
        assert_eq!(cyclic.count_code(MessageCode::SupertypeHierarchyCycle), 1);
        assert!(cyclic.has_errors());
    }

    #[test]
    fn test_must_implement_derived_union() {
        let mut base = Type::new("Base", TypeKind::Policy);
        base.is_abstract = true;
        let mut du = Association::to_many("Part", "part", "parts");
        du.derived_union = true;
        base.add_association(du);
        let concrete = sub("Concrete", "Base", TypeKind::Policy);
        let mut implementing = sub("Implementing", "Base", TypeKind::Policy);
        let mut subset = Association::to_many("Part", "wheel", "wheels");
        subset.subsetted_derived_union = Some("part".to_string());
        implementing.add_association(subset);

        let store = store_with(vec![
            base,
            concrete,
            implementing,
            Type::new("Part", TypeKind::Policy),
        ]);

        assert!(!validate(&store, "Base").contains_code(MessageCode::MustImplementDerivedUnion));
        assert_eq!(
            validate(&store, "Concrete").count_code(MessageCode::MustImplementDerivedUnion),
            1
        );
        assert!(validate(&store, "Implementing").is_empty());
    }

    #[test]
    fn test_twin_checks() {
        let mut policy = Type::new("Policy", TypeKind::Policy);
        policy.configures = Some("Product".to_string());
        let mut product = Type::new("Product", TypeKind::Product);
        product.configures = Some("Policy".to_string());
        let mut lonely = Type::new("Lonely", TypeKind::Policy);
        lonely.configures = Some("Product".to_string());
        let mut dangling = Type::new("Dangling", TypeKind::Policy);
        dangling.configures = Some("Nowhere".to_string());

        let store = store_with(vec![policy, product, lonely, dangling]);

        assert!(validate(&store, "Policy").is_empty());
        assert!(validate(&store, "Product").is_empty());
        assert!(validate(&store, "Lonely").contains_code(MessageCode::ConfiguredTypeMismatch));
        assert!(validate(&store, "Dangling").contains_code(MessageCode::ConfiguredTypeNotFound));
    }

    #[test]
    fn test_overwritten_attribute_checks() {
        let mut base = Type::new("Base", TypeKind::Policy);
        base.add_attribute(Attribute::new("premium", "Money"));
        let mut sub_ty = sub("Sub", "Base", TypeKind::Policy);
        let mut overwriting = Attribute::new("premium", "Decimal");
        overwriting.overwrite = true;
        overwriting.modifier = Modifier::Public;
        overwriting.changing_over_time = false;
        sub_ty.add_attribute(overwriting);
        let mut orphan = Attribute::new("orphan", "String");
        orphan.overwrite = true;
        sub_ty.add_attribute(orphan);

        let store = store_with(vec![base, sub_ty]);
        let list = validate(&store, "Sub");

        for code in [
            MessageCode::OverwrittenAttributeDifferentModifier,
            MessageCode::OverwrittenAttributeDifferentChangingOverTime,
            MessageCode::OverwrittenAttributeDifferentDatatype,
            MessageCode::OverwrittenAttributeNotFound,
        ] {
            assert_eq!(list.count_code(code), 1, "{}", code);
        }
        assert!(!list.contains_code(MessageCode::DuplicatePropertyName));
    }

    #[test]
    fn test_attribute_name_and_default_value() {
        let mut ty = Type::new("A", TypeKind::Policy);
        ty.add_attribute(Attribute::new("", "String"));
        let mut level = Attribute::new("level", "String");
        level.value_set = ValueSet::Enum {
            values: vec!["low".into(), "high".into()],
        };
        level.default_value = Some("medium".to_string());
        ty.add_attribute(level);

        let store = store_with(vec![ty]);
        let list = validate(&store, "A");
        assert!(list.contains_code(MessageCode::AttributeNameMissing));
        assert!(list.contains_code(MessageCode::DefaultValueNotInValueSet));
    }

    #[test]
    fn test_cached_validation_follows_stamp() {
        let mut store = store_with(vec![sub("A", "Missing", TypeKind::Policy)]);
        let settings = ModelSettings::default();
        let mut cache = ValidationCache::new();

        let first = validate_type_cached(&store, "A", &settings, &mut cache).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(cache.len(), 1);

        store.insert_type(Type::new("Missing", TypeKind::Policy));
        let second = validate_type_cached(&store, "A", &settings, &mut cache).unwrap();
        assert!(second.is_empty());
    }
}
