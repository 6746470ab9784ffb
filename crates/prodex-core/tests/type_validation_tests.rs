#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{policy_type, store_with_types, to_many};
use prodex_core::model::{Association, Attribute};
use prodex_core::rules::duplicate_property::validate_duplicate_properties;
use prodex_core::rules::type_rules::{validate_type, validate_type_cached};
use prodex_core::rules::MessageCode;
use prodex_core::{ModelSettings, ProdexError, ValidationCache};

#[test]
fn test_attribute_and_role_collide_ignoring_case() {
    let mut policy = policy_type("motor.Policy", None);
    policy.add_attribute(Attribute::new("vehicle", "String"));
    let mut motor = policy_type("motor.MotorPolicy", Some("motor.Policy"));
    motor.add_association(Association::new("motor.Vehicle", "Vehicle"));
    let store = store_with_types(vec![policy, motor, policy_type("motor.Vehicle", None)]);
    let motor = store.get_type("motor.MotorPolicy").unwrap();

    let list = validate_duplicate_properties(&store, motor, true);
    assert_eq!(list.count_code(MessageCode::DuplicatePropertyName), 1);
    let objects: Vec<&str> = list.iter().next().unwrap()
        .invalid_properties
        .iter()
        .map(|p| p.object.as_str())
        .collect();
    assert!(objects.contains(&"motor.Policy#vehicle"));
    assert!(objects.contains(&"motor.MotorPolicy#Vehicle"));

    assert!(validate_duplicate_properties(&store, motor, false).is_empty());
}

#[test]
fn test_collision_is_reported_only_where_declared() {
    let mut policy = policy_type("motor.Policy", None);
    policy.add_attribute(Attribute::new("premium", "Decimal"));
    policy.add_attribute(Attribute::new("premium", "Money"));
    let motor = policy_type("motor.MotorPolicy", Some("motor.Policy"));
    let store = store_with_types(vec![policy, motor]);

    let list = validate_duplicate_properties(&store, store.get_type("motor.Policy").unwrap(), true);
    assert_eq!(list.len(), 1);
    let list =
        validate_duplicate_properties(&store, store.get_type("motor.MotorPolicy").unwrap(), true);
    assert!(list.is_empty());
}

#[test]
fn test_legitimate_reuse_is_not_a_duplicate() {
    let mut policy = policy_type("motor.Policy", None);
    policy.add_attribute(Attribute::new("premium", "Decimal"));
    policy.add_association(Association::new("motor.Vehicle", "Vehicle"));
    let mut union = to_many("motor.Coverage", "Coverage");
    union.derived_union = true;
    union.inverse_association = Some("Coverage".to_string());
    policy.add_association(union);

    let mut motor = policy_type("motor.MotorPolicy", Some("motor.Policy"));
    let mut premium = Attribute::new("premium", "Decimal");
    premium.overwrite = true;
    motor.add_attribute(premium);
    let mut narrowed = Association::new("motor.Car", "Vehicle");
    narrowed.constrain = true;
    motor.add_association(narrowed);

    let mut coverage = policy_type("motor.Coverage", None);
    let mut back = Association::new("motor.Policy", "Coverage");
    back.inverse_association = Some("Coverage".to_string());
    coverage.add_association(back);

    let store = store_with_types(vec![
        policy,
        motor,
        coverage,
        policy_type("motor.Vehicle", None),
        policy_type("motor.Car", Some("motor.Vehicle")),
    ]);

    let motor = store.get_type("motor.MotorPolicy").unwrap();
    assert!(validate_duplicate_properties(&store, motor, true).is_empty());
}

/// motor.Node declares derived union `child`/`children` and an association
/// `children` naming it as inverse; both point at `target`.
fn union_with_named_inverse(target: &str) -> prodex_core::ModelStore {
    let mut node = policy_type("motor.Node", None);
    let mut union = Association::to_many(target, "child", "children");
    union.derived_union = true;
    union.inverse_association = Some("children".to_string());
    node.add_association(union);
    let mut back = Association::new(target, "children");
    back.inverse_association = Some("child".to_string());
    node.add_association(back);

    store_with_types(vec![node, policy_type("motor.Leaf", None)])
}

#[test]
fn test_union_and_its_inverse_share_a_name() {
    let store = union_with_named_inverse("motor.Node");
    let node = store.get_type("motor.Node").unwrap();
    assert!(validate_duplicate_properties(&store, node, true).is_empty());
}

#[test]
fn test_unresolved_inverse_does_not_excuse_a_duplicate() {
    let store = union_with_named_inverse("motor.Leaf");
    let node = store.get_type("motor.Node").unwrap();
    let list = validate_duplicate_properties(&store, node, true);
    assert_eq!(list.count_code(MessageCode::DuplicatePropertyName), 1);
}

#[test]
fn test_validate_type_uses_settings_and_reports_missing_type() {
    let mut policy = policy_type("motor.Policy", None);
    policy.add_attribute(Attribute::new("Premium", "Decimal"));
    policy.add_attribute(Attribute::new("premium", "Decimal"));
    let store = store_with_types(vec![policy]);

    let insensitive = ModelSettings::default();
    let list = validate_type(&store, "motor.Policy", &insensitive).unwrap();
    assert!(list.contains_code(MessageCode::DuplicatePropertyName));

    let sensitive = ModelSettings {
        case_insensitive_property_names: false,
        ..ModelSettings::default()
    };
    let list = validate_type(&store, "motor.Policy", &sensitive).unwrap();
    assert!(!list.contains_code(MessageCode::DuplicatePropertyName));

    let err = validate_type(&store, "motor.Missing", &insensitive).unwrap_err();
    assert!(matches!(err, ProdexError::TypeNotFound { .. }));
}

#[test]
fn test_supertype_cycle_is_a_finding() {
    let store = store_with_types(vec![
        policy_type("motor.A", Some("motor.B")),
        policy_type("motor.B", Some("motor.A")),
    ]);
    let list = validate_type(&store, "motor.A", &ModelSettings::default()).unwrap();
    assert!(list.contains_code(MessageCode::SupertypeHierarchyCycle));
}

#[test]
fn test_cached_validation_follows_modifications() {
    let mut store = store_with_types(vec![policy_type("motor.Policy", Some("motor.Gone"))]);
    let settings = ModelSettings::default();
    let mut cache = ValidationCache::new();

    let first = validate_type_cached(&store, "motor.Policy", &settings, &mut cache).unwrap();
    assert!(first.contains_code(MessageCode::SupertypeNotFound));
    assert_eq!(cache.len(), 1);

    store.get_type_mut("motor.Policy").unwrap().supertype = None;
    let second = validate_type_cached(&store, "motor.Policy", &settings, &mut cache).unwrap();
    assert!(!second.contains_code(MessageCode::SupertypeNotFound));
}
