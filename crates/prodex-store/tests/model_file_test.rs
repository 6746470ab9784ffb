// Integration tests for model file parsing and import

mod common;

use common::{fixture, temp_repo};
use prodex_core::errors::PxErrorKind;
use prodex_core::model::{Cardinality, TypeKind, ValueSet};
use prodex_store::model_file::{import_model_file, parse_model_file};
use prodex_core::rules::{validate_component, validate_type};
use prodex_core::{MessageCode, ModelSettings};
use prodex_store::load_model_file;

#[test]
fn test_parse_motor_model() {
    // Given: The motor fixture
    let file = parse_model_file(&fixture("motor_model.yaml")).expect("fixture parses");

    // Then: Every section is read and the default project is applied
    assert_eq!(file.projects.len(), 2);
    assert_eq!(file.enums.len(), 1);
    assert_eq!(file.types.len(), 4);
    assert_eq!(file.components.len(), 3);
    assert!(file.types.iter().all(|t| t.project == "motor"));

    let product = file
        .types
        .iter()
        .find(|t| t.qualified_name == "motor.MotorProduct")
        .unwrap();
    assert_eq!(product.kind, TypeKind::Product);
    assert_eq!(product.associations[0].max_cardinality, Cardinality::Unbounded);
    assert_eq!(
        product.attributes[0].value_set,
        ValueSet::Enum {
            values: vec!["0".into(), "500".into(), "1000".into()]
        }
    );
}

#[test]
fn test_load_model_file_builds_index() {
    let store = load_model_file(&fixture("motor_model.yaml")).unwrap();

    assert_eq!(store.list_types().len(), 4);
    assert!(store.find_type("motor", "motor.CoverageProduct").is_some());
    assert!(store.find_enum("base.PaymentMode").is_some());

    let basic = store.get_component("motor.Basic").unwrap();
    assert_eq!(basic.project, "motor");
    assert_eq!(basic.generations[0].links.len(), 2);
}

#[test]
fn test_duplicate_component_is_rejected() {
    let err = load_model_file(&fixture("duplicate_component.yaml")).unwrap_err();
    assert_eq!(err.kind(), PxErrorKind::InvalidInput);
    assert!(err.message().contains("Duplicate component name: motor.Basic"));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = load_model_file(&fixture("does_not_exist.yaml")).unwrap_err();
    assert_eq!(err.kind(), PxErrorKind::Io);
    assert_eq!(err.op(), Some("read_model_file"));
}

#[test]
fn test_import_writes_only_changed_components() {
    // Given: An empty repository
    let (_dir, mut repo) = temp_repo();

    // When: The model is imported twice
    let (_, first) = import_model_file(&fixture("motor_model.yaml"), &mut repo).unwrap();
    let (_, second) = import_model_file(&fixture("motor_model.yaml"), &mut repo).unwrap();

    // Then: The first import writes every component, the second none
    assert_eq!(first.components, 3);
    assert_eq!(
        first.written,
        vec!["motor.Basic", "motor.Collision", "motor.Theft"]
    );
    assert!(second.written.is_empty());
    assert_eq!(repo.list_handles().unwrap().len(), 3);
}

#[test]
fn test_loaded_model_feeds_validation() {
    // Given: A model with a dangling association target and a bad value
    let store = load_model_file(&fixture("invalid_model.yaml")).unwrap();

    // When: The product type and the component are validated
    let type_messages =
        validate_type(&store, "motor.MotorProduct", &ModelSettings::default()).unwrap();
    let component_messages = validate_component(&store, "motor.Basic", None).unwrap();

    // Then: Both problems are reported as findings
    assert!(type_messages.contains_code(MessageCode::TargetDoesNotExist));
    assert!(component_messages.contains_code(MessageCode::ValueNotInValueSet));
}
