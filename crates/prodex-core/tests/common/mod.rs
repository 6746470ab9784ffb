use chrono::NaiveDate;
use prodex_core::model::{Association, Generation, Link, ProductComponent, Type, TypeKind};
use prodex_core::ModelStore;

/// Date shorthand for fixtures
#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Policy type with an optional supertype
#[allow(dead_code)]
pub fn policy_type(name: &str, supertype: Option<&str>) -> Type {
    let mut ty = Type::new(name, TypeKind::Policy);
    ty.supertype = supertype.map(str::to_string);
    ty
}

/// Product type configuring `policy`
#[allow(dead_code)]
pub fn product_type(name: &str, supertype: Option<&str>, policy: &str) -> Type {
    let mut ty = Type::new(name, TypeKind::Product);
    ty.supertype = supertype.map(str::to_string);
    ty.configures = Some(policy.to_string());
    ty
}

/// Unbounded association with plural role `<singular>s`
#[allow(dead_code)]
pub fn to_many(target: &str, singular: &str) -> Association {
    Association::to_many(target, singular, format!("{}s", singular))
}

#[allow(dead_code)]
pub fn store_with_types(types: Vec<Type>) -> ModelStore {
    let mut store = ModelStore::new();
    for ty in types {
        store.insert_type(ty);
    }
    store
}

/// Component with one generation from 2024-01-01 linking to `targets`
#[allow(dead_code)]
pub fn linked_component(name: &str, targets: &[&str]) -> ProductComponent {
    let mut component = ProductComponent::new(name, "motor.MotorPolicy");
    let mut generation = Generation::new(date(2024, 1, 1));
    for target in targets {
        generation.add_link(Link::new("Part", *target));
    }
    component.add_generation(generation);
    component
}

#[allow(dead_code)]
pub fn store_with_components(components: Vec<ProductComponent>) -> ModelStore {
    let mut store = ModelStore::new();
    for component in components {
        store.insert_component(component);
    }
    store
}
