#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::HashSet;

use common::{policy_type, store_with_types};
use prodex_core::hierarchy::{is_strict_subtype_of, is_subtype_of, supertype_chain, walk};
use prodex_core::ModelStore;
use proptest::prelude::*;

/// Types `t0..tn`, each pointing at an arbitrary supertype (possibly
/// missing, possibly itself)
fn arbitrary_hierarchy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..8).prop_flat_map(|n| prop::collection::vec(prop::option::of(0usize..n + 1), n))
}

fn build(supertypes: &[Option<usize>]) -> ModelStore {
    let types = supertypes
        .iter()
        .enumerate()
        .map(|(i, sup)| {
            let sup = sup.map(|s| format!("t{}", s));
            policy_type(&format!("t{}", i), sup.as_deref())
        })
        .collect();
    store_with_types(types)
}

/// Follow supertype indices by hand; true if an index repeats
fn has_cycle(supertypes: &[Option<usize>], start: usize) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(i) = current {
        if i >= supertypes.len() {
            return false;
        }
        if !seen.insert(i) {
            return true;
        }
        current = supertypes[i];
    }
    false
}

proptest! {
    #[test]
    fn walk_terminates_and_detects_cycles(supertypes in arbitrary_hierarchy()) {
        let store = build(&supertypes);
        for i in 0..supertypes.len() {
            let ty = store.get_type(&format!("t{}", i)).unwrap();
            let hierarchy = walk(&store, ty);

            let names: HashSet<&str> =
                hierarchy.types.iter().map(|t| t.qualified_name.as_str()).collect();
            prop_assert_eq!(names.len(), hierarchy.types.len());
            prop_assert_eq!(hierarchy.is_cyclic(), has_cycle(&supertypes, i));
            prop_assert_eq!(supertype_chain(&store, ty).is_err(), hierarchy.is_cyclic());
        }
    }

    #[test]
    fn subtype_relation_is_reflexive_and_follows_chain(supertypes in arbitrary_hierarchy()) {
        let store = build(&supertypes);
        for i in 0..supertypes.len() {
            let ty = store.get_type(&format!("t{}", i)).unwrap();
            prop_assert!(is_subtype_of(&store, ty, &ty.qualified_name));
            prop_assert!(!is_strict_subtype_of(&store, ty, &ty.qualified_name));

            for ancestor in walk(&store, ty).supertypes() {
                prop_assert!(is_subtype_of(&store, ty, &ancestor.qualified_name));
            }
        }
    }
}
