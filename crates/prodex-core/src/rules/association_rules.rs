//! Association constraint resolution and validation
//!
//! Covers derived unions and their subsets, constrained (narrowed)
//! associations, inverse associations and the pairing of policy-side and
//! product-side associations across twin hierarchies.

use std::collections::HashSet;
use std::ptr;

use crate::hierarchy::{
    find_association, find_supertype_association, find_twin_type, is_subtype_of, walk,
};
use crate::model::{Association, Cardinality, Type};
use crate::ops::ModelStore;
use crate::rules::messages::{part_object, Message, MessageCode, MessageList};

const PROP_TARGET: &str = "target";
const PROP_ROLE_SINGULAR: &str = "target_role_singular";
const PROP_ROLE_PLURAL: &str = "target_role_plural";
const PROP_MIN: &str = "min_cardinality";
const PROP_MAX: &str = "max_cardinality";
const PROP_KIND: &str = "kind";
const PROP_DERIVED_UNION: &str = "derived_union";
const PROP_SUBSET: &str = "subsetted_derived_union";
const PROP_CONSTRAIN: &str = "constrain";
const PROP_INVERSE: &str = "inverse_association";

/// Validate every association declared on `ty`
pub fn validate_associations(store: &ModelStore, ty: &Type) -> MessageList {
    let mut list = MessageList::new();
    for association in &ty.associations {
        list.extend(validate_association(store, ty, association));
    }
    list
}

/// Validate one association in the context of its owning type
pub fn validate_association(store: &ModelStore, owner: &Type, association: &Association) -> MessageList {
    let mut list = MessageList::new();
    let object = part_object(&owner.qualified_name, association.name());

    validate_roles_and_cardinality(association, &object, &mut list);

    let target = store.find_type(&owner.project, &association.target);
    if target.is_none() {
        list.add(
            Message::error(
                MessageCode::TargetDoesNotExist,
                format!("Target type {} does not exist", association.target),
            )
            .on(&object, PROP_TARGET),
        );
    }

    validate_subset(store, owner, association, target, &object, &mut list);
    if let Some(target) = target {
        validate_inverse(store, owner, association, target, &object, &mut list);
    }
    validate_constrain(store, owner, association, target, &object, &mut list);

    list
}

fn validate_roles_and_cardinality(association: &Association, object: &str, list: &mut MessageList) {
    if association.target_role_singular.trim().is_empty() {
        list.add(
            Message::error(
                MessageCode::TargetRoleSingularMustBeSet,
                "The singular target role must be set",
            )
            .on(object, PROP_ROLE_SINGULAR),
        );
    }

    let plural = association.target_role_plural.trim();
    if association.is_plural_required() && plural.is_empty() {
        list.add(
            Message::error(
                MessageCode::TargetRolePluralMustBeSet,
                "The plural target role must be set when more than one target is allowed",
            )
            .on(object, PROP_ROLE_PLURAL),
        );
    }
    if !plural.is_empty() && plural == association.target_role_singular.trim() {
        list.add(
            Message::error(
                MessageCode::TargetRolePluralEqualsTargetRoleSingular,
                format!("Plural and singular target role are both '{}'", plural),
            )
            .on(object, PROP_ROLE_SINGULAR)
            .on(object, PROP_ROLE_PLURAL),
        );
    }

    match association.max_cardinality {
        Cardinality::Bounded(0) => list.add(
            Message::error(
                MessageCode::MaxCardinalityMustBeAtLeast1,
                "The maximum cardinality must be at least 1",
            )
            .on(object, PROP_MAX),
        ),
        Cardinality::Bounded(max) if max < association.min_cardinality => list.add(
            Message::error(
                MessageCode::MaxIsLessThanMin,
                format!(
                    "Maximum cardinality {} is less than minimum cardinality {}",
                    max, association.min_cardinality
                ),
            )
            .on(object, PROP_MIN)
            .on(object, PROP_MAX),
        ),
        _ => {}
    }
}

// ===== Derived unions =====

/// Derived unions that `association` could subset
///
/// A candidate is declared on the owner or one of its ancestors, is marked
/// as a derived union, is not `association` itself, and targets the
/// association's target or one of its supertypes. Candidates come back in
/// supertype-to-subtype order. An unresolvable target yields no candidates.
pub fn find_derived_union_candidates<'a>(
    store: &'a ModelStore,
    owner: &'a Type,
    association: &Association,
) -> Vec<&'a Association> {
    let Some(target) = store.find_type(&owner.project, &association.target) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for ty in walk(store, owner).top_down() {
        for candidate in &ty.associations {
            if !candidate.derived_union || ptr::eq(candidate, association) {
                continue;
            }
            let Some(union_target) = store.find_type(&ty.project, &candidate.target) else {
                continue;
            };
            if is_subtype_of(store, target, &union_target.qualified_name) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

fn validate_subset(
    store: &ModelStore,
    owner: &Type,
    association: &Association,
    target: Option<&Type>,
    object: &str,
    list: &mut MessageList,
) {
    let Some(union_name) = association.subsetted_derived_union.as_deref() else {
        return;
    };

    if association.derived_union && union_name == association.name() {
        list.add(
            Message::error(
                MessageCode::DerivedUnionSubsetNotSameAsDerivedUnion,
                format!("Derived union {} cannot subset itself", union_name),
            )
            .on(object, PROP_DERIVED_UNION)
            .on(object, PROP_SUBSET),
        );
        return;
    }

    let Some((union_owner, union)) = find_association(store, owner, union_name) else {
        list.add(
            Message::error(
                MessageCode::DerivedUnionNotFound,
                format!("Derived union {} does not exist", union_name),
            )
            .on(object, PROP_SUBSET),
        );
        return;
    };

    if !union.derived_union {
        list.add(
            Message::error(
                MessageCode::NotMarkedAsDerivedUnion,
                format!(
                    "Association {} is not marked as derived union",
                    part_object(&union_owner.qualified_name, union.name())
                ),
            )
            .on(object, PROP_SUBSET),
        );
        return;
    }

    let Some(union_target) = store.find_type(&union_owner.project, &union.target) else {
        list.add(
            Message::error(
                MessageCode::TargetOfDerivedUnionDoesNotExist,
                format!("Target {} of derived union {} does not exist", union.target, union_name),
            )
            .on(object, PROP_SUBSET),
        );
        return;
    };

    if let Some(target) = target {
        if !is_subtype_of(store, target, &union_target.qualified_name) {
            list.add(
                Message::error(
                    MessageCode::TargetTypeNotASubtype,
                    format!(
                        "Target {} is not a subtype of the derived union's target {}",
                        target.qualified_name, union_target.qualified_name
                    ),
                )
                .on(object, PROP_TARGET),
            );
        }
    }

    // Bounded against unbounded is left alone.
    let differs = match (association.max_cardinality, union.max_cardinality) {
        (Cardinality::Bounded(own), Cardinality::Bounded(of_union)) => own != of_union,
        _ => false,
    };
    if differs {
        list.add(
            Message::error(
                MessageCode::SubsetOfDerivedUnionSameMaxCardinality,
                format!(
                    "Maximum cardinality {} differs from {} of derived union {}",
                    association.max_cardinality, union.max_cardinality, union_name
                ),
            )
            .on(object, PROP_MAX),
        );
    }
}

// ===== Inverse =====

fn validate_inverse(
    store: &ModelStore,
    owner: &Type,
    association: &Association,
    target: &Type,
    object: &str,
    list: &mut MessageList,
) {
    let Some(inverse_name) = association.inverse_association.as_deref() else {
        return;
    };
    let Some((_, inverse)) = find_association(store, target, inverse_name) else {
        list.add(
            Message::error(
                MessageCode::InverseAssociationDoesNotExist,
                format!(
                    "Inverse association {} does not exist on {}",
                    inverse_name, target.qualified_name
                ),
            )
            .on(object, PROP_INVERSE),
        );
        return;
    };

    let points_back = inverse.inverse_association.as_deref() == Some(association.name());
    let targets_owner = is_subtype_of(store, owner, &inverse.target);
    if !points_back || !targets_owner {
        list.add(
            Message::error(
                MessageCode::InverseAssociationMismatch,
                format!(
                    "Inverse association {} does not point back to {}",
                    part_object(&target.qualified_name, inverse_name),
                    object
                ),
            )
            .on(object, PROP_INVERSE),
        );
    }
}

// ===== Constrain =====

fn validate_constrain(
    store: &ModelStore,
    owner: &Type,
    association: &Association,
    target: Option<&Type>,
    object: &str,
    list: &mut MessageList,
) {
    if !association.constrain {
        return;
    }

    if association.derived_union {
        list.add(
            Message::error(
                MessageCode::ConstrainDerivedUnion,
                "A derived union cannot constrain another association",
            )
            .on(object, PROP_CONSTRAIN),
        );
    }
    if association.is_subset_of_derived_union() {
        list.add(
            Message::error(
                MessageCode::ConstrainSubsetDerivedUnion,
                "A subset of a derived union cannot constrain another association",
            )
            .on(object, PROP_CONSTRAIN),
        );
    }

    let Some((super_owner, constrained)) =
        find_supertype_association(store, owner, association.name())
    else {
        list.add(
            Message::error(
                MessageCode::ConstrainedSingularNotFound,
                format!(
                    "No supertype of {} declares an association {}",
                    owner.qualified_name,
                    association.name()
                ),
            )
            .on(object, PROP_ROLE_SINGULAR),
        );
        return;
    };

    let plural_differs = association.target_role_plural != constrained.target_role_plural;
    if plural_differs && (association.is_plural_required() || constrained.is_plural_required()) {
        list.add(
            Message::error(
                MessageCode::ConstrainedPluralNotFound,
                format!(
                    "Plural role {} does not match {} of the constrained association",
                    association.target_role_plural, constrained.target_role_plural
                ),
            )
            .on(object, PROP_ROLE_PLURAL),
        );
    }

    if constrained.derived_union {
        list.add(
            Message::error(
                MessageCode::ConstrainedDerivedUnion,
                "A derived union cannot be constrained",
            )
            .on(object, PROP_CONSTRAIN),
        );
    }
    if constrained.is_subset_of_derived_union() {
        list.add(
            Message::error(
                MessageCode::ConstrainedSubsetDerivedUnion,
                "A subset of a derived union cannot be constrained",
            )
            .on(object, PROP_CONSTRAIN),
        );
    }

    let constrained_target = store.find_type(&super_owner.project, &constrained.target);
    if let (Some(target), Some(constrained_target)) = (target, constrained_target) {
        if !is_subtype_of(store, target, &constrained_target.qualified_name) {
            list.add(
                Message::error(
                    MessageCode::ConstrainedTargetSupertypNotCovariant,
                    format!(
                        "Target {} is not a subtype of {}",
                        target.qualified_name, constrained_target.qualified_name
                    ),
                )
                .on(object, PROP_TARGET),
            );
        }
    }

    if association.min_cardinality != constrained.min_cardinality {
        list.add(
            Message::error(
                MessageCode::MinCardinalityNotEqualToSuperAssociation,
                format!(
                    "Minimum cardinality {} differs from {} of the constrained association",
                    association.min_cardinality, constrained.min_cardinality
                ),
            )
            .on(object, PROP_MIN),
        );
    }
    if association.max_cardinality != constrained.max_cardinality {
        list.add(
            Message::error(
                MessageCode::MaxCardinalityNotEqualToSuperAssociation,
                format!(
                    "Maximum cardinality {} differs from {} of the constrained association",
                    association.max_cardinality, constrained.max_cardinality
                ),
            )
            .on(object, PROP_MAX),
        );
    }
    if association.kind != constrained.kind {
        list.add(
            Message::error(
                MessageCode::AssociationTypeNotEqualToSuperAssociation,
                format!(
                    "Association kind {} differs from {} of the constrained association",
                    association.kind.as_str(),
                    constrained.kind.as_str()
                ),
            )
            .on(object, PROP_KIND),
        );
    }

    if !has_valid_matching_constrain(store, owner, association, super_owner, constrained) {
        list.add(
            Message::error(
                MessageCode::ConstrainInvalidMatchingAssociation,
                format!(
                    "The matching association of {} must constrain the matching association of {}",
                    object,
                    part_object(&super_owner.qualified_name, constrained.name())
                ),
            )
            .on(object, PROP_CONSTRAIN),
        );
    }
}

/// Check the twin side of a constrained association
///
/// There is only an obligation when the constrained association itself has
/// a matching association. Then our matching association must be
/// constrained too, and must constrain exactly that one.
fn has_valid_matching_constrain(
    store: &ModelStore,
    owner: &Type,
    association: &Association,
    super_owner: &Type,
    constrained: &Association,
) -> bool {
    if !super_owner.is_configurable() {
        return true;
    }
    let Some((_, super_matching)) = find_matching_association(store, super_owner, constrained)
    else {
        return true;
    };
    let Some((matching_owner, matching)) = find_matching_association(store, owner, association)
    else {
        return false;
    };
    if !matching.constrain {
        return false;
    }
    match find_supertype_association(store, matching_owner, matching.name()) {
        Some((_, matching_constrained)) => ptr::eq(matching_constrained, super_matching),
        None => false,
    }
}

/// The twin-side association paired with `association`
///
/// Found on the owner's twin type (or its ancestors, nearest first) as the
/// association whose target is the twin of `association`'s target.
/// Detail-to-master compositions never have a matching association.
pub fn find_matching_association<'a>(
    store: &'a ModelStore,
    owner: &'a Type,
    association: &Association,
) -> Option<(&'a Type, &'a Association)> {
    if association.is_composition_detail_to_master() {
        return None;
    }
    let twin = find_twin_type(store, owner)?;
    let target = store.find_type(&owner.project, &association.target)?;
    let target_twin = find_twin_type(store, target)?;

    walk(store, twin).types.into_iter().find_map(|ty| {
        ty.associations
            .iter()
            .find(|a| a.target == target_twin.qualified_name && !a.is_composition_detail_to_master())
            .map(|a| (ty, a))
    })
}

/// Inherited associations `ty` could still constrain
///
/// Excludes derived unions, subsets of derived unions and any role already
/// declared on `ty` itself. Nearest declaration wins per role.
pub fn find_constrainable_association_candidates<'a>(
    store: &'a ModelStore,
    ty: &'a Type,
) -> Vec<&'a Association> {
    let own: HashSet<&str> = ty.associations.iter().map(Association::name).collect();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for supertype in walk(store, ty).supertypes() {
        for association in &supertype.associations {
            if !seen.insert(association.name()) {
                continue;
            }
            if association.derived_union
                || association.is_subset_of_derived_union()
                || own.contains(association.name())
            {
                continue;
            }
            candidates.push(association);
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssociationKind, TypeKind};

    fn policy(name: &str, supertype: Option<&str>) -> Type {
        let mut ty = Type::new(name, TypeKind::Policy);
        ty.supertype = supertype.map(str::to_string);
        ty
    }

    fn store_with(types: Vec<Type>) -> ModelStore {
        let mut store = ModelStore::new();
        for ty in types {
            store.insert_type(ty);
        }
        store
    }

    fn codes(list: &MessageList) -> Vec<&'static str> {
        list.iter().map(|m| m.code.code()).collect()
    }

    #[test]
    fn test_roles_and_cardinality() {
        let mut assoc = Association::new("T", "");
        assoc.max_cardinality = Cardinality::Bounded(0);
        let mut list = MessageList::new();
        validate_roles_and_cardinality(&assoc, "X#", &mut list);
        assert_eq!(
            codes(&list),
            vec!["TARGET_ROLE_SINGULAR_MUST_BE_SET", "MAX_CARDINALITY_MUST_BE_AT_LEAST_1"]
        );

        let mut assoc = Association::new("T", "item");
        assoc.min_cardinality = 3;
        assoc.max_cardinality = Cardinality::Bounded(2);
        let mut list = MessageList::new();
        validate_roles_and_cardinality(&assoc, "X#item", &mut list);
        assert_eq!(
            codes(&list),
            vec!["TARGET_ROLE_PLURAL_MUST_BE_SET", "MAX_IS_LESS_THAN_MIN"]
        );

        let assoc = Association::to_many("T", "item", "item");
        let mut list = MessageList::new();
        validate_roles_and_cardinality(&assoc, "X#item", &mut list);
        assert_eq!(
            codes(&list),
            vec!["TARGET_ROLE_PLURAL_EQUALS_TARGET_ROLE_SINGULAR"]
        );
    }

    #[test]
    fn test_target_does_not_exist() {
        let mut a = policy("A", None);
        a.add_association(Association::new("Missing", "missing"));
        let store = store_with(vec![a]);
        let a = store.get_type("A").unwrap();

        let list = validate_associations(&store, a);
        assert!(list.contains_code(MessageCode::TargetDoesNotExist));
    }

    #[test]
    fn test_derived_union_candidates_in_supertype_first_order() {
        let mut base = policy("Base", None);
        let mut du = Association::to_many("Part", "part", "parts");
        du.derived_union = true;
        base.add_association(du);

        let mut sub = policy("Sub", Some("Base"));
        let mut du2 = Association::to_many("Wheel", "wheelish", "wheelishes");
        du2.derived_union = true;
        sub.add_association(du2);
        sub.add_association(Association::to_many("Wheel", "wheel", "wheels"));
        sub.add_association(Association::to_many("Other", "other", "others"));

        let store = store_with(vec![
            base,
            sub,
            policy("Part", None),
            policy("Wheel", Some("Part")),
            policy("Other", None),
        ]);
        let sub = store.get_type("Sub").unwrap();

        let wheel = sub.association("wheel").unwrap();
        let names: Vec<&str> = find_derived_union_candidates(&store, sub, wheel)
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(names, vec!["part", "wheelish"]);

        // A derived union is never its own candidate.
        let wheelish = sub.association("wheelish").unwrap();
        let names: Vec<&str> = find_derived_union_candidates(&store, sub, wheelish)
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(names, vec!["part"]);

        let other = sub.association("other").unwrap();
        assert!(find_derived_union_candidates(&store, sub, other).is_empty());
    }

    #[test]
    fn test_derived_union_subsetting_itself() {
        let mut a = policy("A", None);
        let mut du = Association::to_many("A", "part", "parts");
        du.derived_union = true;
        du.subsetted_derived_union = Some("part".to_string());
        a.add_association(du);
        let store = store_with(vec![a]);
        let a = store.get_type("A").unwrap();

        let list = validate_associations(&store, a);
        assert_eq!(codes(&list), vec!["DERIVED_UNION_SUBSET_NOT_SAME_AS_DERIVED_UNION"]);
    }

    #[test]
    fn test_subset_target_must_be_subtype() {
        let mut base = policy("Base", None);
        let mut du = Association::to_many("Part", "part", "parts");
        du.derived_union = true;
        base.add_association(du);
        let mut sub = policy("Sub", Some("Base"));
        let mut subset = Association::to_many("Other", "other", "others");
        subset.subsetted_derived_union = Some("part".to_string());
        sub.add_association(subset);
        let store = store_with(vec![base, sub, policy("Part", None), policy("Other", None)]);
        let sub = store.get_type("Sub").unwrap();

        let list = validate_associations(&store, sub);
        assert_eq!(codes(&list), vec!["TARGET_TYPE_NOT_A_SUBTYPE"]);
    }

    #[test]
    fn test_inverse_association() {
        let mut a = policy("A", None);
        let mut to_b = Association::new("B", "b");
        to_b.inverse_association = Some("a".to_string());
        a.add_association(to_b);
        let mut b = policy("B", None);
        b.add_association(Association::new("A", "a"));
        let store = store_with(vec![a, b]);

        let a_ty = store.get_type("A").unwrap();
        let list = validate_associations(&store, a_ty);
        assert_eq!(codes(&list), vec!["INVERSE_ASSOCIATION_MISMATCH"]);

        let mut store = store;
        store.get_type_mut("B").unwrap().associations[0].inverse_association =
            Some("b".to_string());
        let a_ty = store.get_type("A").unwrap();
        assert!(validate_associations(&store, a_ty).is_empty());

        store.get_type_mut("A").unwrap().associations[0].inverse_association =
            Some("nothing".to_string());
        let a_ty = store.get_type("A").unwrap();
        assert_eq!(
            codes(&validate_associations(&store, a_ty)),
            vec!["INVERSE_ASSOCIATION_DOES_NOT_EXIST"]
        );
    }

    #[test]
    fn test_constrain_mismatches() {
        let mut base = policy("Base", None);
        base.add_association(Association::to_many("Part", "part", "parts"));
        let mut sub = policy("Sub", Some("Base"));
        let mut narrowed = Association::to_many("Other", "part", "pieces");
        narrowed.constrain = true;
        narrowed.min_cardinality = 1;
        narrowed.kind = AssociationKind::Aggregation;
        sub.add_association(narrowed);
        let store = store_with(vec![base, sub, policy("Part", None), policy("Other", None)]);
        let sub = store.get_type("Sub").unwrap();

        let list = validate_associations(&store, sub);
        assert_eq!(
            codes(&list),
            vec![
                "CONSTRAINED_PLURAL_NOT_FOUND",
                "CONSTRAINED_TARGET_SUPERTYP_NOT_COVARIANT",
                "MIN_CARDINALITY_NOT_EQUAL_TO_SUPER_ASSOCIATION",
                "ASSOCIATION_TYPE_NOT_EQUAL_TO_SUPER_ASSOCIATION",
            ]
        );
    }

    #[test]
    fn test_constrain_without_super_association() {
        let mut a = policy("A", None);
        let mut narrowed = Association::new("A", "self");
        narrowed.constrain = true;
        a.add_association(narrowed);
        let store = store_with(vec![a]);
        let a = store.get_type("A").unwrap();

        let list = validate_associations(&store, a);
        assert_eq!(codes(&list), vec!["CONSTRAINED_SINGULAR_NOT_FOUND"]);
    }

    #[test]
    fn test_constrainable_candidates() {
        let mut base = policy("Base", None);
        base.add_association(Association::to_many("Part", "part", "parts"));
        base.add_association(Association::new("Part", "main"));
        let mut du = Association::to_many("Part", "any", "anys");
        du.derived_union = true;
        base.add_association(du);
        let mut subset = Association::to_many("Part", "special", "specials");
        subset.subsetted_derived_union = Some("any".to_string());
        base.add_association(subset);

        let mut sub = policy("Sub", Some("Base"));
        let mut narrowed = Association::to_many("Part", "part", "parts");
        narrowed.constrain = true;
        sub.add_association(narrowed);

        let store = store_with(vec![base, sub, policy("Part", None)]);
        let sub = store.get_type("Sub").unwrap();

        let names: Vec<&str> = find_constrainable_association_candidates(&store, sub)
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(names, vec!["main"]);
    }
}
