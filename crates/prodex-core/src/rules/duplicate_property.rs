//! Duplicate property names across a type hierarchy
//!
//! Attributes and association roles (singular, plus plural where a plural
//! is required) of a type and all its ancestors share one namespace. A name
//! claimed by two distinct properties is a collision unless every pair in
//! the collision is one of the known legitimate patterns:
//!
//! - an attribute flagged `overwrite` shadowing the ancestor attribute
//! - a constrained association narrowing the ancestor association
//! - a derived union and its inverse
//! - the detail-to-master inverses of a derived union and of one of its subsets

use std::collections::BTreeMap;
use std::ptr;

use crate::hierarchy::{find_association, is_strict_subtype_of, walk};
use crate::model::{Association, Attribute, Type};
use crate::ops::ModelStore;
use crate::rules::messages::{part_object, Message, MessageCode, MessageList};

#[derive(Debug, Clone, Copy)]
enum Part<'a> {
    Attribute(&'a Attribute),
    Association { association: &'a Association, plural: bool },
}

#[derive(Debug, Clone, Copy)]
struct Property<'a> {
    owner: &'a Type,
    part: Part<'a>,
}

impl<'a> Property<'a> {
    fn name(&self) -> &'a str {
        match self.part {
            Part::Attribute(a) => &a.name,
            Part::Association {
                association,
                plural: false,
            } => &association.target_role_singular,
            Part::Association {
                association,
                plural: true,
            } => &association.target_role_plural,
        }
    }

    /// Same underlying attribute or association
    fn same_part(&self, other: &Property<'_>) -> bool {
        match (self.part, other.part) {
            (Part::Attribute(a), Part::Attribute(b)) => ptr::eq(a, b),
            (
                Part::Association { association: a, .. },
                Part::Association { association: b, .. },
            ) => ptr::eq(a, b),
            _ => false,
        }
    }

    fn object(&self) -> String {
        let part_name = match self.part {
            Part::Attribute(a) => &a.name,
            Part::Association { association, .. } => &association.target_role_singular,
        };
        part_object(&self.owner.qualified_name, part_name)
    }

    fn property(&self) -> &'static str {
        match self.part {
            Part::Attribute(_) => "name",
            Part::Association { plural: false, .. } => "target_role_singular",
            Part::Association { plural: true, .. } => "target_role_plural",
        }
    }
}

/// Report property name collisions visible from `ty`
///
/// Only collisions involving a property declared on `ty` itself are
/// reported; collisions among ancestors belong to the ancestor.
pub fn validate_duplicate_properties(
    store: &ModelStore,
    ty: &Type,
    case_insensitive: bool,
) -> MessageList {
    let mut groups: BTreeMap<String, Vec<Property<'_>>> = BTreeMap::new();

    for owner in walk(store, ty).types {
        for attribute in &owner.attributes {
            push(&mut groups, case_insensitive, Property {
                owner,
                part: Part::Attribute(attribute),
            });
        }
        for association in &owner.associations {
            push(&mut groups, case_insensitive, Property {
                owner,
                part: Part::Association {
                    association,
                    plural: false,
                },
            });
            if association.is_plural_required() {
                push(&mut groups, case_insensitive, Property {
                    owner,
                    part: Part::Association {
                        association,
                        plural: true,
                    },
                });
            }
        }
    }

    let mut list = MessageList::new();
    for members in groups.values() {
        if members.len() < 2 || !members.iter().any(|p| ptr::eq(p.owner, ty)) {
            continue;
        }
        if !has_unexplained_pair(store, members) {
            continue;
        }

        let mut message = Message::error(
            MessageCode::DuplicatePropertyName,
            format!(
                "Property name '{}' is used by {} properties in the hierarchy of {}",
                members[0].name(),
                members.len(),
                ty.qualified_name
            ),
        );
        for member in members {
            message = message.on(member.object(), member.property());
        }
        list.add(message);
    }
    list
}

fn push<'a>(
    groups: &mut BTreeMap<String, Vec<Property<'a>>>,
    case_insensitive: bool,
    property: Property<'a>,
) {
    let name = property.name().trim();
    if name.is_empty() {
        return;
    }
    let key = if case_insensitive {
        name.to_lowercase()
    } else {
        name.to_string()
    };
    let group = groups.entry(key).or_default();
    if !group.iter().any(|p| p.same_part(&property)) {
        group.push(property);
    }
}

fn has_unexplained_pair(store: &ModelStore, members: &[Property<'_>]) -> bool {
    for (i, p) in members.iter().enumerate() {
        for q in &members[i + 1..] {
            if !is_explained(store, p, q) {
                return true;
            }
        }
    }
    false
}

fn is_explained(store: &ModelStore, p: &Property<'_>, q: &Property<'_>) -> bool {
    match (p.part, q.part) {
        (Part::Attribute(a), Part::Attribute(b)) => {
            shadows(store, p.owner, a, q.owner, b) || shadows(store, q.owner, b, p.owner, a)
        }
        (
            Part::Association {
                association: a,
                plural: a_plural,
            },
            Part::Association {
                association: b,
                plural: b_plural,
            },
        ) => {
            let narrowing = a_plural == b_plural
                && (narrows(store, p.owner, a, q.owner, b) || narrows(store, q.owner, b, p.owner, a));
            narrowing
                || is_derived_union_inverse_pair(store, p.owner, a, q.owner, b)
                || is_inverse_of_union_and_subset(store, p.owner, a, q.owner, b)
        }
        _ => false,
    }
}

fn shadows(store: &ModelStore, sub: &Type, attr: &Attribute, sup: &Type, other: &Attribute) -> bool {
    attr.overwrite && attr.name == other.name && is_strict_subtype_of(store, sub, &sup.qualified_name)
}

fn narrows(
    store: &ModelStore,
    sub: &Type,
    association: &Association,
    sup: &Type,
    other: &Association,
) -> bool {
    association.constrain
        && association.target_role_singular == other.target_role_singular
        && is_strict_subtype_of(store, sub, &sup.qualified_name)
}

/// A derived union and its inverse, each resolving to the other on its target
fn is_derived_union_inverse_pair(
    store: &ModelStore,
    a_owner: &Type,
    a: &Association,
    b_owner: &Type,
    b: &Association,
) -> bool {
    let resolves_to = |owner: &Type, association: &Association, other: &Association| {
        resolve_inverse(store, owner, association)
            .is_some_and(|inverse| inverse.name() == other.name())
    };
    (a.derived_union || b.derived_union) && resolves_to(a_owner, a, b) && resolves_to(b_owner, b, a)
}

fn is_inverse_of_union_and_subset(
    store: &ModelStore,
    a_owner: &Type,
    a: &Association,
    b_owner: &Type,
    b: &Association,
) -> bool {
    if !a.is_composition_detail_to_master() || !b.is_composition_detail_to_master() {
        return false;
    }
    let (Some(inverse_a), Some(inverse_b)) =
        (resolve_inverse(store, a_owner, a), resolve_inverse(store, b_owner, b))
    else {
        return false;
    };
    let subsets = |union: &Association, subset: &Association| {
        union.derived_union && subset.subsetted_derived_union.as_deref() == Some(union.name())
    };
    subsets(inverse_a, inverse_b) || subsets(inverse_b, inverse_a)
}

fn resolve_inverse<'a>(
    store: &'a ModelStore,
    owner: &Type,
    association: &Association,
) -> Option<&'a Association> {
    let inverse_name = association.inverse_association.as_deref()?;
    let target = store.find_type(&owner.project, &association.target)?;
    find_association(store, target, inverse_name).map(|(_, a)| a)
}
