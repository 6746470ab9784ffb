//! Supertype hierarchy traversal
//!
//! All lookups walk from a type up through its supertypes, resolving each
//! supertype name against the project index as seen from the type's own
//! project. Walks carry a visited set, so a cyclic chain ends the walk and is
//! reported instead of looping.

use std::collections::HashSet;

use crate::errors::{ProdexError, Result};
use crate::model::{Association, Attribute, Type};
use crate::ops::ModelStore;

/// Result of walking a supertype chain
#[derive(Debug, Clone)]
pub struct Hierarchy<'a> {
    /// Start type first, then its ancestors nearest first
    pub types: Vec<&'a Type>,

    /// Chain of names ending with the revisited type, if the walk hit a cycle
    pub cycle: Option<Vec<String>>,

    /// Supertype name that could not be resolved, if the walk stopped there
    pub unresolved: Option<String>,
}

impl<'a> Hierarchy<'a> {
    pub fn is_cyclic(&self) -> bool {
        self.cycle.is_some()
    }

    /// Ancestors only, nearest first
    pub fn supertypes(&self) -> &[&'a Type] {
        &self.types[1..]
    }

    /// Root-most type first, start type last
    pub fn top_down(&self) -> impl Iterator<Item = &'a Type> + '_ {
        self.types.iter().rev().copied()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.types.iter().any(|t| t.qualified_name == qualified_name)
    }
}

/// Resolve the direct supertype of `ty` from `ty`'s project
pub fn find_supertype<'a>(store: &'a ModelStore, ty: &Type) -> Option<&'a Type> {
    let name = ty.supertype.as_deref()?;
    store.find_type(&ty.project, name)
}

/// Resolve the twin type `ty` configures
pub fn find_twin_type<'a>(store: &'a ModelStore, ty: &Type) -> Option<&'a Type> {
    let name = ty.configures.as_deref()?;
    store.find_type(&ty.project, name)
}

/// Walk the supertype chain of `start`, stopping at a cycle or dangling name
pub fn walk<'a>(store: &'a ModelStore, start: &'a Type) -> Hierarchy<'a> {
    let mut types = vec![start];
    let mut visited = HashSet::new();
    visited.insert(start.qualified_name.as_str());

    let mut current = start;
    loop {
        let Some(super_name) = current.supertype.as_deref() else {
            return Hierarchy {
                types,
                cycle: None,
                unresolved: None,
            };
        };
        let Some(next) = store.find_type(&current.project, super_name) else {
            return Hierarchy {
                types,
                cycle: None,
                unresolved: Some(super_name.to_string()),
            };
        };
        if !visited.insert(next.qualified_name.as_str()) {
            let mut chain: Vec<String> =
                types.iter().map(|t| t.qualified_name.clone()).collect();
            chain.push(next.qualified_name.clone());
            tracing::warn!(
                type_name = %start.qualified_name,
                chain = %chain.join(" -> "),
                "supertype hierarchy is cyclic"
            );
            return Hierarchy {
                types,
                cycle: Some(chain),
                unresolved: None,
            };
        }
        types.push(next);
        current = next;
    }
}

/// Supertype chain of `ty`, start type first
///
/// # Errors
///
/// Returns `SupertypeCycle` if the chain revisits a type.
pub fn supertype_chain<'a>(store: &'a ModelStore, ty: &'a Type) -> Result<Vec<&'a Type>> {
    let hierarchy = walk(store, ty);
    match hierarchy.cycle {
        Some(chain) => Err(ProdexError::SupertypeCycle {
            type_name: ty.qualified_name.clone(),
            chain,
        }),
        None => Ok(hierarchy.types),
    }
}

/// True if `a` is `b` or one of `a`'s ancestors is `b`
///
/// A cyclic chain is walked up to the repeat and then answered from what
/// was seen; the cycle itself is reported by type validation.
pub fn is_subtype_of(store: &ModelStore, a: &Type, b: &str) -> bool {
    walk(store, a).contains(b)
}

/// True if one of `a`'s ancestors (not `a` itself) is `b`
pub fn is_strict_subtype_of(store: &ModelStore, a: &Type, b: &str) -> bool {
    a.qualified_name != b && is_subtype_of(store, a, b)
}

/// All attributes visible from `ty`, nearest declaration first
///
/// An attribute declared closer to `ty` hides same-named attributes further
/// up the chain.
pub fn find_all_attributes<'a>(store: &'a ModelStore, ty: &'a Type) -> Vec<&'a Attribute> {
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    for t in walk(store, ty).types {
        for attribute in &t.attributes {
            if seen.insert(attribute.name.as_str()) {
                all.push(attribute);
            }
        }
    }
    all
}

/// All associations visible from `ty`, nearest declaration first
///
/// Shadowing is by singular role name, as for attributes.
pub fn find_all_associations<'a>(store: &'a ModelStore, ty: &'a Type) -> Vec<&'a Association> {
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    for t in walk(store, ty).types {
        for association in &t.associations {
            if seen.insert(association.target_role_singular.as_str()) {
                all.push(association);
            }
        }
    }
    all
}

/// Find an attribute by name on `ty` or its nearest ancestor declaring it
pub fn find_attribute<'a>(
    store: &'a ModelStore,
    ty: &'a Type,
    name: &str,
) -> Option<(&'a Type, &'a Attribute)> {
    walk(store, ty)
        .types
        .into_iter()
        .find_map(|t| t.attribute(name).map(|a| (t, a)))
}

/// Find the supertype attribute an overwriting attribute shadows
pub fn find_overwritten_attribute<'a>(
    store: &'a ModelStore,
    ty: &'a Type,
    name: &str,
) -> Option<(&'a Type, &'a Attribute)> {
    walk(store, ty)
        .supertypes()
        .iter()
        .find_map(|t| t.attribute(name).map(|a| (*t, a)))
}

/// Find an association by singular role on `ty` or its ancestors
pub fn find_association<'a>(
    store: &'a ModelStore,
    ty: &'a Type,
    role_singular: &str,
) -> Option<(&'a Type, &'a Association)> {
    walk(store, ty)
        .types
        .into_iter()
        .find_map(|t| t.association(role_singular).map(|a| (t, a)))
}

/// Find an association by singular role on the ancestors of `ty` only
pub fn find_supertype_association<'a>(
    store: &'a ModelStore,
    ty: &'a Type,
    role_singular: &str,
) -> Option<(&'a Type, &'a Association)> {
    walk(store, ty)
        .supertypes()
        .iter()
        .find_map(|t| t.association(role_singular).map(|a| (*t, a)))
}

/// Find an association by plural role on `ty` or its ancestors
pub fn find_association_by_plural<'a>(
    store: &'a ModelStore,
    ty: &'a Type,
    role_plural: &str,
) -> Option<(&'a Type, &'a Association)> {
    if role_plural.is_empty() {
        return None;
    }
    walk(store, ty).types.into_iter().find_map(|t| {
        t.associations
            .iter()
            .find(|a| a.target_role_plural == role_plural)
            .map(|a| (t, a))
    })
}
