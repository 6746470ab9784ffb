//! Product component validation
//!
//! Checks a component's generations against its policy type and the
//! product type twinned with it. Findings on the same object coexist; only
//! a missing component or a failing formula compiler aborts.

use std::collections::{BTreeMap, HashSet};

use crate::cache::{component_key, ValidationCache};
use crate::errors::PxError;
use crate::formula::{resolve_parameters, CompileOutcome, FormulaCompiler, FormulaContext};
use crate::hierarchy::{
    find_all_associations, find_association, find_attribute, find_twin_type, is_subtype_of, walk,
};
use crate::model::{ConfigElement, ConfigValue, Generation, Method, ProductComponent, Type};
use crate::ops::ModelStore;
use crate::rules::messages::{Message, MessageCode, MessageList};
use crate::{log_op_end, log_op_error, log_op_start};

/// Object path of a generation
pub fn generation_object(component: &ProductComponent, generation: &Generation) -> String {
    format!("{}@{}", component.name, generation.valid_from)
}

/// Validate a product component by name
///
/// # Errors
///
/// Returns a `NotFound` error if the component does not exist, and
/// propagates compiler failures unchanged.
pub fn validate_component(
    store: &ModelStore,
    component_name: &str,
    compiler: Option<&dyn FormulaCompiler>,
) -> Result<MessageList, PxError> {
    log_op_start!("validate_component", component_name = component_name);
    let start = std::time::Instant::now();

    let result = validate_component_impl(store, component_name, compiler).map_err(|e| {
        log_op_error!(
            "validate_component",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "validate_component",
        duration_ms = start.elapsed().as_millis() as u64,
        component_name = component_name,
        message_count = result.len()
    );
    Ok(result)
}

/// Validate a component, reusing a cached result computed at the current
/// stamp
///
/// # Errors
///
/// See [`validate_component`].
pub fn validate_component_cached(
    store: &ModelStore,
    component_name: &str,
    compiler: Option<&dyn FormulaCompiler>,
    cache: &mut ValidationCache,
) -> Result<MessageList, PxError> {
    let stamp = store.modification_stamp();
    let key = component_key(component_name);
    if let Some(cached) = cache.get(stamp, &key) {
        return Ok(cached.clone());
    }
    let messages = validate_component(store, component_name, compiler)?;
    cache.insert(stamp, key, messages.clone());
    Ok(messages)
}

fn validate_component_impl(
    store: &ModelStore,
    component_name: &str,
    compiler: Option<&dyn FormulaCompiler>,
) -> Result<MessageList, PxError> {
    let component = store.get_component(component_name)?;
    let mut list = MessageList::new();

    let Some(policy_type) = store.find_type(&component.project, &component.policy_type) else {
        list.add(
            Message::error(
                MessageCode::PolicyTypeNotFound,
                format!("Policy type {} does not exist", component.policy_type),
            )
            .on(&component.name, "policy_type"),
        );
        return Ok(list);
    };
    let Some(product_type) = find_twin_type(store, policy_type) else {
        list.add(
            Message::error(
                MessageCode::ProductTypeNotFound,
                format!("Policy type {} is not configured by a product type", policy_type.qualified_name),
            )
            .on(&component.name, "policy_type"),
        );
        return Ok(list);
    };

    check_generation_dates(component, &mut list);

    let checker = GenerationChecker {
        store,
        component,
        policy_type,
        product_type,
        compiler,
    };
    for generation in &component.generations {
        checker.check(generation, &mut list)?;
    }
    Ok(list)
}

fn check_generation_dates(component: &ProductComponent, list: &mut MessageList) {
    let mut by_date: BTreeMap<_, Vec<&Generation>> = BTreeMap::new();
    for generation in &component.generations {
        by_date.entry(generation.valid_from).or_default().push(generation);
    }
    for (date, generations) in by_date {
        if generations.len() < 2 {
            continue;
        }
        let mut message = Message::error(
            MessageCode::DuplicateGenerationDate,
            format!("{} generations are valid from {}", generations.len(), date),
        );
        for generation in generations {
            message = message.on(generation_object(component, generation), "valid_from");
        }
        list.add(message);
    }
}

struct GenerationChecker<'a> {
    store: &'a ModelStore,
    component: &'a ProductComponent,
    policy_type: &'a Type,
    product_type: &'a Type,
    compiler: Option<&'a dyn FormulaCompiler>,
}

impl<'a> GenerationChecker<'a> {
    fn check(&self, generation: &Generation, list: &mut MessageList) -> Result<(), PxError> {
        let object = generation_object(self.component, generation);
        for element in &generation.config_elements {
            self.check_config_element(generation, element, &object, list)?;
        }
        self.check_links(generation, &object, list);
        Ok(())
    }

    fn check_config_element(
        &self,
        generation: &Generation,
        element: &ConfigElement,
        object: &str,
        list: &mut MessageList,
    ) -> Result<(), PxError> {
        match &element.value {
            ConfigValue::Value { value } => {
                let attribute = find_attribute(self.store, self.product_type, &element.property)
                    .or_else(|| find_attribute(self.store, self.policy_type, &element.property));
                let Some((_, attribute)) = attribute else {
                    list.add(
                        Message::error(
                            MessageCode::AttributeNotFound,
                            format!("No attribute {} on {}", element.property, self.product_type.qualified_name),
                        )
                        .on(object, &element.property),
                    );
                    return Ok(());
                };
                if attribute.value_set.contains(value.as_deref()) == Some(false) {
                    list.add(
                        Message::error(
                            MessageCode::ValueNotInValueSet,
                            format!(
                                "Value {} of {} is not in the value set",
                                value.as_deref().unwrap_or_default(),
                                element.property
                            ),
                        )
                        .on(object, &element.property),
                    );
                }
                Ok(())
            }
            ConfigValue::Formula(formula) => {
                let Some(signature) = self.find_formula_signature(&element.property) else {
                    list.add(
                        Message::error(
                            MessageCode::AttributeNotFound,
                            format!(
                                "No formula signature {} on {}",
                                element.property, self.product_type.qualified_name
                            ),
                        )
                        .on(object, &element.property),
                    );
                    return Ok(());
                };
                if formula.expression.trim().is_empty() {
                    return Ok(());
                }
                let Some(compiler) = self.compiler else {
                    return Ok(());
                };

                match compiler.compile(&formula.expression, &signature.parameters)? {
                    CompileOutcome::Invalid { reason } => list.add(
                        Message::error(
                            MessageCode::FormulaInvalid,
                            format!("Formula {} is invalid: {}", element.property, reason),
                        )
                        .on(object, &element.property),
                    ),
                    CompileOutcome::Compiled {
                        datatype,
                        identifiers,
                    } => {
                        if datatype != signature.datatype {
                            list.add(
                                Message::error(
                                    MessageCode::FormulaDatatypeMismatch,
                                    format!(
                                        "Formula {} yields {} but {} is expected",
                                        element.property, datatype, signature.datatype
                                    ),
                                )
                                .on(object, &element.property),
                            );
                        }
                        let context = FormulaContext {
                            store: self.store,
                            project: &self.component.project,
                            table_usages: &generation.table_content_usages,
                        };
                        let resolved =
                            resolve_parameters(&formula.expression, &signature.parameters, &context);
                        for identifier in identifiers.iter().filter(|i| !resolved.contains(*i)) {
                            list.add(
                                Message::warning(
                                    MessageCode::FormulaIdentifierUnresolved,
                                    format!(
                                        "Identifier {} in formula {} does not resolve to a parameter",
                                        identifier, element.property
                                    ),
                                )
                                .on(object, &element.property),
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn find_formula_signature(&self, name: &str) -> Option<&'a Method> {
        walk(self.store, self.product_type)
            .types
            .into_iter()
            .find_map(|t| t.formula_signature(name))
    }

    fn check_links(&self, generation: &Generation, object: &str, list: &mut MessageList) {
        let mut known = HashSet::new();

        for link in &generation.links {
            let Some((_, association)) =
                find_association(self.store, self.product_type, &link.association)
            else {
                list.add(
                    Message::error(
                        MessageCode::AssociationNotFound,
                        format!(
                            "No association {} on {}",
                            link.association, self.product_type.qualified_name
                        ),
                    )
                    .on(object, &link.association),
                );
                continue;
            };
            known.insert(association.name());

            if !self.store.component_exists(&link.target) {
                list.add(
                    Message::error(
                        MessageCode::LinkTargetNotFound,
                        format!("Link target {} does not exist", link.target),
                    )
                    .on(object, &link.association),
                );
                continue;
            }

            if !self.target_matches(&link.target, &association.target) {
                list.add(
                    Message::error(
                        MessageCode::LinkTargetTypeMismatch,
                        format!(
                            "Link target {} is not a {}",
                            link.target, association.target
                        ),
                    )
                    .on(object, &link.association),
                );
            }
        }

        for association in find_all_associations(self.store, self.product_type) {
            if association.derived_union {
                continue;
            }
            let count = generation.links_for(association.name()).count();
            if count == 0 && !known.contains(association.name()) && association.min_cardinality == 0
            {
                continue;
            }
            if count < association.min_cardinality as usize {
                list.add(
                    Message::error(
                        MessageCode::NotEnoughLinks,
                        format!(
                            "{} links for {}, at least {} required",
                            count,
                            association.name(),
                            association.min_cardinality
                        ),
                    )
                    .on(object, association.name()),
                );
            }
            if !association.max_cardinality.allows(count) {
                list.add(
                    Message::error(
                        MessageCode::TooManyLinks,
                        format!(
                            "{} links for {}, at most {} allowed",
                            count,
                            association.name(),
                            association.max_cardinality
                        ),
                    )
                    .on(object, association.name()),
                );
            }
        }
    }

    /// Whether the target component's product type is the association's
    /// target or a subtype of it
    fn target_matches(&self, target_name: &str, expected_type: &str) -> bool {
        let Ok(target) = self.store.get_component(target_name) else {
            return false;
        };
        let target_product = self
            .store
            .find_type(&target.project, &target.policy_type)
            .and_then(|policy| find_twin_type(self.store, policy));
        match target_product {
            Some(product) => is_subtype_of(self.store, product, expected_type),
            None => false,
        }
    }
}
