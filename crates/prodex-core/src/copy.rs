//! Deep copy of product structures
//!
//! Copies a selected set of structure nodes into new persisted components,
//! one per distinct handle. A link is redirected to the copy of the child
//! node it produced; links to reference nodes or to components outside the
//! selection keep their original target.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::{ProdexError, PxError};
use crate::model::{Generation, ProductComponent};
use crate::notify::ChangeBroadcaster;
use crate::ops::ModelStore;
use crate::settings::{GenerationValidFrom, ModelSettings};
use crate::structure::{ComponentSource, NodeId, ProductStructure};
use crate::{log_op_end, log_op_error, log_op_start};

type Result<T> = std::result::Result<T, PxError>;

/// Where copies are written
///
/// `write_batch` must either commit every component or fail; after a
/// successful batch each handle must exist and must not be dirty.
pub trait PersistenceTarget {
    /// # Errors
    ///
    /// Propagates failures of the underlying storage.
    fn exists(&self, handle: &str) -> Result<bool>;

    /// Whether the handle holds uncommitted changes
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying storage.
    fn is_dirty(&self, handle: &str) -> Result<bool>;

    /// # Errors
    ///
    /// Propagates failures of the underlying storage.
    fn write_batch(&mut self, components: Vec<ProductComponent>) -> Result<()>;
}

impl PersistenceTarget for ModelStore {
    fn exists(&self, handle: &str) -> Result<bool> {
        Ok(self.component_exists(handle))
    }

    fn is_dirty(&self, _handle: &str) -> Result<bool> {
        Ok(false)
    }

    fn write_batch(&mut self, components: Vec<ProductComponent>) -> Result<()> {
        if let Some(existing) = components.iter().find(|c| self.component_exists(&c.name)) {
            return Err(ProdexError::HandleAlreadyExists {
                handle: existing.name.clone(),
            }
            .into());
        }
        for component in components {
            self.insert_component(component);
        }
        Ok(())
    }
}

/// What to copy, what to leave as a reference, and where copies go
#[derive(Debug, Clone, Default)]
pub struct CopyRequest {
    pub to_copy: BTreeSet<NodeId>,
    pub to_reference: BTreeSet<NodeId>,
    /// New handle per node to copy
    pub handles: BTreeMap<NodeId, String>,
}

impl CopyRequest {
    /// Assign `<component name><suffix>` as handle to every node to copy
    ///
    /// Nodes wrapping the same component share a handle. A handle that is
    /// already taken in `target` is replaced by one with a UUID v7 suffix.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` for ids outside the structure and propagates
    /// failures of `target`.
    pub fn with_generated_handles(
        structure: &ProductStructure,
        to_copy: BTreeSet<NodeId>,
        to_reference: BTreeSet<NodeId>,
        suffix: &str,
        target: &dyn PersistenceTarget,
    ) -> Result<Self> {
        let mut by_component: BTreeMap<String, String> = BTreeMap::new();
        let mut taken = BTreeSet::new();
        let mut handles = BTreeMap::new();

        for id in &to_copy {
            let name = structure.node(*id)?.component.clone();
            let handle = match by_component.get(&name) {
                Some(handle) => handle.clone(),
                None => {
                    let mut handle = format!("{}{}", name, suffix);
                    if taken.contains(&handle) || target.exists(&handle)? {
                        handle = format!("{}-{}", name, Uuid::now_v7());
                    }
                    taken.insert(handle.clone());
                    by_component.insert(name, handle.clone());
                    handle
                }
            };
            handles.insert(*id, handle);
        }

        Ok(Self {
            to_copy,
            to_reference,
            handles,
        })
    }

    /// Copy every node of the structure
    ///
    /// # Errors
    ///
    /// See [`CopyRequest::with_generated_handles`].
    pub fn whole_structure(
        structure: &ProductStructure,
        suffix: &str,
        target: &dyn PersistenceTarget,
    ) -> Result<Self> {
        let all = structure.iter().map(|(id, _)| id).collect();
        Self::with_generated_handles(structure, all, BTreeSet::new(), suffix, target)
    }
}

/// Result of a completed copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Handle written for each copied node
    pub nodes: BTreeMap<NodeId, String>,
    /// Written handle to the name of the component it was copied from
    pub copies: BTreeMap<String, String>,
}

impl CopyOutcome {
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.copies.keys().map(String::as_str)
    }

    /// Handle of the copy made for `node`
    pub fn handle_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }
}

/// One handle to write and the first node (in pre-order) that claims it
struct PlannedCopy<'s> {
    handle: &'s str,
    node: NodeId,
    component: &'s str,
}

pub struct DeepCopyEngine {
    working_date: NaiveDate,
    valid_from: GenerationValidFrom,
}

impl DeepCopyEngine {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            working_date: settings.effective_working_date(),
            valid_from: settings.copy.generation_valid_from,
        }
    }

    /// Copy the requested nodes of `structure` into `target`
    ///
    /// Component content is reloaded from `source`, so the copy reflects the
    /// current state rather than the structure snapshot. Every distinct
    /// handle in the request is written once; nodes sharing a handle must
    /// wrap the same component and are copied from the first of them in
    /// pre-order. A link is redirected to the handle of the child node it
    /// produced when that child is copied too. Listeners of `broadcaster`
    /// see a single change event for the whole copy.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` for ids outside the structure
    /// - `MissingCopyHandle` if a node to copy has no handle
    /// - `DuplicateHandle` if one handle is given to different components
    /// - `HandleAlreadyExists` if a handle is taken in `target`
    /// - `ComponentNotFound` if a node has no backing component
    /// - `CopyAtomicityBreach` if a handle is missing or dirty afterwards
    /// - failures of `source` or `target`, unchanged
    pub fn copy(
        &self,
        source: &dyn ComponentSource,
        target: &mut dyn PersistenceTarget,
        structure: &ProductStructure,
        request: &CopyRequest,
        broadcaster: &ChangeBroadcaster,
    ) -> Result<CopyOutcome> {
        log_op_start!("deep_copy", node_count = request.to_copy.len());
        let start = std::time::Instant::now();

        let outcome = self
            .copy_impl(source, target, structure, request, broadcaster)
            .map_err(|e| {
                log_op_error!(
                    "deep_copy",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "deep_copy",
            duration_ms = start.elapsed().as_millis() as u64,
            copy_count = outcome.len()
        );
        Ok(outcome)
    }

    fn copy_impl(
        &self,
        source: &dyn ComponentSource,
        target: &mut dyn PersistenceTarget,
        structure: &ProductStructure,
        request: &CopyRequest,
        broadcaster: &ChangeBroadcaster,
    ) -> Result<CopyOutcome> {
        for id in request.to_copy.iter().chain(&request.to_reference) {
            structure.node(*id)?;
        }
        let plan = self.plan_copies(structure, request, &*target)?;

        let mut copies = Vec::with_capacity(plan.len());
        for planned in &plan {
            let original = source.load_component(planned.component)?.ok_or_else(|| {
                ProdexError::ComponentNotFound {
                    component_name: planned.component.to_string(),
                }
            })?;
            copies.push(self.copy_component(&original, planned, structure, request)?);
        }

        let _batch = broadcaster.batch();
        target.write_batch(copies)?;
        for planned in &plan {
            broadcaster.notify(planned.handle);
        }

        for planned in &plan {
            if !target.exists(planned.handle)? {
                return Err(ProdexError::CopyAtomicityBreach {
                    message: format!("{} was not written", planned.handle),
                }
                .into());
            }
            if target.is_dirty(planned.handle)? {
                return Err(ProdexError::CopyAtomicityBreach {
                    message: format!("{} is left uncommitted", planned.handle),
                }
                .into());
            }
        }

        let nodes = request
            .to_copy
            .iter()
            .filter_map(|id| request.handles.get(id).map(|h| (*id, h.clone())))
            .collect();
        let copies = plan
            .iter()
            .map(|p| (p.handle.to_string(), p.component.to_string()))
            .collect();
        Ok(CopyOutcome { nodes, copies })
    }

    /// Distinct handles to write, in pre-order of the first node claiming
    /// each
    fn plan_copies<'s>(
        &self,
        structure: &'s ProductStructure,
        request: &'s CopyRequest,
        target: &dyn PersistenceTarget,
    ) -> Result<Vec<PlannedCopy<'s>>> {
        let mut plan: Vec<PlannedCopy<'s>> = Vec::new();
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();

        for (id, node) in structure.iter().filter(|(id, _)| request.to_copy.contains(id)) {
            let handle = request.handles.get(&id).ok_or_else(|| {
                ProdexError::MissingCopyHandle {
                    component_name: node.component.clone(),
                }
            })?;
            match owners.get(handle.as_str()) {
                Some(owner) if *owner == node.component => continue,
                Some(_) => {
                    return Err(ProdexError::DuplicateHandle {
                        handle: handle.clone(),
                    }
                    .into());
                }
                None => {}
            }
            if target.exists(handle)? {
                return Err(ProdexError::HandleAlreadyExists {
                    handle: handle.clone(),
                }
                .into());
            }
            owners.insert(handle.as_str(), node.component.as_str());
            plan.push(PlannedCopy {
                handle: handle.as_str(),
                node: id,
                component: node.component.as_str(),
            });
        }
        Ok(plan)
    }

    fn copy_component(
        &self,
        original: &ProductComponent,
        planned: &PlannedCopy<'_>,
        structure: &ProductStructure,
        request: &CopyRequest,
    ) -> Result<ProductComponent> {
        let mut copy = ProductComponent {
            name: planned.handle.to_string(),
            policy_type: original.policy_type.clone(),
            project: original.project.clone(),
            generations: Vec::new(),
        };

        if let Some(generation) = original.generation_effective_on(self.working_date) {
            let children = structure.children(planned.node)?;
            copy.add_generation(self.copy_generation(generation, children, structure, request)?);
        }
        Ok(copy)
    }

    /// Clone a generation, pointing each link at the copy of the child node
    /// it produced
    ///
    /// Links and child nodes are paired in order by association and target;
    /// a link without a copied child keeps its target.
    fn copy_generation(
        &self,
        generation: &Generation,
        children: &[NodeId],
        structure: &ProductStructure,
        request: &CopyRequest,
    ) -> Result<Generation> {
        let mut copy = generation.clone();
        if self.valid_from == GenerationValidFrom::WorkingDate {
            copy.valid_from = self.working_date;
        }

        let mut unpaired: Vec<NodeId> = children.to_vec();
        for link in &mut copy.links {
            let mut paired = None;
            for (i, child) in unpaired.iter().enumerate() {
                let node = structure.node(*child)?;
                if node.component == link.target
                    && node.association.as_deref() == Some(link.association.as_str())
                {
                    paired = Some(i);
                    break;
                }
            }
            let Some(i) = paired else {
                continue;
            };
            let child = unpaired.remove(i);
            if !request.to_copy.contains(&child) {
                continue;
            }
            if let Some(handle) = request.handles.get(&child) {
                link.target = handle.clone();
            }
        }
        Ok(copy)
    }
}
