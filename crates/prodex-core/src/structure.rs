//! Product component structure
//!
//! A tree rooted at one product component. Each node's children are the
//! targets of the links in the component's generation effective at the
//! working date. A component may appear in several branches, but a branch
//! that leads back to one of its own ancestors is a cycle and aborts the
//! build.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::errors::{ProdexError, PxError, Result};
use crate::model::ProductComponent;
use crate::ops::ModelStore;
use crate::{log_op_end, log_op_error, log_op_start};

/// Where structure building loads components from
pub trait ComponentSource {
    /// Load a component by name; `Ok(None)` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error only if the source itself fails.
    fn load_component(&self, name: &str) -> std::result::Result<Option<ProductComponent>, PxError>;
}

impl ComponentSource for ModelStore {
    fn load_component(&self, name: &str) -> std::result::Result<Option<ProductComponent>, PxError> {
        Ok(self.components.get(name).cloned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct StructureNode {
    /// Name of the wrapped product component
    pub component: String,
    /// Association of the link that led here; `None` for the root
    pub association: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct ProductStructure {
    nodes: Vec<StructureNode>,
    components: BTreeMap<String, ProductComponent>,
    working_date: NaiveDate,
}

impl ProductStructure {
    /// Build the structure below `root` as of `working_date`
    ///
    /// # Errors
    ///
    /// - `ComponentNotFound` if `root` does not exist
    /// - `StructureCycle` if a path returns to one of its ancestors
    /// - any error raised by the source, unchanged
    pub fn build(
        source: &dyn ComponentSource,
        root: &str,
        working_date: NaiveDate,
    ) -> std::result::Result<Self, PxError> {
        log_op_start!("build_structure", component_name = root);
        let start = std::time::Instant::now();

        let structure = Self::build_impl(source, root, working_date).map_err(|e| {
            log_op_error!(
                "build_structure",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "build_structure",
            duration_ms = start.elapsed().as_millis() as u64,
            component_name = root,
            node_count = structure.len()
        );
        Ok(structure)
    }

    fn build_impl(
        source: &dyn ComponentSource,
        root: &str,
        working_date: NaiveDate,
    ) -> std::result::Result<Self, PxError> {
        let component = source
            .load_component(root)?
            .ok_or_else(|| ProdexError::ComponentNotFound {
                component_name: root.to_string(),
            })?;

        let mut structure = Self {
            nodes: Vec::new(),
            components: BTreeMap::new(),
            working_date,
        };
        structure.components.insert(root.to_string(), component);
        let root_id = structure.push_node(root.to_string(), None, None);

        let mut path = vec![root.to_string()];
        structure.expand(source, root_id, &mut path)?;
        Ok(structure)
    }

    fn push_node(
        &mut self,
        component: String,
        association: Option<String>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        self.nodes.push(StructureNode {
            component,
            association,
            parent,
            children: Vec::new(),
            depth,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn expand(
        &mut self,
        source: &dyn ComponentSource,
        id: NodeId,
        path: &mut Vec<String>,
    ) -> std::result::Result<(), PxError> {
        let name = &self.nodes[id.0].component;
        let links = self
            .components
            .get(name)
            .and_then(|c| c.generation_effective_on(self.working_date))
            .map(|g| g.links.clone())
            .unwrap_or_default();

        for link in links {
            if path.contains(&link.target) {
                let mut cycle = path.clone();
                cycle.push(link.target);
                return Err(ProdexError::StructureCycle { path: cycle }.into());
            }

            if !self.components.contains_key(&link.target) {
                match source.load_component(&link.target)? {
                    Some(target) => {
                        self.components.insert(link.target.clone(), target);
                    }
                    None => {
                        tracing::warn!(
                            component_name = %path.join(" -> "),
                            target = %link.target,
                            association = %link.association,
                            "link target not found, skipping"
                        );
                        continue;
                    }
                }
            }

            let child = self.push_node(link.target.clone(), Some(link.association), Some(id));
            path.push(link.target);
            self.expand(source, child, path)?;
            path.pop();
        }
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn working_date(&self) -> NaiveDate {
        self.working_date
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` if `id` is not a node of this structure.
    pub fn node(&self, id: NodeId) -> Result<&StructureNode> {
        self.nodes
            .get(id.0)
            .ok_or(ProdexError::NodeNotFound { node_id: id.0 })
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` if `id` is not a node of this structure.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` if `id` is not a node of this structure.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Node ids from the root down to `id`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if `id` is not a node of this structure.
    pub fn path_to(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut path = vec![id];
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            path.push(parent);
            current = self.node(parent)?;
        }
        path.reverse();
        Ok(path)
    }

    /// The product component wrapped by a node
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` for a foreign id, `ComponentNotFound` if the
    /// node has no backing component.
    pub fn component_of(&self, id: NodeId) -> Result<&ProductComponent> {
        let name = &self.node(id)?.component;
        self.component(name)
            .ok_or_else(|| ProdexError::ComponentNotFound {
                component_name: name.clone(),
            })
    }

    /// A component loaded into this structure
    pub fn component(&self, name: &str) -> Option<&ProductComponent> {
        self.components.get(name)
    }

    /// Nodes in pre-order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &StructureNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// All nodes wrapping the given component, in pre-order
    pub fn nodes_for_component(&self, name: &str) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| n.component == name)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
