#![forbid(unsafe_code)]

//! Hierarchical node repository.
//!
//! Nodes arrive from an unordered command stream: a node's parent may show up
//! before it, after it, or never. Nodes whose parent is not live yet are held
//! as orphans and attached once the parent is inserted.
//!
//! Storage is an arena keyed by [`NodeId`]. The live hierarchy is the ordered
//! list of root ids plus each node's ordered list of child ids, so the index
//! is the single source of truth and the tree is a derived adjacency view.

mod breadcrumbs;
mod cascade_ops;
mod locate;
mod node;
mod node_ops;
mod options;
mod orphan_ops;
mod snapshot;
mod verify;
mod visibility;

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{NodeId, Result, TreeError};

pub use node::{
    CascadeReport, InsertReport, Node, NodeDraft, Placement, UpdateReport, UpdateStatus,
    RESERVED_FIELDS,
};
pub use options::{OrphanSweep, RepositoryOptions};
pub use snapshot::{SnapshotNode, TreeSnapshot};
pub use verify::{VerifyCounts, VerifyFinding, VerifyReport};
pub use visibility::{VisibilityIndex, VisibilitySummary};

/// Position that holds a node's id in its child list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Container {
    /// The synthetic root container.
    Root,
    /// A live node.
    Node(NodeId),
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Root => f.write_str("root"),
            Container::Node(id) => write!(f, "node {id}"),
        }
    }
}

/// Live index, orphan set and tree structure for one hierarchy.
#[derive(Clone, Debug, Default)]
pub struct NodeRepository {
    index: BTreeMap<NodeId, Node>,
    orphans: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    options: RepositoryOptions,
}

impl NodeRepository {
    /// Creates an empty repository with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository with the given options.
    pub fn with_options(options: RepositoryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Options this repository was created with.
    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }

    /// Returns the live node with the given id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id)
    }

    /// Returns the orphaned node with the given id.
    pub fn get_orphan(&self, id: NodeId) -> Option<&Node> {
        self.orphans.get(&id)
    }

    /// Whether the id is attached to the tree.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Whether the id is held in the orphan set.
    pub fn is_orphan(&self, id: NodeId) -> bool {
        self.orphans.contains_key(&id)
    }

    /// Whether the id is known at all, live or orphaned.
    pub fn contains(&self, id: NodeId) -> bool {
        self.is_live(id) || self.is_orphan(id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the repository has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of orphaned nodes.
    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.index.values()
    }

    /// Orphaned nodes in id order.
    pub fn orphans(&self) -> impl Iterator<Item = &Node> {
        self.orphans.values()
    }

    /// Root ids in attach order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Child ids of a live node in attach order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.index
            .get(&id)
            .map(|node| node.children.as_slice())
            .ok_or(TreeError::UnknownId(id))
    }

    fn child_list_mut(&mut self, container: Container) -> Result<&mut Vec<NodeId>> {
        match container {
            Container::Root => Ok(&mut self.roots),
            Container::Node(id) => self
                .index
                .get_mut(&id)
                .map(|node| &mut node.children)
                .ok_or_else(|| TreeError::invariant(format!("container node {id} is not live"))),
        }
    }

    fn unlink(&mut self, container: Container, id: NodeId) -> Result<()> {
        let children = self.child_list_mut(container)?;
        match children.iter().position(|child| *child == id) {
            Some(pos) => {
                children.remove(pos);
                Ok(())
            }
            None => Err(TreeError::invariant(format!(
                "node {id} is missing from the child list of {container}"
            ))),
        }
    }
}
