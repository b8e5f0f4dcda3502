use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::NodeId;

use super::{Node, NodeRepository};

/// Read-only visibility partitions over the live nodes.
///
/// Nothing is cached: every call walks the index. Orphans are never counted.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityIndex<'a> {
    nodes: &'a BTreeMap<NodeId, Node>,
}

/// Counts and predicates computed from a [`VisibilityIndex`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct VisibilitySummary {
    /// Live nodes.
    pub total: usize,
    /// Live nodes that are shown.
    pub shown: usize,
    /// Live nodes that are hidden.
    pub unshown: usize,
    /// `shown == total`.
    pub all_shown: bool,
    /// `unshown == total`.
    pub none_shown: bool,
}

impl NodeRepository {
    /// Visibility views over the live nodes.
    pub fn visibility(&self) -> VisibilityIndex<'_> {
        VisibilityIndex { nodes: &self.index }
    }
}

impl<'a> VisibilityIndex<'a> {
    /// Shown live nodes in id order.
    pub fn shown(&self) -> impl Iterator<Item = &'a Node> {
        self.nodes.values().filter(|node| node.visible)
    }

    /// Hidden live nodes in id order.
    pub fn unshown(&self) -> impl Iterator<Item = &'a Node> {
        self.nodes.values().filter(|node| !node.visible)
    }

    /// Ids of shown live nodes.
    pub fn shown_ids(&self) -> Vec<NodeId> {
        self.shown().map(|node| node.id).collect()
    }

    /// Ids of hidden live nodes.
    pub fn unshown_ids(&self) -> Vec<NodeId> {
        self.unshown().map(|node| node.id).collect()
    }

    /// Number of live nodes.
    pub fn total_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of shown live nodes.
    pub fn shown_count(&self) -> usize {
        self.shown().count()
    }

    /// Number of hidden live nodes.
    pub fn unshown_count(&self) -> usize {
        self.unshown().count()
    }

    /// Whether every live node is shown. True when there are none.
    pub fn all_shown(&self) -> bool {
        self.shown_count() == self.total_count()
    }

    /// Whether no live node is shown. True when there are none.
    pub fn none_shown(&self) -> bool {
        self.unshown_count() == self.total_count()
    }

    /// All counts at once.
    pub fn summary(&self) -> VisibilitySummary {
        let total = self.total_count();
        let shown = self.shown_count();
        let unshown = self.unshown_count();
        VisibilitySummary {
            total,
            shown,
            unshown,
            all_shown: shown == total,
            none_shown: unshown == total,
        }
    }
}
