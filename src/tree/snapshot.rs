use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{NodeId, Value};

use super::NodeRepository;

/// Nested, serializable copy of one live node and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotNode {
    /// Node id.
    pub id: NodeId,
    /// Visibility flag.
    pub visible: bool,
    /// Caller-defined attributes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, Value>,
    /// Controls.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub controls: BTreeMap<String, Value>,
    /// Children in attach order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

/// Nested copy of the live tree plus the ids of all orphans.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeSnapshot {
    /// Root nodes in attach order.
    pub roots: Vec<SnapshotNode>,
    /// Orphan ids in ascending order.
    pub orphans: Vec<NodeId>,
}

impl TreeSnapshot {
    /// Compact shape of the live tree: each id followed by its children.
    pub fn shape(&self) -> Vec<(NodeId, Vec<NodeId>)> {
        let mut out = Vec::new();
        let mut stack: Vec<&SnapshotNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push((node.id, node.children.iter().map(|c| c.id).collect()));
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

impl NodeRepository {
    /// Copies the live tree into a nested structure.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            roots: self
                .roots
                .iter()
                .filter_map(|id| self.snapshot_node(*id))
                .collect(),
            orphans: self.orphans.keys().copied().collect(),
        }
    }

    /// Builds the subtree under `root` with an explicit stack, so depth is
    /// bounded by memory rather than the call stack.
    fn snapshot_node(&self, root: NodeId) -> Option<SnapshotNode> {
        let mut stack = vec![self.open_frame(root)?];
        while let Some((_, pending)) = stack.last_mut() {
            if let Some(child) = pending.next() {
                if let Some(frame) = self.open_frame(child) {
                    stack.push(frame);
                }
                continue;
            }
            let (done, _) = stack.pop()?;
            match stack.last_mut() {
                Some((parent, _)) => parent.children.push(done),
                None => return Some(done),
            }
        }
        None
    }

    fn open_frame(&self, id: NodeId) -> Option<(SnapshotNode, std::vec::IntoIter<NodeId>)> {
        let node = self.index.get(&id)?;
        let copy = SnapshotNode {
            id,
            visible: node.visible,
            attrs: node.attrs.clone(),
            controls: node.controls.clone(),
            children: Vec::with_capacity(node.children.len()),
        };
        Some((copy, node.children.clone().into_iter()))
    }
}
