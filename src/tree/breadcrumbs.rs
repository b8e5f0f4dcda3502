use std::collections::BTreeMap;

use crate::types::{NodeId, Result, TreeError};

use super::Node;

/// Computes the ancestor path for a node whose parent is `parent`.
///
/// Walks parent pointers through the live index and returns ancestor ids
/// root-first, ending with `parent` itself. A root (`parent == None`) has an
/// empty path.
pub(crate) fn resolve(parent: Option<NodeId>, index: &BTreeMap<NodeId, Node>) -> Result<Vec<NodeId>> {
    let mut path = Vec::new();
    let mut cursor = parent;
    while let Some(id) = cursor {
        // A path longer than the index can only come from a parent cycle.
        if path.len() > index.len() {
            return Err(TreeError::invariant(format!(
                "parent chain through node {id} does not reach a root"
            )));
        }
        let node = index.get(&id).ok_or_else(|| {
            TreeError::invariant(format!("ancestor {id} is not live while resolving breadcrumbs"))
        })?;
        path.push(id);
        cursor = node.parent;
    }
    path.reverse();
    Ok(path)
}
