use std::collections::BTreeMap;

use crate::types::{NodeId, Result, TreeError};

use super::{Container, Node};

/// Descends from the root container along `breadcrumbs` and returns the
/// container whose child list holds (or should hold) the node.
///
/// Every breadcrumb must be present in the child list of the container before
/// it; a gap means the tree was already broken.
pub(crate) fn locate(
    roots: &[NodeId],
    index: &BTreeMap<NodeId, Node>,
    breadcrumbs: &[NodeId],
) -> Result<Container> {
    let mut container = Container::Root;
    let mut children = roots;
    for id in breadcrumbs {
        if !children.contains(id) {
            return Err(TreeError::invariant(format!(
                "breadcrumb {id} is not a child of {container}"
            )));
        }
        let node = index
            .get(id)
            .ok_or_else(|| TreeError::invariant(format!("breadcrumb {id} is not live")))?;
        children = &node.children;
        container = Container::Node(*id);
    }
    Ok(container)
}
