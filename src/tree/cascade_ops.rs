use tracing::info;

use crate::types::{NodeId, Result, TreeError};

use super::{CascadeReport, NodeRepository};

impl NodeRepository {
    /// Moves a live node and its whole subtree into the orphan set.
    ///
    /// Descendants are detached before their ancestors: each removal locates
    /// its node by walking the stored breadcrumbs through the current tree, so
    /// every ancestor must still be attached when that walk runs. Detached
    /// nodes keep their `parent` id.
    ///
    /// # Errors
    /// [`TreeError::UnknownId`] when `id` is not live.
    pub fn detach_subtree(&mut self, id: NodeId) -> Result<CascadeReport> {
        if !self.is_live(id) {
            return Err(TreeError::UnknownId(id));
        }
        let order = self.cascade_order(id)?;
        for node in &order {
            self.detach_node(*node)?;
        }
        info!(root = %id, nodes = order.len(), "detached subtree");
        Ok(CascadeReport {
            root: id,
            affected: order,
        })
    }

    /// Removes a node and, if it is live, its whole subtree.
    ///
    /// Uses the same descendants-first ordering as [`Self::detach_subtree`].
    /// An orphan is removed on its own; other orphans naming it as their
    /// parent stay in the orphan set.
    ///
    /// # Errors
    /// [`TreeError::UnknownId`] when `id` is neither live nor orphaned.
    pub fn delete_subtree(&mut self, id: NodeId) -> Result<CascadeReport> {
        if self.is_orphan(id) {
            self.delete_node(id)?;
            return Ok(CascadeReport {
                root: id,
                affected: vec![id],
            });
        }
        if !self.is_live(id) {
            return Err(TreeError::UnknownId(id));
        }
        let order = self.cascade_order(id)?;
        for node in &order {
            self.delete_node(*node)?;
        }
        info!(root = %id, nodes = order.len(), "deleted subtree");
        Ok(CascadeReport {
            root: id,
            affected: order,
        })
    }

    /// Ids of the subtree under `root` ordered so that every node comes after
    /// all of its descendants.
    fn cascade_order(&self, root: NodeId) -> Result<Vec<NodeId>> {
        let mut order = vec![root];
        let mut cursor = 0;
        while cursor < order.len() {
            let id = order[cursor];
            let node = self.index.get(&id).ok_or_else(|| {
                TreeError::invariant(format!("child {id} listed in the tree is not live"))
            })?;
            order.extend(node.children.iter().copied());
            if order.len() > self.index.len() {
                return Err(TreeError::invariant(format!(
                    "subtree under {root} revisits a node"
                )));
            }
            cursor += 1;
        }
        // Breadth-first order reversed puts deeper levels first.
        order.reverse();
        Ok(order)
    }
}
