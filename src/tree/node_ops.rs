use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::types::{FieldRejection, NodeId, Result, TreeError, Value};

use super::breadcrumbs::resolve;
use super::locate::locate;
use super::{Container, InsertReport, Node, NodeDraft, NodeRepository, Placement, UpdateReport};

impl NodeRepository {
    /// Inserts a new node.
    ///
    /// The node attaches under its parent when the parent is live (or when it
    /// is a root) and is held as an orphan otherwise. A successful attach is
    /// followed by an orphan sweep that picks up nodes waiting for this one.
    ///
    /// # Errors
    /// * [`TreeError::MissingField`] when `id` or `parent` is absent.
    /// * [`TreeError::ReservedField`] when an attribute uses a reserved name.
    /// * [`TreeError::DuplicateId`] when the id is already live or orphaned.
    ///
    /// State is unchanged on every error except
    /// [`TreeError::InvariantViolation`].
    pub fn insert(&mut self, draft: NodeDraft) -> Result<InsertReport> {
        let node = draft.into_node()?;
        let id = node.id;
        if self.contains(id) {
            return Err(TreeError::DuplicateId(id));
        }

        if let Some(parent) = node.parent {
            if !self.is_live(parent) {
                debug!(node = %id, parent = %parent, "parent not live, holding as orphan");
                self.orphans.insert(id, node);
                return Ok(InsertReport {
                    id,
                    placement: Placement::Orphaned,
                    promoted: Vec::new(),
                });
            }
        }

        let (breadcrumbs, container) = self.plan_attach(node.parent)?;
        self.commit_attach(node, breadcrumbs, container)?;
        let promoted = self.sweep_orphans(id)?;
        Ok(InsertReport {
            id,
            placement: Placement::Attached,
            promoted,
        })
    }

    /// Merges `attrs` into a live node field by field.
    ///
    /// A field whose current value has a different runtime kind than the new
    /// value is skipped and reported; every other field is written. New fields
    /// are always accepted. The well-known fields `visible` and `controls`
    /// target the visibility flag and the controls map.
    ///
    /// # Errors
    /// [`TreeError::UnknownId`] when `id` is not live. Per-field failures are
    /// reported in the returned [`UpdateReport`], not as an error.
    pub fn update(&mut self, id: NodeId, attrs: BTreeMap<String, Value>) -> Result<UpdateReport> {
        let node = self.index.get_mut(&id).ok_or(TreeError::UnknownId(id))?;
        let mut report = UpdateReport::new(id);
        for (field, value) in attrs {
            match node.apply_field(&field, value) {
                Ok(()) => report.applied.push(field),
                Err(err) => {
                    warn!(node = %id, field = %field, error = %err, "update field rejected");
                    report.rejected.push(FieldRejection::from_error(&field, &err));
                }
            }
        }
        Ok(report)
    }

    /// Merges a controls payload into a live node's controls.
    ///
    /// Entries overwrite existing controls without a kind check; controls not
    /// named in the payload are kept. Returns the names written.
    ///
    /// # Errors
    /// * [`TreeError::UnknownId`] when `id` is not live.
    /// * [`TreeError::InvalidControlsPayload`] when `payload` is not a map.
    pub fn update_controls(&mut self, id: NodeId, payload: Value) -> Result<Vec<String>> {
        let node = self.index.get_mut(&id).ok_or(TreeError::UnknownId(id))?;
        let kind = payload.kind();
        let entries = payload
            .into_map()
            .ok_or(TreeError::InvalidControlsPayload(kind))?;
        let mut written = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            node.controls.insert(name.clone(), value);
            written.push(name);
        }
        Ok(written)
    }

    /// Shows or hides a live node.
    pub fn set_visibility(&mut self, id: NodeId, visible: bool) -> Result<()> {
        let node = self.index.get_mut(&id).ok_or(TreeError::UnknownId(id))?;
        node.visible = visible;
        Ok(())
    }

    /// Computes breadcrumbs and the target container for a node whose parent
    /// is `parent`, without touching state.
    pub(super) fn plan_attach(&self, parent: Option<NodeId>) -> Result<(Vec<NodeId>, Container)> {
        let breadcrumbs = resolve(parent, &self.index)?;
        let container = locate(&self.roots, &self.index, &breadcrumbs)?;
        Ok((breadcrumbs, container))
    }

    pub(super) fn commit_attach(
        &mut self,
        mut node: Node,
        breadcrumbs: Vec<NodeId>,
        container: Container,
    ) -> Result<()> {
        let id = node.id;
        node.breadcrumbs = breadcrumbs;
        node.children.clear();
        self.child_list_mut(container)?.push(id);
        debug!(node = %id, container = %container, depth = node.depth(), "attached node");
        self.index.insert(id, node);
        Ok(())
    }

    /// Moves a single childless live node into the orphan set.
    pub(super) fn detach_node(&mut self, id: NodeId) -> Result<()> {
        let container = self.live_container(id)?;
        self.unlink(container, id)?;
        let mut node = self
            .index
            .remove(&id)
            .ok_or_else(|| TreeError::invariant(format!("node {id} vanished while detaching")))?;
        node.breadcrumbs.clear();
        debug!(node = %id, "detached node");
        self.orphans.insert(id, node);
        Ok(())
    }

    /// Removes a single node. Live nodes must be childless.
    pub(super) fn delete_node(&mut self, id: NodeId) -> Result<()> {
        if self.is_live(id) {
            let container = self.live_container(id)?;
            self.unlink(container, id)?;
            self.index.remove(&id);
            debug!(node = %id, "deleted live node");
            return Ok(());
        }
        if self.orphans.remove(&id).is_some() {
            debug!(node = %id, "deleted orphan");
            return Ok(());
        }
        Err(TreeError::UnknownId(id))
    }

    fn live_container(&self, id: NodeId) -> Result<Container> {
        let node = self.index.get(&id).ok_or(TreeError::UnknownId(id))?;
        if !node.children.is_empty() {
            return Err(TreeError::invariant(format!(
                "node {id} still has {} children",
                node.children.len()
            )));
        }
        locate(&self.roots, &self.index, &node.breadcrumbs)
    }
}
