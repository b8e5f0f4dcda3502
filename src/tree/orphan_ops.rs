use std::collections::VecDeque;

use tracing::debug;

use crate::types::{NodeId, Result};

use super::{NodeRepository, OrphanSweep};

impl NodeRepository {
    /// Attaches orphans waiting for `anchor`, which has just become live.
    ///
    /// Orphans are scanned in id order. With [`OrphanSweep::SingleLevel`] only
    /// direct children of `anchor` are considered. With
    /// [`OrphanSweep::Transitive`] each promoted node is swept as well.
    pub(super) fn sweep_orphans(&mut self, anchor: NodeId) -> Result<Vec<NodeId>> {
        let transitive = self.options.orphan_sweep == OrphanSweep::Transitive;
        let mut promoted = Vec::new();
        let mut pending = VecDeque::from([anchor]);

        while let Some(parent) = pending.pop_front() {
            let waiting: Vec<NodeId> = self
                .orphans
                .values()
                .filter(|orphan| orphan.parent == Some(parent))
                .map(|orphan| orphan.id)
                .collect();
            if waiting.is_empty() {
                continue;
            }
            let (breadcrumbs, container) = self.plan_attach(Some(parent))?;
            for id in waiting {
                let Some(orphan) = self.orphans.remove(&id) else {
                    continue;
                };
                self.commit_attach(orphan, breadcrumbs.clone(), container)?;
                debug!(node = %id, parent = %parent, "promoted orphan");
                promoted.push(id);
                if transitive {
                    pending.push_back(id);
                }
            }
        }

        Ok(promoted)
    }
}
