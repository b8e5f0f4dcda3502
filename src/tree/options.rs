use serde::{Deserialize, Serialize};

/// How far the orphan sweep reaches after a node attaches.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanSweep {
    /// One pass over the orphan set for the inserted node only. Orphans whose
    /// parent was promoted in that same pass stay orphaned.
    #[default]
    SingleLevel,
    /// Every promoted node is swept in turn until a pass promotes nothing, so
    /// a whole waiting subtree attaches with a single insert.
    Transitive,
}

/// Configuration supplied when creating a [`super::NodeRepository`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RepositoryOptions {
    /// Orphan sweep depth.
    pub orphan_sweep: OrphanSweep,
}

impl RepositoryOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the orphan sweep depth.
    pub fn orphan_sweep(mut self, sweep: OrphanSweep) -> Self {
        self.orphan_sweep = sweep;
        self
    }
}
