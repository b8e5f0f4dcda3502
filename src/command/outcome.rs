use serde::{Serialize, Serializer};

use crate::tree::{CascadeReport, InsertReport, UpdateReport};
use crate::types::{FieldRejection, NodeId, TreeError};

/// What a command did.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeDetail {
    /// Node inserted (attached or orphaned).
    Inserted(InsertReport),
    /// Fields merged.
    Updated(UpdateReport),
    /// Controls merged.
    ControlsWritten {
        /// Target node.
        id: NodeId,
        /// Control names written.
        controls: Vec<String>,
    },
    /// Visibility flag written.
    VisibilitySet {
        /// Target node.
        id: NodeId,
        /// New flag.
        visible: bool,
    },
    /// Subtree detached.
    Detached(CascadeReport),
    /// Subtree or orphan deleted.
    Deleted(CascadeReport),
    /// Bulk visibility toggle.
    BulkVisibility {
        /// Flag applied.
        visible: bool,
        /// Nodes whose flag changed.
        nodes: Vec<NodeId>,
    },
}

/// Outcome of one command: applied, partially applied, or rejected.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Every part of the command took effect.
    Applied {
        /// Effect description.
        detail: OutcomeDetail,
    },
    /// An update wrote some fields and skipped others.
    PartiallyApplied {
        /// Effect description.
        detail: OutcomeDetail,
        /// Skipped fields.
        rejected: Vec<FieldRejection>,
    },
    /// Nothing changed.
    Rejected {
        /// Reason. For an update whose every field was skipped this is the
        /// first field's error.
        #[serde(serialize_with = "display")]
        error: TreeError,
        /// Skipped fields, for updates.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        rejected: Vec<FieldRejection>,
    },
}

impl CommandOutcome {
    /// Short status label.
    pub fn status(&self) -> &'static str {
        match self {
            CommandOutcome::Applied { .. } => "applied",
            CommandOutcome::PartiallyApplied { .. } => "partially_applied",
            CommandOutcome::Rejected { .. } => "rejected",
        }
    }

    /// Whether the command took full effect.
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied { .. })
    }

    /// Whether the command was rejected outright.
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandOutcome::Rejected { .. })
    }

    /// The rejection error, if any.
    pub fn error(&self) -> Option<&TreeError> {
        match self {
            CommandOutcome::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The effect description, unless rejected.
    pub fn detail(&self) -> Option<&OutcomeDetail> {
        match self {
            CommandOutcome::Applied { detail } | CommandOutcome::PartiallyApplied { detail, .. } => {
                Some(detail)
            }
            CommandOutcome::Rejected { .. } => None,
        }
    }
}

fn display<S>(error: &TreeError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}
