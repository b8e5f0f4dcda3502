#![forbid(unsafe_code)]

//! JSON command surface over a [`NodeRepository`].
//!
//! Each command maps onto one repository primitive, except `insert_shown` and
//! `set_visibility_all`, which compose primitives. Every command yields a
//! [`CommandOutcome`]; only fatal invariant violations and undecodable
//! payloads are returned as [`CommandError`].

mod outcome;
mod shared;

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::tree::{NodeDraft, NodeRepository, Placement, UpdateStatus};
use crate::types::{NodeId, TreeError, Value};

pub use outcome::{CommandOutcome, OutcomeDetail};
pub use shared::SharedSession;

/// A decoded command, tagged by `op` on the wire.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Attach or orphan a new node.
    Insert(NodeDraft),
    /// Per-field merge into a live node.
    Update(UpdateArgs),
    /// Merge into a live node's controls.
    UpdateControls(ControlsArgs),
    /// Show or hide a live node.
    SetVisibility(VisibilityArgs),
    /// Move a live subtree into the orphan set.
    DetachSubtree(TargetArgs),
    /// Remove a subtree, or a single orphan.
    DeleteSubtree(TargetArgs),
    /// Insert, then apply the payload's `visible` flag (shown by default).
    InsertShown(NodeDraft),
    /// Show every hidden node (`visible = true`) or hide every shown node.
    SetVisibilityAll(BulkVisibilityArgs),
}

/// Payload of [`Command::Update`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UpdateArgs {
    /// Target node.
    #[serde(default)]
    pub id: Option<NodeId>,
    /// Fields to merge.
    #[serde(flatten)]
    pub attrs: BTreeMap<String, Value>,
}

/// Payload of [`Command::UpdateControls`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ControlsArgs {
    /// Target node.
    #[serde(default)]
    pub id: Option<NodeId>,
    /// Controls to merge; must be a map.
    #[serde(default)]
    pub controls: Option<Value>,
}

/// Payload of [`Command::SetVisibility`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct VisibilityArgs {
    /// Target node.
    #[serde(default)]
    pub id: Option<NodeId>,
    /// New flag.
    #[serde(default = "shown")]
    pub visible: bool,
}

/// Payload of [`Command::DetachSubtree`] and [`Command::DeleteSubtree`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TargetArgs {
    /// Subtree root.
    #[serde(default)]
    pub id: Option<NodeId>,
}

/// Payload of [`Command::SetVisibilityAll`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BulkVisibilityArgs {
    /// Target flag.
    #[serde(default = "shown")]
    pub visible: bool,
}

fn shown() -> bool {
    true
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert(_) => "insert",
            Command::Update(_) => "update",
            Command::UpdateControls(_) => "update_controls",
            Command::SetVisibility(_) => "set_visibility",
            Command::DetachSubtree(_) => "detach_subtree",
            Command::DeleteSubtree(_) => "delete_subtree",
            Command::InsertShown(_) => "insert_shown",
            Command::SetVisibilityAll(_) => "set_visibility_all",
        }
    }
}

/// Errors that stop command processing.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The payload is not a valid command.
    #[error("malformed command: {0}")]
    Decode(#[from] serde_json::Error),
    /// The repository was found in an inconsistent state.
    #[error("fatal: {0}")]
    Fatal(TreeError),
}

/// Applies commands to an owned repository.
#[derive(Debug, Default)]
pub struct Session {
    repo: NodeRepository,
}

impl Session {
    /// Wraps a repository.
    pub fn new(repo: NodeRepository) -> Self {
        Self { repo }
    }

    /// Read access to the repository.
    pub fn repository(&self) -> &NodeRepository {
        &self.repo
    }

    /// Releases the repository.
    pub fn into_repository(self) -> NodeRepository {
        self.repo
    }

    /// Decodes and applies one JSON command.
    pub fn apply_json(&mut self, raw: &str) -> Result<CommandOutcome, CommandError> {
        let command: Command = serde_json::from_str(raw)?;
        self.apply(command)
    }

    /// Applies one command.
    ///
    /// Request errors become [`CommandOutcome::Rejected`]. A fatal
    /// [`TreeError::InvariantViolation`] is returned as
    /// [`CommandError::Fatal`]; the repository should not be used afterwards.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        let op = command.name();
        match self.dispatch(command) {
            Ok(detail) => {
                let outcome = CommandOutcome::from_detail(detail);
                debug!(op, status = outcome.status(), "command applied");
                Ok(outcome)
            }
            Err(err) if err.is_fatal() => Err(CommandError::Fatal(err)),
            Err(err) => {
                debug!(op, error = %err, "command rejected");
                Ok(CommandOutcome::Rejected {
                    error: err,
                    rejected: Vec::new(),
                })
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<OutcomeDetail, TreeError> {
        let repo = &mut self.repo;
        match command {
            Command::Insert(draft) => repo.insert(draft).map(OutcomeDetail::Inserted),
            Command::Update(args) => {
                let id = require_id(args.id)?;
                repo.update(id, args.attrs).map(OutcomeDetail::Updated)
            }
            Command::UpdateControls(args) => {
                let id = require_id(args.id)?;
                let payload = args.controls.unwrap_or(Value::Null);
                let controls = repo.update_controls(id, payload)?;
                Ok(OutcomeDetail::ControlsWritten { id, controls })
            }
            Command::SetVisibility(args) => {
                let id = require_id(args.id)?;
                repo.set_visibility(id, args.visible)?;
                Ok(OutcomeDetail::VisibilitySet {
                    id,
                    visible: args.visible,
                })
            }
            Command::DetachSubtree(args) => {
                let id = require_id(args.id)?;
                repo.detach_subtree(id).map(OutcomeDetail::Detached)
            }
            Command::DeleteSubtree(args) => {
                let id = require_id(args.id)?;
                repo.delete_subtree(id).map(OutcomeDetail::Deleted)
            }
            Command::InsertShown(draft) => {
                let visible = draft.visible.unwrap_or(true);
                let report = repo.insert(draft)?;
                // Orphans already carry the flag from the payload.
                if report.placement == Placement::Attached {
                    repo.set_visibility(report.id, visible)?;
                }
                Ok(OutcomeDetail::Inserted(report))
            }
            Command::SetVisibilityAll(args) => {
                let view = repo.visibility();
                let targets = if args.visible {
                    view.unshown_ids()
                } else {
                    view.shown_ids()
                };
                for id in &targets {
                    repo.set_visibility(*id, args.visible)?;
                }
                Ok(OutcomeDetail::BulkVisibility {
                    visible: args.visible,
                    nodes: targets,
                })
            }
        }
    }
}

fn require_id(id: Option<NodeId>) -> Result<NodeId, TreeError> {
    id.ok_or(TreeError::MissingField("id"))
}

impl CommandOutcome {
    fn from_detail(detail: OutcomeDetail) -> Self {
        let OutcomeDetail::Updated(report) = &detail else {
            return CommandOutcome::Applied { detail };
        };
        match report.status() {
            UpdateStatus::Applied => CommandOutcome::Applied { detail },
            UpdateStatus::PartiallyApplied => {
                let rejected = report.rejected.clone();
                CommandOutcome::PartiallyApplied { detail, rejected }
            }
            UpdateStatus::Rejected => CommandOutcome::Rejected {
                error: report.rejected[0].error.clone(),
                rejected: report.rejected.clone(),
            },
        }
    }
}
