use serde::Serialize;
use thiserror::Error;

use super::{NodeId, ValueKind};

/// Errors produced by repository operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    /// A required payload field was absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// The id is already live or orphaned.
    #[error("node {0} already exists")]
    DuplicateId(NodeId),
    /// The id is not known to the repository (or not live, where liveness is required).
    #[error("node {0} not found")]
    UnknownId(NodeId),
    /// An update tried to change the runtime kind of an existing field.
    #[error("field `{field}` holds a {current} value and cannot be set to a {incoming} value")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Kind currently stored on the node.
        current: ValueKind,
        /// Kind carried by the rejected update.
        incoming: ValueKind,
    },
    /// An update targeted a structural field that only the repository may change.
    #[error("field `{0}` is maintained by the repository and cannot be updated")]
    ReservedField(String),
    /// A controls update carried something other than a mapping.
    #[error("controls payload must be a map, got {0}")]
    InvalidControlsPayload(ValueKind),
    /// Internal state was already inconsistent before the call.
    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),
}

impl TreeError {
    /// Returns true when the error indicates prior state corruption rather
    /// than a bad request. Callers should stop issuing commands.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TreeError::InvariantViolation(_))
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "tree invariant violated");
        TreeError::InvariantViolation(message)
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// A single field skipped by a best-effort update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRejection {
    /// Name of the skipped field.
    pub field: String,
    /// Error that caused the field to be skipped.
    #[serde(skip)]
    pub error: TreeError,
    /// Human-readable reason.
    pub reason: String,
    /// Kind stored on the node, for type mismatches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<ValueKind>,
    /// Kind carried by the update, for type mismatches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<ValueKind>,
}

impl FieldRejection {
    pub(crate) fn from_error(field: &str, err: &TreeError) -> Self {
        let (current, incoming) = match err {
            TreeError::TypeMismatch {
                current, incoming, ..
            } => (Some(*current), Some(*incoming)),
            _ => (None, None),
        };
        Self {
            field: field.to_string(),
            error: err.clone(),
            reason: err.to_string(),
            current,
            incoming,
        }
    }
}
