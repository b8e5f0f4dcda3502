#![forbid(unsafe_code)]

//! Identifiers, values and error types shared by every layer of the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

mod error;
mod value;

pub use error::{FieldRejection, Result, TreeError};
pub use value::{Value, ValueKind};

/// Caller-supplied node identifier.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u64 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}
