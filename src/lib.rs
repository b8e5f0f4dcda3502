//! Arbor keeps a live node hierarchy built from an unordered stream of
//! insert, update, detach and delete commands.
//!
//! The [`tree::NodeRepository`] owns node identity, the live index, the orphan
//! set and the tree structure. The [`command`] layer decodes JSON commands and
//! reports an explicit outcome for each one, and [`cli`] drives command
//! streams for the `arbor` binary.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod command;
pub mod logging;
pub mod tree;
pub mod types;

pub use command::{Command, CommandOutcome, Session, SharedSession};
pub use tree::{NodeDraft, NodeRepository, OrphanSweep, RepositoryOptions};
pub use types::{NodeId, Result, TreeError, Value};
