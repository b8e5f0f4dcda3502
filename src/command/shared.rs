use std::sync::Arc;

use parking_lot::Mutex;

use crate::tree::NodeRepository;

use super::{Command, CommandError, CommandOutcome, Session};

/// A [`Session`] that can be cloned across threads.
///
/// Each command, including any cascade it triggers, runs under one lock
/// acquisition, so commands from different handles never interleave.
#[derive(Clone, Debug, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    /// Wraps a repository.
    pub fn new(repo: NodeRepository) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Session::new(repo))),
        }
    }

    /// Applies one command under the lock.
    pub fn apply(&self, command: Command) -> Result<CommandOutcome, CommandError> {
        self.inner.lock().apply(command)
    }

    /// Decodes and applies one JSON command under the lock.
    pub fn apply_json(&self, raw: &str) -> Result<CommandOutcome, CommandError> {
        self.inner.lock().apply_json(raw)
    }

    /// Runs `f` against the repository under the lock.
    pub fn with_repository<R>(&self, f: impl FnOnce(&NodeRepository) -> R) -> R {
        let guard = self.inner.lock();
        f(guard.repository())
    }
}
