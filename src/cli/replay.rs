use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::command::{Command, CommandError, CommandOutcome, Session};
use crate::tree::{NodeRepository, RepositoryOptions};
use crate::types::TreeError;

/// Options controlling a replay.
#[derive(Clone, Debug, Default)]
pub struct ReplayOptions {
    /// Abort on the first malformed line instead of counting it.
    pub strict: bool,
}

/// One processed line.
#[derive(Clone, Debug, Serialize)]
pub struct ReplayEntry {
    /// 1-based line number.
    pub line: usize,
    /// Outcome, when the line decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CommandOutcome>,
    /// Decode error, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub malformed: Option<String>,
}

/// Tally of a replay.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReplaySummary {
    /// Commands fully applied.
    pub applied: usize,
    /// Updates applied in part.
    pub partial: usize,
    /// Commands rejected.
    pub rejected: usize,
    /// Lines that did not decode.
    pub malformed: usize,
    /// Per-line detail in input order.
    pub entries: Vec<ReplayEntry>,
}

impl ReplaySummary {
    /// Number of command lines seen, including malformed ones.
    pub fn total(&self) -> usize {
        self.applied + self.partial + self.rejected + self.malformed
    }

    fn record(&mut self, line: usize, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::Applied { .. } => self.applied += 1,
            CommandOutcome::PartiallyApplied { .. } => self.partial += 1,
            CommandOutcome::Rejected { .. } => self.rejected += 1,
        }
        self.entries.push(ReplayEntry {
            line,
            outcome: Some(outcome),
            malformed: None,
        });
    }
}

/// Errors that abort a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The input could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The input could not be read.
    #[error("failed to read line {line}: {source}")]
    Read {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        source: io::Error,
    },
    /// A line did not decode and the replay is strict.
    #[error("line {line}: {source}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Decode error.
        source: serde_json::Error,
    },
    /// The repository reported corrupted state.
    #[error("line {line}: {source}")]
    Fatal {
        /// 1-based line number.
        line: usize,
        /// Invariant violation.
        source: TreeError,
    },
}

/// Applies every command line from `reader` to `session`.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn replay_reader<R: BufRead>(
    reader: R,
    session: &mut Session,
    opts: &ReplayOptions,
) -> Result<ReplaySummary, ReplayError> {
    let mut summary = ReplaySummary::default();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| ReplayError::Read {
            line: line_no,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command: Command = match serde_json::from_str(trimmed) {
            Ok(command) => command,
            Err(source) if opts.strict => {
                return Err(ReplayError::Malformed {
                    line: line_no,
                    source,
                })
            }
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping malformed command");
                summary.malformed += 1;
                summary.entries.push(ReplayEntry {
                    line: line_no,
                    outcome: None,
                    malformed: Some(err.to_string()),
                });
                continue;
            }
        };
        match session.apply(command) {
            Ok(outcome) => summary.record(line_no, outcome),
            Err(CommandError::Fatal(source)) => {
                return Err(ReplayError::Fatal {
                    line: line_no,
                    source,
                })
            }
            Err(CommandError::Decode(source)) => {
                return Err(ReplayError::Malformed {
                    line: line_no,
                    source,
                })
            }
        }
    }
    info!(
        applied = summary.applied,
        partial = summary.partial,
        rejected = summary.rejected,
        malformed = summary.malformed,
        "replay finished"
    );
    Ok(summary)
}

/// Replays a file (or stdin for `-`) into a fresh repository.
pub fn replay_path(
    path: &Path,
    repo_opts: RepositoryOptions,
    opts: &ReplayOptions,
) -> Result<(NodeRepository, ReplaySummary), ReplayError> {
    let mut session = Session::new(NodeRepository::with_options(repo_opts));
    let summary = if path == Path::new("-") {
        let stdin = io::stdin();
        replay_reader(stdin.lock(), &mut session, opts)?
    } else {
        let file = File::open(path).map_err(|source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        replay_reader(BufReader::new(file), &mut session, opts)?
    };
    Ok((session.into_repository(), summary))
}
