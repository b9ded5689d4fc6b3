//! Error types for the bin layer.
//!
//! Every filesystem failure is classified into an [`ErrorKind`] where it
//! happens. Callers match on [`Error::kind`] rather than on error identity.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The canonical error tags shared by every layer of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The key has no committed value.
    NotExist,
    /// The key already has a committed value.
    Exists,
    /// Another operation holds the staging artifact for the key.
    Busy,
    /// The key is not a safe single path segment.
    InvalidKey,
    /// Stored or supplied content could not be interpreted.
    Malformed,
    /// Any other filesystem failure.
    Io,
    /// Name generation ran out of attempts.
    Exhausted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotExist => "not exist",
            ErrorKind::Exists => "exists",
            ErrorKind::Busy => "busy",
            ErrorKind::InvalidKey => "invalid key",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Io => "io",
            ErrorKind::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// A failure while releasing a staging artifact.
#[derive(thiserror::Error, Debug)]
#[error("failed to remove staging file {path:?}: {source}")]
pub struct CleanupFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Errors at the bin layer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("{path:?} does not exist")]
    NotExist { key: String, path: PathBuf },

    #[error("{path:?} already exists")]
    Exists { key: String, path: PathBuf },

    #[error("key {key:?} is undergoing another change (staging file {staging:?} is held)")]
    Busy { key: String, staging: PathBuf },

    #[error("failed to {op} {path:?}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A caller-supplied transform refused the committed bytes.
    #[error("content of {path:?} was rejected: {source}")]
    Rejected {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The primary failure, plus everything that went wrong releasing the
    /// staging artifact afterwards.
    #[error("{primary} (cleanup also failed: {})", join_failures(.failures))]
    Cleanup {
        #[source]
        primary: Box<Error>,
        failures: Vec<CleanupFailure>,
    },
}

fn join_failures(failures: &[CleanupFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidKey { .. } => ErrorKind::InvalidKey,
            Error::NotExist { .. } => ErrorKind::NotExist,
            Error::Exists { .. } => ErrorKind::Exists,
            Error::Busy { .. } => ErrorKind::Busy,
            Error::Io { .. } => ErrorKind::Io,
            Error::Rejected { .. } => ErrorKind::Malformed,
            Error::Cleanup { primary, .. } => primary.kind(),
        }
    }

    /// The key the failure is about, when one is known.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::InvalidKey { key, .. }
            | Error::NotExist { key, .. }
            | Error::Exists { key, .. }
            | Error::Busy { key, .. } => Some(key),
            Error::Cleanup { primary, .. } => primary.key(),
            Error::Io { .. } | Error::Rejected { .. } => None,
        }
    }

    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Attach cleanup failures to this error. No-op when there are none.
    pub fn with_cleanup(self, failures: Vec<CleanupFailure>) -> Self {
        if failures.is_empty() {
            return self;
        }
        match self {
            Error::Cleanup {
                primary,
                failures: mut earlier,
            } => {
                earlier.extend(failures);
                Error::Cleanup {
                    primary,
                    failures: earlier,
                }
            }
            primary => Error::Cleanup {
                primary: Box::new(primary),
                failures,
            },
        }
    }
}
