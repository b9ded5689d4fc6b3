//! Error types for the JSON layer.

use dirb_bin_store::{CleanupFailure, Error as BinError, ErrorKind};

/// Errors at the JSON layer.
///
/// Storage failures keep their bin-layer error as the source; use
/// [`Error::kind`] to branch on the canonical tag.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Storage(#[source] BinError),

    #[error("{}malformed json: {source}", key_prefix(.key))]
    Malformed {
        key: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}failed to read json: {source}", key_prefix(.key))]
    Read {
        key: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}json already ended, but got more input: {source}", key_prefix(.key))]
    TrailingInput {
        key: Option<String>,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}expected a json object, found {found}", key_prefix(.key))]
    NotAnObject {
        key: Option<String>,
        found: &'static str,
    },

    #[error("failed to encode json: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to find a unique name after {attempts} tries")]
    Exhausted { attempts: u64 },

    #[error("{primary} (cleanup also failed: {})", join_failures(.failures))]
    Cleanup {
        #[source]
        primary: Box<Error>,
        failures: Vec<CleanupFailure>,
    },
}

fn key_prefix(key: &Option<String>) -> String {
    match key {
        Some(key) => format!("{:?}: ", key),
        None => String::new(),
    }
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
            Error::Storage(e) => e.kind(),
            Error::Malformed { .. }
            | Error::TrailingInput { .. }
            | Error::NotAnObject { .. }
            | Error::Encode(_) => ErrorKind::Malformed,
            Error::Read { .. } => ErrorKind::Io,
            Error::Exhausted { .. } => ErrorKind::Exhausted,
            Error::Cleanup { primary, .. } => primary.kind(),
        }
    }

    /// Name the document a content error is about.
    pub(crate) fn for_key(self, name: &str) -> Self {
        match self {
            Error::Malformed { key: None, source } => Error::Malformed {
                key: Some(name.to_string()),
                source,
            },
            Error::Read { key: None, source } => Error::Read {
                key: Some(name.to_string()),
                source,
            },
            Error::TrailingInput { key: None, source } => Error::TrailingInput {
                key: Some(name.to_string()),
                source,
            },
            Error::NotAnObject { key: None, found } => Error::NotAnObject {
                key: Some(name.to_string()),
                found,
            },
            Error::Cleanup { primary, failures } => Error::Cleanup {
                primary: Box::new(primary.for_key(name)),
                failures,
            },
            other => other,
        }
    }
}

/// Translation from the bin layer.
///
/// A transform rejection that carried a JSON error is unwrapped back into
/// that error, and cleanup failures stay attached to the translated primary.
impl From<BinError> for Error {
    fn from(error: BinError) -> Self {
        match error {
            BinError::Rejected { path, source } => match source.downcast::<Error>() {
                Ok(inner) => *inner,
                Err(source) => Error::Storage(BinError::Rejected { path, source }),
            },
            BinError::Cleanup { primary, failures } => Error::Cleanup {
                primary: Box::new(Error::from(*primary)),
                failures,
            },
            other => Error::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn syntax_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn storage_errors_keep_their_kind() {
        let e = Error::from(BinError::Busy {
            key: "k".to_string(),
            staging: PathBuf::from(".k.tmp"),
        });
        assert_eq!(e.kind(), ErrorKind::Busy);
        assert!(matches!(e, Error::Storage(BinError::Busy { .. })));
    }

    #[test]
    fn rejected_json_error_is_unwrapped() {
        let inner = Error::NotAnObject {
            key: None,
            found: "array",
        };
        let e = Error::from(BinError::Rejected {
            path: PathBuf::from("k.json"),
            source: Box::new(inner),
        });
        assert!(matches!(e, Error::NotAnObject { .. }));
        assert_eq!(e.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn foreign_rejection_stays_storage() {
        let e = Error::from(BinError::Rejected {
            path: PathBuf::from("k.json"),
            source: "not json related".into(),
        });
        assert!(matches!(e, Error::Storage(BinError::Rejected { .. })));
        assert_eq!(e.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn cleanup_is_rehomed() {
        let bin = BinError::Rejected {
            path: PathBuf::from("k.json"),
            source: Box::new(Error::Malformed {
                key: None,
                source: syntax_error(),
            }),
        }
        .with_cleanup(vec![CleanupFailure {
            path: PathBuf::from(".k.json.tmp"),
            source: std::io::Error::other("stuck"),
        }]);

        let e = Error::from(bin).for_key("k");
        assert_eq!(e.kind(), ErrorKind::Malformed);
        match e {
            Error::Cleanup { primary, failures } => {
                assert_eq!(failures.len(), 1);
                assert!(matches!(
                    *primary,
                    Error::Malformed { key: Some(ref k), .. } if k == "k"
                ));
            }
            other => panic!("expected cleanup error, got {:?}", other),
        }
    }

    #[test]
    fn display_names_the_key() {
        let e = Error::NotAnObject {
            key: None,
            found: "string",
        }
        .for_key("doc");
        assert_eq!(
            format!("{}", e),
            "\"doc\": expected a json object, found string"
        );
    }
}
