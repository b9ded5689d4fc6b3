//! Bin store: byte documents kept one file per key in a directory.
//!
//! This is the bottom of the dirb stack. Everything at this level is pure
//! bytes; JSON lives one layer up.
//!
//! Mutations are crash-safe and safe under concurrent use from any number of
//! processes, as long as the filesystem provides exclusive create and atomic
//! rename within a directory:
//!
//! - a key is never visible half-written: bytes are staged in a reserved
//!   file and renamed into place,
//! - two mutations racing on one key detect each other through that same
//!   reserved file, and the loser fails with [`ErrorKind::Busy`].
//!
//! Nothing blocks or retries internally. Retry policy belongs to callers.
//!
//! # Example
//!
//! ```rust
//! use dirb_bin_store::{DirRepository, ErrorKind, Repository};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let repo = DirRepository::new(dir.path()).unwrap();
//!
//! repo.create_bytes("greeting", b"hello").unwrap();
//! assert_eq!(&repo.read("greeting").unwrap()[..], b"hello");
//!
//! let err = repo.create_bytes("greeting", b"again").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Exists);
//! ```

pub use bytes::Bytes;

pub mod atomic;
mod dir;
mod error;
mod key;
mod traits;

pub use dir::DirRepository;
pub use error::{CleanupFailure, Error, ErrorKind};
pub use key::{is_reserved, staged_key, staging_name, validate_key, MAX_KEY_LEN};
pub use traits::{Anomaly, Repository, TransformError};
