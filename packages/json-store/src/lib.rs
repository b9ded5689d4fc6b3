//! JSON documents on top of the dirb bin store.
//!
//! A [`DocumentRepository`] stores one JSON value per document name and adds
//! the pieces the byte layer does not know about:
//!
//! - strict decoding of exactly one value per document ([`JsonCodec`]),
//! - merge-patch updates ([`merge`]), both guarded
//!   ([`DocumentRepository::update`]) and unguarded
//!   ([`DocumentRepository::weak_update`]),
//! - fresh, short, URL-safe names for new documents ([`generate_and_create`]).
//!
//! Errors carry a canonical [`ErrorKind`] shared with the bin layer, so
//! callers can branch on `NotExist`, `Exists`, `Busy` and friends without
//! caring which layer noticed.

mod codec;
mod error;
mod merge;
mod name_gen;
mod repo;

/// A JSON object.
pub type Object = serde_json::Map<String, Value>;

pub use serde_json::Value;

pub use codec::{into_object, type_name, JsonCodec};
pub use error::Error;
pub use merge::{deep_eq, merge, merge_objects};
pub use name_gen::{
    create_with_generated_key, generate_and_create, generate_name, ConfigError, NameGenConfig,
};
pub use repo::{Anomaly, DocumentRepository, DEFAULT_EXTENSION};

pub use dirb_bin_store::{DirRepository, ErrorKind, Repository};
