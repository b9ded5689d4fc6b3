//! Named collections of documents.
//!
//! A collection is a subdirectory of the document root, reachable by its
//! name or any of its aliases.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dirb_bin_store::{validate_key, Error as BinError};

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("unknown collection {name:?}")]
    Unknown { name: String },

    #[error("{name:?} already names a collection")]
    Duplicate { name: String },

    #[error("invalid collection name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: BinError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    aliases: Vec<String>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Where this collection lives under `root`.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }
}

/// Lookup from collection names and aliases to collections.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: Vec<Collection>,
    lookup: HashMap<String, usize>,
}

impl Registry {
    /// A registry with no collections.
    pub fn empty() -> Self {
        Registry::default()
    }

    /// The book shop collections.
    pub fn shop() -> Self {
        let mut registry = Registry::empty();
        for (name, aliases) in [
            ("books", ["book", "bk", "bks"]),
            ("sellers", ["seller", "slr", "slrs"]),
            ("buyers", ["buyer", "byr", "byrs"]),
        ] {
            if let Err(e) = registry.register(name, &aliases) {
                log::error!("Skipping collection {:?}: {}", name, e);
            }
        }
        registry
    }

    /// Add a collection. Neither the name nor any alias may be taken.
    pub fn register(&mut self, name: &str, aliases: &[&str]) -> Result<(), RegistryError> {
        validate_key(name).map_err(|source| RegistryError::InvalidName {
            name: name.to_string(),
            source,
        })?;

        let mut all = vec![name];
        all.extend_from_slice(aliases);
        for (i, candidate) in all.iter().enumerate() {
            if self.lookup.contains_key(*candidate) || all[..i].contains(candidate) {
                return Err(RegistryError::Duplicate {
                    name: candidate.to_string(),
                });
            }
        }

        let index = self.collections.len();
        for candidate in &all {
            self.lookup.insert(candidate.to_string(), index);
        }
        self.collections.push(Collection {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&Collection, RegistryError> {
        self.lookup
            .get(name)
            .map(|&index| &self.collections[index])
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_string(),
            })
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }
}
