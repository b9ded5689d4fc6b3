//! The repository interface for byte documents.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;

use bytes::Bytes;

use crate::Error;

/// Errors a [`Repository::modify`] transform may return.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// An entry found while listing that is not a committed document.
///
/// These are reported, never silently dropped or included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A directory, symlink, socket, etc.
    NotAFile { name: String },
    /// A staging artifact with nobody holding it right now, or an operation
    /// in flight. Leftovers from a crash keep `key` busy until removed.
    StagingArtifact { name: String, key: String },
    /// Some other file in the reserved namespace.
    Reserved { name: String },
    /// A name that is not valid UTF-8.
    NotUnicode { name: OsString },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::NotAFile { name } => write!(f, "{:?} is not a regular file", name),
            Anomaly::StagingArtifact { name, key } => {
                write!(f, "staging file {:?} is present for key {:?}", name, key)
            }
            Anomaly::Reserved { name } => write!(f, "unexpected reserved file {:?}", name),
            Anomaly::NotUnicode { name } => write!(f, "{:?} is not valid UTF-8", name),
        }
    }
}

/// A namespace of byte documents addressed by key.
///
/// All methods take `&self`: implementations coordinate through the
/// storage itself, so one instance may be shared across threads and any
/// number of instances may target the same storage.
pub trait Repository: Send + Sync {
    /// Commit a new document. Fails with `Exists` if `key` is committed.
    fn create(&self, key: &str, src: &mut dyn Read) -> Result<(), Error>;

    /// Open a committed document for reading.
    fn open(&self, key: &str) -> Result<Box<dyn Read + Send>, Error>;

    /// Replace a committed document. Fails with `NotExist` if `key` is absent.
    fn overwrite(&self, key: &str, src: &mut dyn Read) -> Result<(), Error>;

    /// Remove a committed document.
    fn remove(&self, key: &str) -> Result<(), Error>;

    /// Replace a committed document with `transform(current)` while holding
    /// the key, so no other mutation of `key` can interleave.
    fn modify(
        &self,
        key: &str,
        transform: &mut dyn FnMut(Bytes) -> Result<Vec<u8>, TransformError>,
    ) -> Result<(), Error>;

    /// All committed keys, sorted. Entries that are not documents go to
    /// `on_anomaly`.
    fn list_with(&self, on_anomaly: &mut dyn FnMut(Anomaly)) -> Result<Vec<String>, Error>;

    /// Read a committed document fully.
    fn read(&self, key: &str) -> Result<Bytes, Error> {
        let mut reader = self.open(key)?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|source| Error::Io {
            op: "read",
            path: key.into(),
            source,
        })?;
        Ok(Bytes::from(buf))
    }

    /// [`Repository::create`] from a byte slice.
    fn create_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), Error> {
        self.create(key, &mut &bytes[..])
    }

    /// [`Repository::overwrite`] from a byte slice.
    fn overwrite_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), Error> {
        self.overwrite(key, &mut &bytes[..])
    }

    /// All committed keys, logging anomalies as warnings.
    fn list(&self) -> Result<Vec<String>, Error> {
        self.list_with(&mut |anomaly| log::warn!("{}", anomaly))
    }
}

impl<T: Repository + ?Sized> Repository for &T {
    fn create(&self, key: &str, src: &mut dyn Read) -> Result<(), Error> {
        (**self).create(key, src)
    }

    fn open(&self, key: &str) -> Result<Box<dyn Read + Send>, Error> {
        (**self).open(key)
    }

    fn overwrite(&self, key: &str, src: &mut dyn Read) -> Result<(), Error> {
        (**self).overwrite(key, src)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        (**self).remove(key)
    }

    fn modify(
        &self,
        key: &str,
        transform: &mut dyn FnMut(Bytes) -> Result<Vec<u8>, TransformError>,
    ) -> Result<(), Error> {
        (**self).modify(key, transform)
    }

    fn list_with(&self, on_anomaly: &mut dyn FnMut(Anomaly)) -> Result<Vec<String>, Error> {
        (**self).list_with(on_anomaly)
    }

    fn read(&self, key: &str) -> Result<Bytes, Error> {
        (**self).read(key)
    }
}

impl<T: Repository + ?Sized> Repository for Box<T> {
    fn create(&self, key: &str, src: &mut dyn Read) -> Result<(), Error> {
        self.as_ref().create(key, src)
    }

    fn open(&self, key: &str) -> Result<Box<dyn Read + Send>, Error> {
        self.as_ref().open(key)
    }

    fn overwrite(&self, key: &str, src: &mut dyn Read) -> Result<(), Error> {
        self.as_ref().overwrite(key, src)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.as_ref().remove(key)
    }

    fn modify(
        &self,
        key: &str,
        transform: &mut dyn FnMut(Bytes) -> Result<Vec<u8>, TransformError>,
    ) -> Result<(), Error> {
        self.as_ref().modify(key, transform)
    }

    fn list_with(&self, on_anomaly: &mut dyn FnMut(Anomaly)) -> Result<Vec<String>, Error> {
        self.as_ref().list_with(on_anomaly)
    }

    fn read(&self, key: &str) -> Result<Bytes, Error> {
        self.as_ref().read(key)
    }
}
