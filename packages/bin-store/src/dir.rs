use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::atomic::{self, Target};
use crate::key::{is_reserved, staged_key};
use crate::traits::{Anomaly, Repository, TransformError};
use crate::Error;

/// A [`Repository`] backed by one directory: each key is a regular file
/// directly inside it.
///
/// The directory is fixed at construction. Two `DirRepository`s (in this
/// process or any other) pointed at the same directory coordinate through
/// the staging artifacts alone.
#[derive(Debug, Clone)]
pub struct DirRepository {
    root: PathBuf,
}

impl DirRepository {
    /// Open an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<DirRepository, Error> {
        let root = root.into();
        let attr = fs::metadata(&root).map_err(|err| Error::io("open directory", &root, err))?;

        if !attr.is_dir() {
            return Err(Error::io(
                "open directory",
                &root,
                io::Error::other("not a directory"),
            ));
        }

        Ok(DirRepository { root })
    }

    /// Create the directory (and any missing parents) if needed, then open it.
    pub fn create(root: impl Into<PathBuf>) -> Result<DirRepository, Error> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| Error::io("create directory", &root, err))?;
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `key` is (or would be) committed.
    pub fn path(&self, key: &str) -> Result<PathBuf, Error> {
        Ok(self.target(key)?.path)
    }

    fn target(&self, key: &str) -> Result<Target, Error> {
        Target::in_dir(&self.root, key)
    }

    fn create_or_overwrite(
        &self,
        key: &str,
        src: &mut dyn Read,
        create: bool,
    ) -> Result<(), Error> {
        let target = self.target(key)?;
        log::debug!(
            "{} {}...",
            if create { "Creating" } else { "Overwriting" },
            target.path.display()
        );

        let staging = atomic::create_exclusive(&target)?;
        // Only checked while holding the key; nobody else can commit it now.
        let precondition = if create {
            atomic::ensure_absent(&target)
        } else {
            atomic::ensure_present(&target)
        };
        if let Err(err) = precondition {
            return staging.settle(Err(err));
        }

        atomic::write_and_commit(staging, src)
    }
}

impl Repository for DirRepository {
    fn create(&self, key: &str, src: &mut dyn Read) -> Result<(), Error> {
        self.create_or_overwrite(key, src, true)
    }

    fn open(&self, key: &str) -> Result<Box<dyn Read + Send>, Error> {
        let target = self.target(key)?;
        log::debug!("Reading {}...", target.path.display());

        let file = File::open(&target.path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::NotExist {
                key: target.key.clone(),
                path: target.path.clone(),
            },
            _ => Error::io("open", &target.path, err),
        })?;
        Ok(Box::new(file))
    }

    fn read(&self, key: &str) -> Result<Bytes, Error> {
        let path = self.path(key)?;
        let mut reader = self.open(key)?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|err| Error::io("read", path, err))?;
        Ok(Bytes::from(buf))
    }

    fn overwrite(&self, key: &str, src: &mut dyn Read) -> Result<(), Error> {
        self.create_or_overwrite(key, src, false)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let target = self.target(key)?;
        log::debug!("Removing {}...", target.path.display());
        atomic::guarded_remove(&target)
    }

    fn modify(
        &self,
        key: &str,
        transform: &mut dyn FnMut(Bytes) -> Result<Vec<u8>, TransformError>,
    ) -> Result<(), Error> {
        let target = self.target(key)?;
        log::debug!("Modifying {}...", target.path.display());

        let mut staging = atomic::create_exclusive(&target)?;
        let outcome = self
            .read(key)
            .and_then(|current| {
                transform(current).map_err(|source| Error::Rejected {
                    path: target.path.clone(),
                    source,
                })
            })
            .and_then(|next| staging.write_bytes(&next))
            .and_then(|()| staging.commit());
        staging.settle(outcome)
    }

    fn list_with(&self, on_anomaly: &mut dyn FnMut(Anomaly)) -> Result<Vec<String>, Error> {
        log::debug!("Listing {}...", self.root.display());

        let entries =
            fs::read_dir(&self.root).map_err(|err| Error::io("read directory", &self.root, err))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Error::io("read directory", &self.root, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| Error::io("inspect", entry.path(), err))?;

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    on_anomaly(Anomaly::NotUnicode { name });
                    continue;
                }
            };

            if !file_type.is_file() {
                on_anomaly(Anomaly::NotAFile { name });
            } else if let Some(key) = staged_key(&name) {
                let key = key.to_string();
                on_anomaly(Anomaly::StagingArtifact { name, key });
            } else if is_reserved(&name) {
                on_anomaly(Anomaly::Reserved { name });
            } else {
                keys.push(name);
            }
        }

        keys.sort();
        Ok(keys)
    }
}
