//! Atomic create/replace/remove of a single file.
//!
//! Every mutation of a key first claims `.<key>.tmp` with exclusive-create.
//! That file is both the mutual-exclusion marker for the key and the place
//! the new bytes are written before a rename makes them visible. Claiming
//! fails with [`Error::Busy`] if another operation holds it; nothing here
//! ever blocks or retries.
//!
//! The rename is the only visibility point. Before it the committed file is
//! untouched; after it the committed file holds exactly the new bytes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::key::{staging_name, validate_key};
use crate::{CleanupFailure, Error};

/// Everything the atomic operations need to know about one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub key: String,
    /// Where the committed value lives.
    pub path: PathBuf,
    /// The reserved staging artifact for the key.
    pub staging: PathBuf,
}

impl Target {
    /// Resolve `key` inside `dir`, validating it first.
    pub fn in_dir(dir: &Path, key: &str) -> Result<Target, Error> {
        validate_key(key)?;
        Ok(Target {
            key: key.to_string(),
            path: dir.join(key),
            staging: dir.join(staging_name(key)),
        })
    }

    fn not_exist(&self) -> Error {
        Error::NotExist {
            key: self.key.clone(),
            path: self.path.clone(),
        }
    }

    fn exists(&self) -> Error {
        Error::Exists {
            key: self.key.clone(),
            path: self.path.clone(),
        }
    }
}

/// A claimed staging artifact.
///
/// Dropping a `StagingFile` that was neither committed nor settled removes
/// the artifact (best effort, logged). Normal code paths go through
/// [`StagingFile::settle`] so that removal failures are reported.
#[derive(Debug)]
pub struct StagingFile {
    file: Option<File>,
    target: Target,
    released: bool,
}

/// Claim the staging artifact for `target`.
///
/// Fails with [`Error::Busy`] if the artifact already exists, whether or not
/// the committed file does.
pub fn create_exclusive(target: &Target) -> Result<StagingFile, Error> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target.staging)
        .map_err(|err| match err.kind() {
            io::ErrorKind::AlreadyExists => Error::Busy {
                key: target.key.clone(),
                staging: target.staging.clone(),
            },
            _ => Error::io("create staging file", &target.staging, err),
        })?;

    log::debug!("Claimed {}", target.staging.display());

    Ok(StagingFile {
        file: Some(file),
        target: target.clone(),
        released: false,
    })
}

/// Write `src` into the staging artifact and rename it onto the committed
/// path, cleaning up the artifact on every exit path.
pub fn write_and_commit(mut staging: StagingFile, src: &mut dyn Read) -> Result<(), Error> {
    let outcome = staging
        .write_from(src)
        .and_then(|()| staging.commit());
    staging.settle(outcome)
}

/// Delete the committed file without claiming the key.
pub fn remove_committed(target: &Target) -> Result<(), Error> {
    fs::remove_file(&target.path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => target.not_exist(),
        _ => Error::io("remove", &target.path, err),
    })
}

/// Delete the committed file while holding the key's staging artifact, so a
/// remove cannot interleave with a create or overwrite of the same key.
pub fn guarded_remove(target: &Target) -> Result<(), Error> {
    let staging = create_exclusive(target)?;
    let outcome = remove_committed(target);
    staging.settle(outcome)
}

/// Fail with [`Error::Exists`] if the committed file is present.
pub fn ensure_absent(target: &Target) -> Result<(), Error> {
    if committed(target)? {
        Err(target.exists())
    } else {
        Ok(())
    }
}

/// Fail with [`Error::NotExist`] if the committed file is missing.
pub fn ensure_present(target: &Target) -> Result<(), Error> {
    if committed(target)? {
        Ok(())
    } else {
        Err(target.not_exist())
    }
}

fn committed(target: &Target) -> Result<bool, Error> {
    match fs::symlink_metadata(&target.path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(Error::io("check existence of", &target.path, err)),
    }
}

impl StagingFile {
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Copy all of `src` into the staging artifact.
    pub fn write_from(&mut self, src: &mut dyn Read) -> Result<(), Error> {
        let staging = &self.target.staging;
        let file = self.file.as_mut().ok_or_else(|| {
            Error::io(
                "write",
                staging,
                io::Error::other("staging file is already closed"),
            )
        })?;

        io::copy(src, file).map_err(|err| Error::io("write staging file", staging, err))?;
        Ok(())
    }

    /// Copy `bytes` into the staging artifact.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut src = bytes;
        self.write_from(&mut src)
    }

    /// Flush the staged bytes to disk, close the artifact, and rename it onto
    /// the committed path.
    pub fn commit(&mut self) -> Result<(), Error> {
        let staging = &self.target.staging;
        if let Some(mut file) = self.file.take() {
            file.flush()
                .and_then(|()| file.sync_all())
                .map_err(|err| Error::io("sync staging file", staging, err))?;
        }

        fs::rename(staging, &self.target.path).map_err(|err| {
            Error::io(
                "rename staging file onto",
                &self.target.path,
                err,
            )
        })?;
        self.released = true;

        log::debug!("Committed {}", self.target.path.display());
        Ok(())
    }

    /// Release the artifact and fold any cleanup failure into `outcome`.
    ///
    /// If `outcome` is `Ok`, cleanup failures are logged as warnings and the
    /// operation still succeeds: the committed state is already correct.
    pub fn settle<T>(mut self, outcome: Result<T, Error>) -> Result<T, Error> {
        let failures = self.release();
        match outcome {
            Ok(value) => {
                for failure in &failures {
                    log::warn!("{}", failure);
                }
                Ok(value)
            }
            Err(err) => Err(err.with_cleanup(failures)),
        }
    }

    /// Close and remove the artifact unless it was renamed into place.
    fn release(&mut self) -> Vec<CleanupFailure> {
        drop(self.file.take());
        if self.released {
            return Vec::new();
        }
        self.released = true;

        match fs::remove_file(&self.target.staging) {
            Ok(()) => {
                log::debug!("Released {}", self.target.staging.display());
                Vec::new()
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => vec![CleanupFailure {
                path: self.target.staging.clone(),
                source,
            }],
        }
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        for failure in self.release() {
            log::warn!("{}", failure);
        }
    }
}
