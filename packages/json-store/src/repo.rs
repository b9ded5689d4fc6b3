use std::fmt;
use std::path::PathBuf;

use dirb_bin_store::{
    validate_key, Anomaly as EntryAnomaly, DirRepository, Repository, TransformError,
};
use serde_json::Value;

use crate::codec::{into_object, JsonCodec};
use crate::merge::{merge, merge_objects};
use crate::name_gen::{generate_and_create, NameGenConfig};
use crate::{Error, Object};

/// The file extension documents are stored under by default.
pub const DEFAULT_EXTENSION: &str = "json";

/// Something found while listing that is not a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// Reported by the underlying bin repository.
    Entry(EntryAnomaly),
    /// A committed key without the document extension.
    MissingExtension { key: String, extension: String },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::Entry(anomaly) => write!(f, "{}", anomaly),
            Anomaly::MissingExtension { key, extension } => {
                write!(f, "{:?} is missing the \".{}\" extension", key, extension)
            }
        }
    }
}

impl From<EntryAnomaly> for Anomaly {
    fn from(anomaly: EntryAnomaly) -> Self {
        Anomaly::Entry(anomaly)
    }
}

/// JSON documents on top of a bin [`Repository`].
///
/// Each document name maps to one key (`<name>.json` unless configured
/// otherwise). Values handed in and out are owned copies; nothing returned
/// refers back into storage.
///
/// # Example
///
/// ```rust
/// use dirb_json_store::DocumentRepository;
/// use serde_json::json;
///
/// let dir = tempfile::tempdir().unwrap();
/// let books = DocumentRepository::open(dir.path()).unwrap();
///
/// let doc = json!({"title": "Dune", "meta": {"pages": 412}});
/// let name = books.create(doc.as_object().unwrap()).unwrap();
///
/// books
///     .update(&name, json!({"meta": {"read": true}}).as_object().unwrap())
///     .unwrap();
///
/// assert_eq!(
///     books.get(&name).unwrap(),
///     json!({"title": "Dune", "meta": {"pages": 412, "read": true}})
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DocumentRepository<R = DirRepository> {
    repo: R,
    extension: Option<String>,
    codec: JsonCodec,
    name_gen: NameGenConfig,
}

impl DocumentRepository<DirRepository> {
    /// Documents in an existing directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self::new(DirRepository::new(dir)?))
    }
}

impl<R: Repository> DocumentRepository<R> {
    pub fn new(repo: R) -> Self {
        DocumentRepository {
            repo,
            extension: Some(DEFAULT_EXTENSION.to_string()),
            codec: JsonCodec::default(),
            name_gen: NameGenConfig::default(),
        }
    }

    /// Store documents under `<name>.<extension>`, or under the bare name
    /// when `None`.
    #[must_use]
    pub fn with_extension(mut self, extension: Option<&str>) -> Self {
        self.extension = extension.map(|e| e.trim_start_matches('.').to_string());
        self
    }

    #[must_use]
    pub fn with_name_gen(mut self, config: NameGenConfig) -> Self {
        self.name_gen = config;
        self
    }

    /// Indent stored documents.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.codec = if pretty {
            JsonCodec::pretty()
        } else {
            JsonCodec::default()
        };
        self
    }

    pub fn inner(&self) -> &R {
        &self.repo
    }

    pub fn codec(&self) -> JsonCodec {
        self.codec
    }

    fn key(&self, name: &str) -> Result<String, Error> {
        validate_key(name)?;
        let key = match &self.extension {
            Some(extension) => format!("{}.{}", name, extension),
            None => name.to_string(),
        };
        validate_key(&key)?;
        Ok(key)
    }

    fn name_of<'k>(&self, key: &'k str) -> Option<&'k str> {
        match &self.extension {
            Some(extension) => key
                .strip_suffix(extension.as_str())
                .and_then(|rest| rest.strip_suffix('.'))
                .filter(|name| !name.is_empty()),
            None => Some(key),
        }
    }

    /// Store `document` under a freshly generated name and return the name.
    pub fn create(&self, document: &Object) -> Result<String, Error> {
        let bytes = self.codec.encode(&Value::Object(document.clone()))?;
        generate_and_create(&self.name_gen, |name| self.create_encoded(name, &bytes))
    }

    /// Store any JSON value under a caller-chosen name.
    pub fn create_named(&self, name: &str, value: &Value) -> Result<(), Error> {
        let bytes = self.codec.encode(value)?;
        self.create_encoded(name, &bytes)
    }

    fn create_encoded(&self, name: &str, bytes: &[u8]) -> Result<(), Error> {
        let key = self.key(name)?;
        self.repo.create_bytes(&key, bytes)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let key = self.key(name)?;
        let bytes = self.repo.read(&key)?;
        self.codec.decode_slice(&bytes).map_err(|e| e.for_key(name))
    }

    /// As [`DocumentRepository::get`], requiring the document be an object.
    pub fn get_object(&self, name: &str) -> Result<Object, Error> {
        into_object(self.get(name)?).map_err(|e| e.for_key(name))
    }

    /// Replace a document wholesale. The document must already exist.
    pub fn overwrite(&self, name: &str, value: &Value) -> Result<(), Error> {
        let key = self.key(name)?;
        let bytes = self.codec.encode(value)?;
        self.repo.overwrite_bytes(&key, &bytes)?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<(), Error> {
        let key = self.key(name)?;
        self.repo.remove(&key)?;
        Ok(())
    }

    /// Merge `patch` into a stored object while holding the document, so no
    /// other mutation of it can slip in between the read and the write.
    pub fn update(&self, name: &str, patch: &Object) -> Result<(), Error> {
        let key = self.key(name)?;
        let codec = self.codec;
        self.repo
            .modify(&key, &mut |current| {
                let old = codec.decode_object_slice(&current).map_err(boxed)?;
                let merged = merge_objects(&old, patch);
                codec.encode(&Value::Object(merged)).map_err(boxed)
            })
            .map_err(|e| Error::from(e).for_key(name))
    }

    /// Read, merge, overwrite.
    ///
    /// Only the final overwrite is atomic. A writer that commits between the
    /// read and the overwrite has its change silently replaced. Use
    /// [`DocumentRepository::update`] when that matters.
    pub fn weak_update(&self, name: &str, patch: &Value) -> Result<(), Error> {
        let old = self.get(name)?;
        self.overwrite(name, &merge(&old, patch))
    }

    /// Names of all documents, sorted. Entries that are not documents go to
    /// `on_anomaly`.
    pub fn list_with(&self, mut on_anomaly: impl FnMut(Anomaly)) -> Result<Vec<String>, Error> {
        let keys = self
            .repo
            .list_with(&mut |anomaly| on_anomaly(Anomaly::Entry(anomaly)))?;

        let mut names = Vec::with_capacity(keys.len());
        for key in keys {
            match self.name_of(&key) {
                Some(name) => names.push(name.to_string()),
                None => on_anomaly(Anomaly::MissingExtension {
                    extension: self.extension.clone().unwrap_or_default(),
                    key,
                }),
            }
        }
        Ok(names)
    }

    /// Names of all documents, logging anomalies as warnings.
    pub fn list(&self) -> Result<Vec<String>, Error> {
        self.list_with(|anomaly| log::warn!("{}", anomaly))
    }
}

fn boxed(error: Error) -> TransformError {
    Box::new(error)
}
