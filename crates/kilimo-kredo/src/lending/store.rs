//! Whole-document key-value persistence.
//!
//! Each key holds one JSON value that is always replaced in full. The repositories in
//! [`super::repository`] layer per-record operations on top of this contract.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

/// Key holding the single farmer profile.
pub const PROFILE_KEY: &str = "farmerProfile";
/// Key holding the ordered application collection.
pub const APPLICATIONS_KEY: &str = "loanApplications";

pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn save(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io failure for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("stored value for '{key}' could not be decoded: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

pub fn load_as<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.load(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub fn save_as<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let value = serde_json::to_value(value).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    store.save(key, value)
}

/// Process-local store used by tests and ephemeral demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let guard = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut guard = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.to_string(), value);
        Ok(())
    }
}

/// One pretty-printed JSON file per key under a root directory.
///
/// Writes land in a uniquely named sibling temp file that is renamed over the target, so a
/// failed write leaves the previous document intact and concurrent saves never share a
/// staging file.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw = match fs::read(self.path_for(key)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let io_error = |source: io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };

        let body = serde_json::to_vec_pretty(&value).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;

        // Each save stages into its own file; a dropped `NamedTempFile` deletes itself.
        let mut staging = NamedTempFile::new_in(&self.root).map_err(io_error)?;
        staging.write_all(&body).map_err(io_error)?;
        staging.as_file().sync_all().map_err(io_error)?;
        staging
            .persist(self.path_for(key))
            .map(|_| ())
            .map_err(|err| io_error(err.error))
    }
}
