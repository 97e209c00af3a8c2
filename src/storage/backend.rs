//! Key/value backends behind [`LocalStorageService`](super::LocalStorageService).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::StorageError;

/// A string key/value store with an optional size quota.
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns [`StorageError::QuotaExceeded`] if the write would grow the
    /// store past its quota, or an I/O error from a persistent backend.
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an I/O error from a persistent backend.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Bytes used by `entries` once `key` holds `value`.
fn usage_with(entries: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
    entries
        .iter()
        .filter(|(existing, _)| existing.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum::<usize>()
        + key.len()
        + value.len()
}

fn check_quota(
    entries: &BTreeMap<String, String>,
    quota: Option<usize>,
    key: &str,
    value: &str,
) -> Result<(), StorageError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let needed = usage_with(entries, key, value);
    if needed > quota {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed,
            quota,
        });
    }
    Ok(())
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes beyond `quota` bytes of keys and values.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        check_quota(&self.entries, self.quota, key, &value)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl FileBackend {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON object of strings.
    pub fn open(path: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries: BTreeMap<String, String> = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|error| StorageError::Io {
                path: path.clone(),
                error,
            })?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened storage file");
        Ok(Self {
            path,
            entries,
            quota,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| StorageError::Io {
                path: parent.to_path_buf(),
                error,
            })?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content).map_err(|error| StorageError::Io {
            path: self.path.clone(),
            error,
        })
    }

    /// Store `value` (remove on `None`) and persist, rolling back on failure.
    fn update(&mut self, key: &str, value: Option<String>) -> Result<(), StorageError> {
        let previous = match value {
            Some(value) => self.entries.insert(key.to_string(), value),
            None => self.entries.remove(key),
        };
        if let Err(err) = self.persist() {
            match previous {
                Some(previous) => self.entries.insert(key.to_string(), previous),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        check_quota(&self.entries, self.quota, key, &value)?;
        self.update(key, Some(value))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        self.update(key, None)
    }
}
