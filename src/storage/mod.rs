//! Scoped JSON key/value persistence for editor state.
//!
//! [`LocalStorageService`] namespaces every key as `decor:<scope>:<key>` and
//! stores values as JSON strings in a [`StorageBackend`]. The backend is
//! chosen by the caller; an explicit [`StorageBackendKind::Unavailable`]
//! falls back to memory.

mod backend;

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

/// Number of elements in the capacity probe payload. Serialized as a JSON
/// array of nulls this is about 300K.
const PROBE_ELEMENTS: usize = 60_000;
const PROBE_KEY: &str = "Test";

const READ_INSTRUCTIONS_ACTION: &str = "Read Instructions";
const QUOTA_MESSAGE: &str = "Local storage is almost full. \
To save the editor state you may need to free some space.";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storing {key} needs {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("storage I/O error on {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-facing warning channel.
pub trait Notifier {
    /// Show `message` with the given action labels and return the label the
    /// user picked, if any.
    fn warn(&self, message: &str, actions: &[&str]) -> Option<String>;
}

/// Writes warnings to the log; never picks an action.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, message: &str, actions: &[&str]) -> Option<String> {
        tracing::warn!(?actions, "{message}");
        None
    }
}

/// Which backend a [`LocalStorageService`] runs on.
pub enum StorageBackendKind {
    Available(Box<dyn StorageBackend>),
    /// No persistent store; state lives in memory for this process only.
    Unavailable,
}

/// Outcome of the capacity check run when the service is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityProbe {
    Passed,
    QuotaExceeded,
    /// The backend was unavailable, so nothing was probed.
    Skipped,
}

pub struct LocalStorageService {
    backend: Box<dyn StorageBackend>,
    scope: String,
    notifier: Box<dyn Notifier>,
    probe: CapacityProbe,
}

impl LocalStorageService {
    pub fn new(kind: StorageBackendKind, scope: impl Into<String>, notifier: Box<dyn Notifier>) -> Self {
        let scope = scope.into();
        let (backend, persistent) = match kind {
            StorageBackendKind::Available(backend) => (backend, true),
            StorageBackendKind::Unavailable => {
                tracing::warn!("storage is unavailable, state will not be persisted across sessions");
                (Box::new(MemoryBackend::new()) as Box<dyn StorageBackend>, false)
            }
        };
        let mut service = Self {
            backend,
            scope,
            notifier,
            probe: CapacityProbe::Skipped,
        };
        if persistent {
            service.probe = service.probe_capacity();
        }
        service
    }

    pub const fn capacity_probe(&self) -> CapacityProbe {
        self.probe
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Serialize `data` and store it under `key`.
    ///
    /// # Errors
    /// Returns the backend error; a quota failure also warns the user.
    pub fn set_data<T: Serialize + ?Sized>(&mut self, key: &str, data: &T) -> Result<(), StorageError> {
        let value = serde_json::to_string(data)?;
        let key = self.prefixed(key);
        let result = self.backend.set_item(&key, value);
        if let Err(StorageError::QuotaExceeded { .. }) = &result {
            self.warn_quota();
        }
        result
    }

    /// The value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    /// Returns [`StorageError::Json`] if the stored value does not
    /// deserialize as `T`.
    pub fn get_data<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.backend
            .get_item(&self.prefixed(key))
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Like [`get_data`](Self::get_data), falling back to `default`.
    ///
    /// # Errors
    /// See [`get_data`](Self::get_data).
    pub fn get_data_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        Ok(self.get_data(key)?.unwrap_or(default))
    }

    /// # Errors
    /// Returns the backend error.
    pub fn remove_data(&mut self, key: &str) -> Result<(), StorageError> {
        let key = self.prefixed(key);
        self.backend.remove_item(&key)
    }

    fn prefixed(&self, key: &str) -> String {
        format!("decor:{}:{key}", self.scope)
    }

    fn probe_capacity(&mut self) -> CapacityProbe {
        let key = self.prefixed(PROBE_KEY);
        let payload = vec![(); PROBE_ELEMENTS];
        let written = serde_json::to_string(&payload)
            .map_err(StorageError::from)
            .and_then(|value| self.backend.set_item(&key, value));
        let probe = match written {
            Ok(()) => CapacityProbe::Passed,
            Err(err) => {
                tracing::debug!(error = %err, "storage capacity probe failed");
                self.warn_quota();
                CapacityProbe::QuotaExceeded
            }
        };
        if let Err(err) = self.backend.remove_item(&key) {
            tracing::warn!(error = %err, "failed to remove storage probe entry");
        }
        probe
    }

    fn warn_quota(&self) {
        let picked = self.notifier.warn(QUOTA_MESSAGE, &[READ_INSTRUCTIONS_ACTION]);
        if picked.as_deref() == Some(READ_INSTRUCTIONS_ACTION) {
            tracing::info!(
                scope = %self.scope,
                "remove stale entries from the storage file or run with --no-storage"
            );
        }
    }
}

impl std::fmt::Debug for LocalStorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorageService")
            .field("scope", &self.scope)
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}
