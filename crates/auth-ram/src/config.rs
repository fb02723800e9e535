//! Auth method configuration.
//!
//! A single configuration record controls how the display alias for an
//! authenticated entity is derived. The record is stored at the `config`
//! key as `{"ram_alias": "principalId" | "roleArn"}`; an absent record means
//! defaults, and deleting it reverts to defaults without requiring a write.

use std::sync::Arc;

use cellar_storage::{StorageBackend, StorageError, StorageResult};
use serde::{Deserialize, Serialize};

/// Storage key holding the configuration record.
pub const CONFIG_STORAGE_KEY: &[u8] = b"config";

/// Where the display alias for an authenticated entity comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasSource {
    /// Use the verified principal id. Unique per underlying account or
    /// session; does not collapse sessions of the same role. The default.
    #[default]
    PrincipalId,
    /// Use the role name from the caller's identifier. Every session of the
    /// same role shares the alias, letting the host correlate them as one
    /// logical entity. Identities without a role component fall back to the
    /// principal id.
    RoleArn,
}

/// The auth method's configuration record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Alias derivation mode.
    #[serde(rename = "ram_alias", default)]
    pub alias_source: AliasSource,
}

/// Reads and writes the configuration record through the storage backend.
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn StorageBackend>,
}

impl ConfigStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Loads the configuration, falling back to defaults when no record has
    /// been written. Never writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored record cannot be
    /// decoded.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> StorageResult<AuthConfig> {
        match self.backend.get(CONFIG_STORAGE_KEY).await? {
            Some(raw) => serde_json::from_slice(&raw).map_err(|e| {
                StorageError::serialization_with_source("config record is not valid JSON", e)
            }),
            None => Ok(AuthConfig::default()),
        }
    }

    /// Persists the configuration record, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    #[tracing::instrument(skip(self))]
    pub async fn save(&self, config: &AuthConfig) -> StorageResult<()> {
        let raw = serde_json::to_vec(config).map_err(|e| {
            StorageError::serialization_with_source("config record could not be encoded", e)
        })?;
        self.backend.set(CONFIG_STORAGE_KEY.to_vec(), raw).await
    }

    /// Deletes the configuration record, reverting to defaults.
    ///
    /// Deleting an absent record is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self) -> StorageResult<()> {
        self.backend.delete(CONFIG_STORAGE_KEY).await
    }
}
