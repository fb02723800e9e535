//! Role bindings and their store adapter.
//!
//! A role binding maps an expected identifier to the policies and lease
//! parameters granted to callers who prove they hold that identity. Bindings
//! are stored one record per role at `role/<name>`, so the backend's ordered
//! prefix listing enumerates them lexicographically by name — the stable
//! order the matcher's first-match-wins tie-break relies on.

use std::{sync::Arc, time::Duration};

use cellar_storage::{StorageBackend, StorageError, StorageResult};
use serde::{Deserialize, Serialize};

use crate::arn::Arn;

/// Storage key prefix for role binding records.
pub const ROLE_STORAGE_PREFIX: &str = "role/";

/// An administrator-defined role binding.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cellar_auth_ram::role::RoleBinding;
///
/// let binding = RoleBinding::builder()
///     .name("deploy")
///     .arn("acs:aliyun:ram::5138828231865461:role/deploy".parse().unwrap())
///     .policies(vec!["deploy-secrets".into()])
///     .ttl(Duration::from_secs(600))
///     .max_ttl(Duration::from_secs(3600))
///     .build();
///
/// assert_eq!(binding.name, "deploy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct RoleBinding {
    /// Unique role name; also the storage key suffix.
    #[builder(into)]
    pub name: String,
    /// The identifier callers must prove they hold. A `role/<name>` or
    /// `assumed-role/...` identifier admits every session of that role;
    /// other identifiers must match exactly.
    pub arn: Arn,
    /// Policies granted on a successful login.
    #[builder(default)]
    #[serde(default)]
    pub policies: Vec<String>,
    /// Initial lease duration.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Upper bound the lease may be renewed to.
    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,
}

/// Reads and writes role bindings through the storage backend.
#[derive(Clone)]
pub struct RoleStore {
    backend: Arc<dyn StorageBackend>,
}

impl RoleStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn storage_key(name: &str) -> Vec<u8> {
        format!("{ROLE_STORAGE_PREFIX}{name}").into_bytes()
    }

    /// Retrieves a role binding by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record cannot be
    /// decoded.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, name: &str) -> StorageResult<Option<RoleBinding>> {
        match self.backend.get(&Self::storage_key(name)).await? {
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| {
                    StorageError::serialization_with_source(
                        format!("role binding record `{name}` is not valid JSON"),
                        e,
                    )
                }),
            None => Ok(None),
        }
    }

    /// Persists a role binding, overwriting any existing record of the same
    /// name.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    #[tracing::instrument(skip(self, binding), fields(name = %binding.name))]
    pub async fn save(&self, binding: &RoleBinding) -> StorageResult<()> {
        let raw = serde_json::to_vec(binding).map_err(|e| {
            StorageError::serialization_with_source(
                format!("role binding record `{}` could not be encoded", binding.name),
                e,
            )
        })?;
        self.backend.set(Self::storage_key(&binding.name), raw).await
    }

    /// Deletes a role binding. Deleting an absent binding is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> StorageResult<()> {
        self.backend.delete(&Self::storage_key(name)).await
    }

    /// Lists all role binding names, lexicographically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a stored key is not UTF-8.
    #[tracing::instrument(skip(self))]
    pub async fn list_names(&self) -> StorageResult<Vec<String>> {
        let keys = self.backend.list(ROLE_STORAGE_PREFIX.as_bytes()).await?;

        keys.into_iter()
            .map(|key| {
                String::from_utf8(key[ROLE_STORAGE_PREFIX.len()..].to_vec()).map_err(|e| {
                    StorageError::serialization_with_source("role binding key is not UTF-8", e)
                })
            })
            .collect()
    }

    /// Loads every role binding, lexicographically by name.
    ///
    /// A binding deleted between the key listing and the record read is
    /// skipped; the two reads are not assumed to be atomic.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    #[tracing::instrument(skip(self))]
    pub async fn load_all(&self) -> StorageResult<Vec<RoleBinding>> {
        let names = self.list_names().await?;

        let mut bindings = Vec::with_capacity(names.len());
        for name in names {
            if let Some(binding) = self.get(&name).await? {
                bindings.push(binding);
            }
        }
        Ok(bindings)
    }
}
