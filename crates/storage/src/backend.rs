//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, which is the core
//! abstraction for key-value storage used by auth methods. All storage
//! implementations (the in-memory backend, host-provided production stores)
//! implement this trait.
//!
//! # Design Philosophy
//!
//! The trait provides a minimal, generic key-value interface:
//! - **Keys and values are bytes**: No assumptions about serialization format
//! - **Async by default**: All operations are async for non-blocking I/O
//! - **Ordered listing**: Prefix scans return keys in a stable, ascending
//!   byte order — callers may rely on that order for deterministic iteration
//!
//! Domain-specific logic (config records, role bindings) lives in the store
//! adapters built on top of this trait, not in the storage backends.
//!
//! # Implementing a Backend
//!
//! 1. Implement the [`StorageBackend`] trait
//! 2. Map backend-specific errors to [`StorageError`](crate::StorageError)
//! 3. Keep `list` ordering ascending by key bytes — adapters depend on it
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for a reference
//! implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// Abstract storage backend for key-value operations.
///
/// This trait defines the interface that all storage backends must
/// implement. Backends are expected to be thread-safe (`Send + Sync`) and
/// support concurrent operations.
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](StorageBackend::get) | Retrieve a single value by key |
/// | [`set`](StorageBackend::set) | Store a key-value pair |
/// | [`delete`](StorageBackend::delete) | Remove a key |
/// | [`list`](StorageBackend::list) | List keys under a prefix, in order |
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use cellar_storage::{MemoryBackend, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
///
/// backend.set(b"config".to_vec(), b"{}".to_vec()).await.unwrap();
/// let value = backend.get(b"config").await.unwrap();
/// assert_eq!(value, Some(Bytes::from("{}")));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair.
    ///
    /// If the key already exists, its value is overwritten.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to store
    /// * `value` - The value to associate with the key
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Deletes a key.
    ///
    /// If the key doesn't exist, this is a no-op (returns `Ok(())`).
    ///
    /// # Arguments
    ///
    /// * `key` - The key to delete
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Lists all keys that start with the given prefix.
    ///
    /// Keys are returned in ascending byte order. This order is part of the
    /// trait contract: adapters enumerate records through `list` and their
    /// iteration order must be stable across calls and backends.
    ///
    /// # Arguments
    ///
    /// * `prefix` - The key prefix to scan. An empty prefix lists every key.
    ///
    /// # Returns
    ///
    /// The matching keys (including the prefix), ascending. May be empty.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn list(&self, prefix: &[u8]) -> StorageResult<Vec<Bytes>>;
}
