//! In-memory storage backend implementation.
//!
//! This module provides [`MemoryBackend`], an in-memory implementation of
//! [`StorageBackend`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: Keys are stored in a [`BTreeMap`], so prefix
//!   listing is naturally in ascending key order
//!
//! # Example
//!
//! ```
//! use cellar_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"greeting".to_vec(), b"hello".to_vec()).await.unwrap();
//!     let value = backend.get(b"greeting").await.unwrap();
//!
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | set | O(log n) |
//! | delete | O(log n) |
//! | list | O(log n + k) where k is result size |
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - No replication or distributed features

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{backend::StorageBackend, error::StorageResult};

/// In-memory storage backend using [`BTreeMap`].
///
/// This backend is primarily intended for testing but can also be used for
/// development or small-scale deployments where persistence is not required.
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Bytes>>>,
}

impl MemoryBackend {
    /// Creates a new, empty in-memory storage backend.
    ///
    /// # Example
    ///
    /// ```
    /// use cellar_storage::MemoryBackend;
    ///
    /// let backend = MemoryBackend::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let mut data = self.data.write();
        data.insert(key, Bytes::from(value));
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        data.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &[u8]) -> StorageResult<Vec<Bytes>> {
        let data = self.data.read();

        // BTreeMap iterates in key order, so the prefix scan is already
        // ascending. Start at the prefix and stop at the first key that no
        // longer carries it.
        let keys: Vec<Bytes> = data
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| Bytes::copy_from_slice(key))
            .collect();

        Ok(keys)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let backend = MemoryBackend::new();

        // Set and get
        backend.set(b"key1".to_vec(), b"value1".to_vec()).await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, Some(Bytes::from("value1")));

        // Overwrite
        backend.set(b"key1".to_vec(), b"value2".to_vec()).await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, Some(Bytes::from("value2")));

        // Delete
        backend.delete(b"key1").await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_noop() {
        let backend = MemoryBackend::new();
        backend.delete(b"never-stored").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_returns_only_prefixed_keys() {
        let backend = MemoryBackend::new();

        backend.set(b"role/a".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"role/b".to_vec(), b"2".to_vec()).await.unwrap();
        backend.set(b"config".to_vec(), b"3".to_vec()).await.unwrap();

        let keys = backend.list(b"role/").await.unwrap();
        assert_eq!(keys, vec![Bytes::from("role/a"), Bytes::from("role/b")]);
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let backend = MemoryBackend::new();

        // Inserted out of order; listed in order
        backend.set(b"role/c".to_vec(), b"3".to_vec()).await.unwrap();
        backend.set(b"role/a".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"role/b".to_vec(), b"2".to_vec()).await.unwrap();

        let keys = backend.list(b"role/").await.unwrap();
        assert_eq!(keys, vec![Bytes::from("role/a"), Bytes::from("role/b"), Bytes::from("role/c")]);
    }

    #[tokio::test]
    async fn test_list_empty_prefix_lists_everything() {
        let backend = MemoryBackend::new();

        backend.set(b"a".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"b".to_vec(), b"2".to_vec()).await.unwrap();

        let keys = backend.list(b"").await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_list_no_matches() {
        let backend = MemoryBackend::new();

        backend.set(b"config".to_vec(), b"{}".to_vec()).await.unwrap();

        let keys = backend.list(b"role/").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_is_not_confused_with_sibling_keys() {
        let backend = MemoryBackend::new();

        // "role0" sorts after "role/" but does not carry the prefix
        backend.set(b"role/x".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"role0".to_vec(), b"2".to_vec()).await.unwrap();

        let keys = backend.list(b"role/").await.unwrap();
        assert_eq!(keys, vec![Bytes::from("role/x")]);
    }

    #[tokio::test]
    async fn test_clone_shares_data() {
        let backend1 = MemoryBackend::new();
        let backend2 = backend1.clone();

        backend1.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();

        let value = backend2.get(b"key").await.unwrap();
        assert_eq!(value, Some(Bytes::from("value")));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        /// Strategy for generating a sorted, deduplicated set of keys.
        fn arb_sorted_keys() -> impl Strategy<Value = Vec<Vec<u8>>> {
            proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..16), 0..30)
                .prop_map(|mut keys| {
                    keys.sort();
                    keys.dedup();
                    keys
                })
        }

        proptest! {
            /// Every key returned by `list` carries the requested prefix.
            #[test]
            fn list_returns_only_prefixed_keys(
                keys in arb_sorted_keys(),
                prefix in proptest::collection::vec(any::<u8>(), 0..4),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("runtime");

                rt.block_on(async {
                    let backend = MemoryBackend::new();
                    for key in &keys {
                        backend.set(key.clone(), b"v".to_vec()).await.unwrap();
                    }

                    let listed = backend.list(&prefix).await.unwrap();

                    for key in &listed {
                        prop_assert!(key.starts_with(&prefix));
                    }

                    let expected = keys.iter().filter(|k| k.starts_with(&prefix[..])).count();
                    prop_assert_eq!(listed.len(), expected);

                    Ok(())
                })?;
            }

            /// Results from `list` are sorted ascending by key bytes.
            #[test]
            fn list_results_are_sorted(
                keys in arb_sorted_keys(),
                prefix in proptest::collection::vec(any::<u8>(), 0..4),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("runtime");

                rt.block_on(async {
                    let backend = MemoryBackend::new();
                    for key in &keys {
                        backend.set(key.clone(), b"v".to_vec()).await.unwrap();
                    }

                    let listed = backend.list(&prefix).await.unwrap();
                    for pair in listed.windows(2) {
                        prop_assert!(pair[0] < pair[1]);
                    }

                    Ok(())
                })?;
            }
        }
    }
}
