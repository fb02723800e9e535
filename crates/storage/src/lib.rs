//! Shared storage backend abstraction for Cellar auth methods.
//!
//! This crate provides the [`StorageBackend`] trait and related types that
//! auth methods use to persist their configuration and role data. The host
//! owns the real store; auth methods only see this interface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Auth method layer                       │
//! │       (config records, role bindings, serialization)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      cellar-storage                         │
//! │                   StorageBackend trait                      │
//! │                 (get, set, delete, list)                    │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryBackend│              host-provided store             │
//! │   (testing)  │               (production)                   │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use cellar_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"role/dev".to_vec(), b"{}".to_vec()).await?;
//!
//!     let value = backend.get(b"role/dev").await?;
//!     assert_eq!(value.map(|b| b.to_vec()), Some(b"{}".to_vec()));
//!
//!     let keys = backend.list(b"role/").await?;
//!     assert_eq!(keys.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`], which wraps potential
//! [`StorageError`] variants. Backends should map their internal errors
//! to these standardized error types.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Storage backend trait definition.
pub mod backend;
/// Storage error types.
pub mod error;
/// In-memory backend for testing and development.
pub mod memory;

// Re-export primary types at crate root for convenience
pub use backend::StorageBackend;
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::MemoryBackend;
