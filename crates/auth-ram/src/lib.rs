//! # Cellar RAM Authentication
//!
//! Identity-federation auth method for the Cellar secrets host: callers
//! prove their cloud identity with a pre-signed caller-identity request and
//! receive a scoped set of policies and lease parameters in return.
//!
//! This crate provides:
//! - **Identity verification**: Relay of the signed request to the token
//!   service, with endpoint pinning and redirects disabled
//! - **Identifier parsing**: Structured ARN values with exact round-trip
//!   formatting
//! - **Role matching**: Deterministic binding selection with a default-deny
//!   posture
//! - **Login orchestration**: The full verify → parse → match → alias
//!   pipeline, plus grant renewal
//!
//! ## Trust model
//!
//! - The module performs no signature math; the token service validates the
//!   caller's signature and is trusted for exactly that verdict
//! - Redirect responses from the token service are never followed
//! - No binding matching the verified identity means no access
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cellar_auth_ram::{
//!     LoginRequest, RamAuthenticator, SignedIdentityRequest, StsVerifier, VerifierOptions,
//! };
//! use cellar_storage::MemoryBackend;
//!
//! # async fn example(url_b64: &str, headers_b64: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(MemoryBackend::new());
//! let verifier = StsVerifier::new(VerifierOptions::default())?;
//! let auth = RamAuthenticator::new(backend, verifier);
//!
//! let request = LoginRequest {
//!     identity_request: SignedIdentityRequest::from_base64(url_b64, headers_b64)?,
//!     role: None,
//! };
//! let decision = auth.login(&request).await?;
//!
//! println!("granted {:?} as {}", decision.policies, decision.alias);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Display alias derivation.
pub mod alias;
/// Resource identifier parsing.
pub mod arn;
/// Configuration record and its store.
pub mod config;
/// Authentication error types.
pub mod error;
/// Login and renewal orchestration.
pub mod login;
/// Role binding selection rules.
pub mod matcher;
/// Role bindings and their store.
pub mod role;
/// Caller identity verification.
pub mod sts;

// Re-export key types for convenience
pub use alias::resolve_alias;
pub use arn::{Arn, PrincipalKind};
pub use config::{AliasSource, AuthConfig, ConfigStore};
pub use error::{AuthError, Result};
pub use login::{AuthDecision, LoginRequest, RamAuthenticator, RenewalDecision, RenewalRequest};
pub use matcher::{binding_admits, select_binding};
pub use role::{RoleBinding, RoleStore};
pub use sts::{CallerIdentity, SignedIdentityRequest, StsVerifier, VerifierOptions};
