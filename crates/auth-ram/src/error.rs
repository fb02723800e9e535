//! Authentication error types.
//!
//! This module defines errors that can occur during identity verification,
//! role matching, and grant renewal.
//!
//! Every variant collapses to the same caller-visible "authentication
//! failed" outcome at the host boundary. The distinctions below exist for
//! operator diagnostics only — a partially failed login never produces a
//! decision, and error messages never enumerate which role bindings exist.

use cellar_storage::{BoxError, StorageError};
use thiserror::Error;

/// Authentication errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// A resource identifier string does not follow the ARN grammar.
    #[error("Malformed resource identifier: {0}")]
    MalformedArn(String),

    /// The signed identity request failed pre-flight validation and was
    /// never relayed (bad encoding, disallowed endpoint, wrong action).
    #[error("Invalid login request: {0}")]
    InvalidLoginRequest(String),

    /// The identity verification service could not be reached.
    ///
    /// Network-level and potentially transient. The caller may retry; this
    /// module never retries internally.
    #[error("Identity verification service unreachable: {message}")]
    VerificationUnreachable {
        /// Description of the network failure.
        message: String,
        /// The underlying transport error.
        #[source]
        source: Option<BoxError>,
    },

    /// The identity verification service explicitly declined the request.
    ///
    /// Permanent for this attempt. Carries the service's status and body
    /// for operator diagnostics. Redirect responses land here as well —
    /// the verifier never follows them.
    #[error("identity verification rejected (status {status})")]
    VerificationRejected {
        /// HTTP status returned by the verification service.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The verification service answered success but the response body did
    /// not carry a usable identity.
    ///
    /// A contract violation from a trusted collaborator; treated as
    /// permanent and logged at error level so operators are alerted.
    #[error("Malformed identity verification response: {0}")]
    MalformedIdentityResponse(String),

    /// No role binding matches the verified identity.
    ///
    /// The default-deny outcome. The message deliberately names nothing.
    #[error("the presented identity matches no role binding")]
    NoMatchingRole,

    /// The login request named a role binding that does not exist.
    #[error("role not found: {name}")]
    RoleNotFound {
        /// The role name that was requested.
        name: String,
    },

    /// Grant renewal was re-validated and refused.
    #[error("renewal denied: {reason}")]
    RenewalDenied {
        /// Why the renewal was refused.
        reason: String,
    },

    /// Storage backend error while reading configuration or role bindings.
    ///
    /// Wraps the original [`StorageError`] to preserve the full error source
    /// chain for debugging and structured logging.
    #[error("storage error: {0}")]
    Storage(
        /// The underlying storage error.
        #[source]
        #[from]
        StorageError,
    ),
}

impl AuthError {
    /// Creates a new `MalformedArn` error.
    #[must_use]
    pub fn malformed_arn(message: impl Into<String>) -> Self {
        Self::MalformedArn(message.into())
    }

    /// Creates a new `InvalidLoginRequest` error.
    #[must_use]
    pub fn invalid_login_request(message: impl Into<String>) -> Self {
        Self::InvalidLoginRequest(message.into())
    }

    /// Creates a new `VerificationUnreachable` error with the given message.
    #[must_use]
    pub fn verification_unreachable(message: impl Into<String>) -> Self {
        Self::VerificationUnreachable { message: message.into(), source: None }
    }

    /// Creates a new `VerificationUnreachable` error with a source error.
    #[must_use]
    pub fn verification_unreachable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::VerificationUnreachable {
            message: message.into(),
            source: Some(std::sync::Arc::new(source)),
        }
    }

    /// Creates a new `MalformedIdentityResponse` error.
    #[must_use]
    pub fn malformed_identity_response(message: impl Into<String>) -> Self {
        Self::MalformedIdentityResponse(message.into())
    }

    /// Creates a new `RoleNotFound` error.
    #[must_use]
    pub fn role_not_found(name: impl Into<String>) -> Self {
        Self::RoleNotFound { name: name.into() }
    }

    /// Creates a new `RenewalDenied` error.
    #[must_use]
    pub fn renewal_denied(reason: impl Into<String>) -> Self {
        Self::RenewalDenied { reason: reason.into() }
    }

    /// Whether the error is transient and the whole operation may be retried
    /// by the caller.
    ///
    /// Only network-level failures qualify. A rejection from the
    /// verification service is never transient: replaying the same signed
    /// request will be rejected again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::VerificationUnreachable { .. } => true,
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AuthError::malformed_identity_response(err.to_string());
        }
        // Timeouts, connect failures, and request transport errors are all
        // network-level from this module's point of view.
        let message =
            if err.is_timeout() { "request timed out".to_string() } else { err.to_string() };
        AuthError::VerificationUnreachable {
            message,
            source: Some(std::sync::Arc::new(err)),
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
