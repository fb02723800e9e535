//! Login and renewal orchestration.
//!
//! [`RamAuthenticator`] composes the verifier, the parser, the matcher, and
//! the store adapters into the single authentication decision the host asks
//! for. Each login is stateless: verify the caller's identity, parse the
//! verified identifier, select the admitting role binding, derive the
//! alias, and hand back the grant parameters. Any stage failing means no
//! decision — there is no partial success.
//!
//! Renewal re-validates an existing grant: the originating binding must
//! still exist and still grant the same policy set; otherwise the host must
//! not extend the lease.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Duration,
};

use cellar_storage::StorageBackend;

use crate::{
    alias::resolve_alias,
    arn::Arn,
    config::ConfigStore,
    error::{AuthError, Result},
    matcher,
    role::{RoleBinding, RoleStore},
    sts::{SignedIdentityRequest, StsVerifier},
};

/// A login attempt.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// The caller's pre-signed identity request.
    pub identity_request: SignedIdentityRequest,
    /// Optional role binding name. When set, only the named binding is
    /// considered and it must admit the verified identity. When unset,
    /// every binding is scanned in the store's enumeration order.
    pub role: Option<String>,
}

/// The outcome of a successful login.
///
/// Transient; the host turns it into a durable grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    /// Display alias for the authenticated entity.
    pub alias: String,
    /// Granted policies, from the selected role binding.
    pub policies: Vec<String>,
    /// Initial lease duration.
    pub ttl: Duration,
    /// Upper bound the lease may be renewed to.
    pub max_ttl: Duration,
    /// Identity and binding details the host attaches to the grant.
    pub metadata: BTreeMap<String, String>,
}

/// A renewal attempt for a previously issued grant.
#[derive(Debug, Clone)]
pub struct RenewalRequest {
    /// Name of the role binding the grant was issued from.
    pub role_name: String,
    /// The policy set the grant originally carried.
    pub granted_policies: Vec<String>,
}

/// Updated lease parameters for an approved renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalDecision {
    /// Lease duration for the renewed grant.
    pub ttl: Duration,
    /// Upper bound the lease may be renewed to.
    pub max_ttl: Duration,
}

/// The auth method's top-level entry point.
///
/// Holds its collaborators by explicit injection — one storage backend
/// shared by the config and role stores, and one verifier — and no other
/// state, so a single instance serves concurrent logins. No locks are held
/// across the verification call; dropping a login future aborts it.
#[derive(Clone)]
pub struct RamAuthenticator {
    config_store: ConfigStore,
    role_store: RoleStore,
    verifier: StsVerifier,
}

impl RamAuthenticator {
    /// Creates an authenticator over the given backend and verifier.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, verifier: StsVerifier) -> Self {
        Self {
            config_store: ConfigStore::new(backend.clone()),
            role_store: RoleStore::new(backend),
            verifier,
        }
    }

    /// The configuration store, for the host's administrative paths.
    #[must_use]
    pub fn config_store(&self) -> &ConfigStore {
        &self.config_store
    }

    /// The role binding store, for the host's administrative paths.
    #[must_use]
    pub fn role_store(&self) -> &RoleStore {
        &self.role_store
    }

    /// Authenticates a caller and derives its authorization decision.
    ///
    /// Pipeline: relay the signed identity request to the token service,
    /// parse the verified identifier, select the admitting role binding
    /// (named or scanned), resolve the alias per configuration, and return
    /// the grant parameters. Role matching never depends on configuration;
    /// the config read happens after a binding is selected, so the two
    /// store reads need not be atomic.
    ///
    /// # Errors
    ///
    /// Any stage's error aborts the login; see [`AuthError`] for the
    /// taxonomy. The host presents all of them as one authentication
    /// failure.
    #[tracing::instrument(
        skip_all,
        fields(role = request.role.as_deref().unwrap_or_default())
    )]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthDecision> {
        let identity = self.verifier.verify(&request.identity_request).await?;
        let principal: Arn = identity.arn.parse()?;

        let binding = match &request.role {
            Some(name) => {
                let binding = self
                    .role_store
                    .get(name)
                    .await?
                    .ok_or_else(|| AuthError::role_not_found(name))?;
                if !matcher::binding_admits(&binding, &principal) {
                    return Err(AuthError::NoMatchingRole);
                }
                binding
            }
            None => {
                let bindings = self.role_store.load_all().await?;
                matcher::select_binding(&principal, &bindings)
                    .cloned()
                    .ok_or(AuthError::NoMatchingRole)?
            }
        };

        let config = self.config_store.load().await?;
        let alias = resolve_alias(&config, &principal, &identity);

        let metadata = BTreeMap::from([
            ("account_id".to_string(), identity.account_id.clone()),
            ("principal_id".to_string(), identity.principal_id.clone()),
            ("arn".to_string(), identity.arn.clone()),
            ("request_id".to_string(), identity.request_id.clone()),
            ("identity_type".to_string(), identity.identity_type.clone()),
            ("role_name".to_string(), binding.name.clone()),
        ]);

        tracing::debug!(role = %binding.name, alias = %alias, "login granted");

        Ok(AuthDecision {
            alias,
            policies: binding.policies,
            ttl: binding.ttl,
            max_ttl: binding.max_ttl,
            metadata,
        })
    }

    /// Re-validates a previously issued grant for renewal.
    ///
    /// The originating binding must still exist and its policy set must
    /// equal the granted one (order-insensitively). The returned lease
    /// parameters are the binding's current values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RenewalDenied`] when the binding is gone or its
    /// policies changed, or a storage error if the re-read fails.
    #[tracing::instrument(skip_all, fields(role = %request.role_name))]
    pub async fn renew(&self, request: &RenewalRequest) -> Result<RenewalDecision> {
        let Some(binding) = self.role_store.get(&request.role_name).await? else {
            tracing::warn!("renewal requested for a role binding that no longer exists");
            return Err(AuthError::renewal_denied("role binding no longer exists"));
        };

        if !same_policy_set(&binding.policies, &request.granted_policies) {
            tracing::warn!("renewal requested with a stale policy set");
            return Err(AuthError::renewal_denied(
                "role binding policies have changed since the grant was issued",
            ));
        }

        Ok(RenewalDecision { ttl: binding.ttl, max_ttl: binding.max_ttl })
    }
}

/// Order-insensitive policy set comparison.
fn same_policy_set(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use cellar_storage::MemoryBackend;
    use reqwest::header::HeaderMap;
    use url::Url;

    use super::*;
    use crate::sts::VerifierOptions;

    fn authenticator() -> RamAuthenticator {
        let backend = Arc::new(MemoryBackend::new());
        let verifier = StsVerifier::new(VerifierOptions::default()).expect("client builds");
        RamAuthenticator::new(backend, verifier)
    }

    fn binding(name: &str, policies: &[&str]) -> RoleBinding {
        RoleBinding::builder()
            .name(name)
            .arn(format!("acs:aliyun:ram::1111:role/{name}").parse().unwrap())
            .policies(policies.iter().map(ToString::to_string).collect())
            .ttl(Duration::from_secs(600))
            .max_ttl(Duration::from_secs(3600))
            .build()
    }

    #[tokio::test]
    async fn test_login_rejects_unpinned_endpoint_before_any_network_call() {
        let auth = authenticator();
        auth.role_store().save(&binding("deploy", &["p"])).await.expect("save");

        let request = LoginRequest {
            identity_request: SignedIdentityRequest::new(
                Url::parse("https://attacker.example.com/?Action=GetCallerIdentity").unwrap(),
                HeaderMap::new(),
            ),
            role: None,
        };

        let err = auth.login(&request).await.expect_err("disallowed endpoint");
        assert!(matches!(err, AuthError::InvalidLoginRequest(_)));
    }

    #[tokio::test]
    async fn test_renew_succeeds_with_unchanged_policies() {
        let auth = authenticator();
        auth.role_store().save(&binding("deploy", &["a", "b"])).await.expect("save");

        let decision = auth
            .renew(&RenewalRequest {
                role_name: "deploy".into(),
                // Order differs; the sets are equal
                granted_policies: vec!["b".into(), "a".into()],
            })
            .await
            .expect("renewal approved");

        assert_eq!(decision.ttl, Duration::from_secs(600));
        assert_eq!(decision.max_ttl, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_renew_fails_when_binding_was_deleted() {
        let auth = authenticator();
        auth.role_store().save(&binding("deploy", &["a"])).await.expect("save");
        auth.role_store().delete("deploy").await.expect("delete");

        let err = auth
            .renew(&RenewalRequest { role_name: "deploy".into(), granted_policies: vec!["a".into()] })
            .await
            .expect_err("renewal must fail");

        assert!(matches!(err, AuthError::RenewalDenied { .. }));
    }

    #[tokio::test]
    async fn test_renew_fails_when_policies_changed() {
        let auth = authenticator();
        auth.role_store().save(&binding("deploy", &["a", "c"])).await.expect("save");

        let err = auth
            .renew(&RenewalRequest {
                role_name: "deploy".into(),
                granted_policies: vec!["a".into(), "b".into()],
            })
            .await
            .expect_err("renewal must fail");

        assert!(matches!(err, AuthError::RenewalDenied { .. }));
    }

    #[tokio::test]
    async fn test_renew_reflects_updated_lease_parameters() {
        let auth = authenticator();
        auth.role_store().save(&binding("deploy", &["a"])).await.expect("save");

        let mut updated = binding("deploy", &["a"]);
        updated.ttl = Duration::from_secs(120);
        updated.max_ttl = Duration::from_secs(1200);
        auth.role_store().save(&updated).await.expect("save");

        let decision = auth
            .renew(&RenewalRequest { role_name: "deploy".into(), granted_policies: vec!["a".into()] })
            .await
            .expect("renewal approved");

        assert_eq!(decision.ttl, Duration::from_secs(120));
        assert_eq!(decision.max_ttl, Duration::from_secs(1200));
    }

    #[test]
    fn test_same_policy_set() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string(), "x".to_string()];
        assert!(same_policy_set(&a, &b));

        let c = vec!["x".to_string()];
        assert!(!same_policy_set(&a, &c));
        assert!(same_policy_set(&[], &[]));
    }
}
