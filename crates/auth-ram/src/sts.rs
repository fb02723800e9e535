//! Caller identity verification against the token service.
//!
//! The caller proves its identity by submitting a pre-signed
//! `GetCallerIdentity` request. Only the true identity holder could have
//! produced the signature, and this module performs no signature math
//! itself: it relays the request verbatim to the token service's well-known
//! endpoint and trusts the service's verdict.
//!
//! # Security boundary
//!
//! Two properties keep the relay from being subverted:
//!
//! - **Endpoint pinning**: before anything is sent, the request URL must be
//!   HTTPS, its host must fall under an allowed token-service suffix, and
//!   its query must name the caller-identity action. A signed request aimed
//!   anywhere else is rejected without a network call.
//! - **No redirects**: the HTTP client is built with
//!   [`reqwest::redirect::Policy::none`]. A redirect response is surfaced as
//!   a rejection instead of being followed, so the check can never be
//!   retargeted at an attacker-controlled endpoint mid-flight.
//!
//! Verification runs under the client's bounded timeout and is never
//! retried here; dropping the future aborts the in-flight call.

use std::{collections::BTreeMap, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect,
};
use serde::Deserialize;
use url::Url;

use crate::error::{AuthError, Result};

/// Query action every relayed request must carry.
pub const CALLER_IDENTITY_ACTION: &str = "GetCallerIdentity";

/// Default allowed host suffix for the token service endpoint.
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "sts.aliyuncs.com";

/// Default relay timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client-supplied, pre-signed caller-identity request.
///
/// The URL and headers carry the caller's signature; they are relayed
/// exactly as presented. This type never inspects or recomputes the
/// signature.
#[derive(Debug, Clone)]
pub struct SignedIdentityRequest {
    url: Url,
    headers: HeaderMap,
}

impl SignedIdentityRequest {
    /// Creates a request from an already-parsed URL and header map.
    #[must_use]
    pub fn new(url: Url, headers: HeaderMap) -> Self {
        Self { url, headers }
    }

    /// Decodes the wire form of a login request: a base64 URL and a base64
    /// JSON object mapping header names to lists of values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidLoginRequest`] if either field is not
    /// valid base64, the URL does not parse, or the header map is not the
    /// expected JSON shape.
    pub fn from_base64(url_b64: &str, headers_b64: &str) -> Result<Self> {
        let url_raw = STANDARD.decode(url_b64).map_err(|e| {
            AuthError::invalid_login_request(format!("identity request URL is not valid base64: {e}"))
        })?;
        let url_str = String::from_utf8(url_raw).map_err(|e| {
            AuthError::invalid_login_request(format!("identity request URL is not UTF-8: {e}"))
        })?;
        let url = Url::parse(&url_str).map_err(|e| {
            AuthError::invalid_login_request(format!("identity request URL does not parse: {e}"))
        })?;

        let headers_raw = STANDARD.decode(headers_b64).map_err(|e| {
            AuthError::invalid_login_request(format!(
                "identity request headers are not valid base64: {e}"
            ))
        })?;
        let decoded: BTreeMap<String, Vec<String>> = serde_json::from_slice(&headers_raw)
            .map_err(|e| {
                AuthError::invalid_login_request(format!(
                    "identity request headers are not a JSON map of string lists: {e}"
                ))
            })?;

        let mut headers = HeaderMap::new();
        for (name, values) in &decoded {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                AuthError::invalid_login_request(format!("invalid header name `{name}`: {e}"))
            })?;
            for value in values {
                let value = HeaderValue::from_str(value).map_err(|e| {
                    AuthError::invalid_login_request(format!(
                        "invalid value for header `{name}`: {e}"
                    ))
                })?;
                headers.append(name.clone(), value);
            }
        }

        Ok(Self { url, headers })
    }

    /// The request URL, verbatim.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request headers, verbatim.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// The verified identity decoded from a successful token-service response.
///
/// Produced fresh per login attempt and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Account the identity belongs to.
    pub account_id: String,
    /// Unique id of the authenticated principal.
    pub principal_id: String,
    /// The identity's raw resource identifier string.
    pub arn: String,
    /// Token-service request id, for diagnostics. May be empty.
    pub request_id: String,
    /// Identity kind as reported by the service. May be empty.
    pub identity_type: String,
}

/// Wire shape of the token-service response body.
///
/// Every field is optional at the decode layer so that absence is reported
/// as this module's own contract-violation error rather than a generic
/// JSON error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCallerIdentity {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    principal_id: Option<String>,
    #[serde(default)]
    arn: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    identity_type: Option<String>,
}

/// Decodes a success response body into a [`CallerIdentity`].
///
/// # Errors
///
/// Returns [`AuthError::MalformedIdentityResponse`] if the body is not JSON
/// or any of the account id, principal id, or identifier fields is missing
/// or empty.
pub fn decode_caller_identity(body: &[u8]) -> Result<CallerIdentity> {
    let raw: RawCallerIdentity = serde_json::from_slice(body).map_err(|e| {
        AuthError::malformed_identity_response(format!("response body is not valid JSON: {e}"))
    })?;

    let require = |field: Option<String>, name: &str| {
        field.filter(|v| !v.is_empty()).ok_or_else(|| {
            AuthError::malformed_identity_response(format!("response is missing `{name}`"))
        })
    };

    Ok(CallerIdentity {
        account_id: require(raw.account_id, "AccountId")?,
        principal_id: require(raw.principal_id, "PrincipalId")?,
        arn: require(raw.arn, "Arn")?,
        request_id: raw.request_id.unwrap_or_default(),
        identity_type: raw.identity_type.unwrap_or_default(),
    })
}

/// Options for [`StsVerifier`].
#[derive(Debug, Clone, bon::Builder)]
pub struct VerifierOptions {
    /// Host suffixes the request URL may target. A host is allowed when it
    /// equals a suffix or ends with `.<suffix>`.
    #[builder(default = default_endpoint_suffixes())]
    pub endpoint_suffixes: Vec<String>,

    /// Require the request URL scheme to be HTTPS. Disable only for tests
    /// against a local endpoint.
    #[builder(default = true)]
    pub require_tls: bool,

    /// Relay timeout applied by the HTTP client.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

fn default_endpoint_suffixes() -> Vec<String> {
    vec![DEFAULT_ENDPOINT_SUFFIX.to_string()]
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            endpoint_suffixes: default_endpoint_suffixes(),
            require_tls: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Relays pre-signed caller-identity requests to the token service.
///
/// The verifier holds one [`reqwest::Client`]; the client is internally
/// reference-counted and safe to use from concurrent logins without
/// per-request mutation.
#[derive(Debug, Clone)]
pub struct StsVerifier {
    client: reqwest::Client,
    options: VerifierOptions,
}

impl StsVerifier {
    /// Creates a verifier with a hardened HTTP client: redirects disabled,
    /// timeout from `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(options: VerifierOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(options.timeout)
            .build()
            .map_err(|e| {
                AuthError::verification_unreachable_with_source("failed to build HTTP client", e)
            })?;
        Ok(Self::with_client(client, options))
    }

    /// Creates a verifier around an injected client, for tests that need a
    /// fake. The client must already have redirects disabled; this
    /// constructor does not re-harden it.
    #[must_use]
    pub fn with_client(client: reqwest::Client, options: VerifierOptions) -> Self {
        Self { client, options }
    }

    /// Validates the request against the endpoint pinning rules without
    /// sending anything.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidLoginRequest`] naming the violated rule.
    pub fn validate_request(&self, request: &SignedIdentityRequest) -> Result<()> {
        let url = request.url();

        if self.options.require_tls && url.scheme() != "https" {
            return Err(AuthError::invalid_login_request(
                "identity request URL must use https",
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| AuthError::invalid_login_request("identity request URL has no host"))?;
        if !self.host_is_allowed(host) {
            return Err(AuthError::invalid_login_request(format!(
                "host `{host}` is not an allowed token service endpoint"
            )));
        }

        let names_action = url
            .query_pairs()
            .any(|(key, value)| key == "Action" && value == CALLER_IDENTITY_ACTION);
        if !names_action {
            return Err(AuthError::invalid_login_request(format!(
                "identity request must name the {CALLER_IDENTITY_ACTION} action"
            )));
        }

        Ok(())
    }

    /// A host is allowed when it equals a configured suffix or sits under
    /// it on a label boundary. Substring matches inside a label (e.g.
    /// `evil-sts.aliyuncs.com` against `sts.aliyuncs.com`) do not qualify.
    fn host_is_allowed(&self, host: &str) -> bool {
        self.options.endpoint_suffixes.iter().any(|suffix| {
            host == suffix
                || (host.len() > suffix.len()
                    && host.ends_with(suffix)
                    && host.as_bytes()[host.len() - suffix.len() - 1] == b'.')
        })
    }

    /// Relays the signed request and decodes the service's verdict.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidLoginRequest`] — pre-flight validation failed; nothing was sent.
    /// - [`AuthError::VerificationUnreachable`] — the service could not be reached. Transient;
    ///   the caller may retry, this method never does.
    /// - [`AuthError::VerificationRejected`] — non-success status, including redirects.
    /// - [`AuthError::MalformedIdentityResponse`] — success status with an unusable body.
    #[tracing::instrument(skip_all, fields(host = %request.url().host_str().unwrap_or_default()))]
    pub async fn verify(&self, request: &SignedIdentityRequest) -> Result<CallerIdentity> {
        self.validate_request(request)?;

        let response = self
            .client
            .post(request.url().clone())
            .headers(request.headers().clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "token service rejected identity request");
            return Err(AuthError::VerificationRejected { status: status.as_u16(), body });
        }

        let body = response.bytes().await?;
        let identity = decode_caller_identity(&body).inspect_err(|e| {
            tracing::error!(error = %e, "token service returned an unusable identity response");
        })?;

        tracing::debug!(
            account_id = %identity.account_id,
            request_id = %identity.request_id,
            "caller identity verified"
        );
        Ok(identity)
    }
}
