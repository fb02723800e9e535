//! RAM resource identifier (ARN) parsing.
//!
//! This module provides [`Arn`], the structured form of the colon-delimited
//! resource identifiers carried in verified caller identities and in role
//! bindings.
//!
//! The grammar is `acs:partition:service:region:accountId:resource` — six
//! colon-delimited outer fields, where the resource path further encodes the
//! principal kind (`assumed-role/<role>/<session>`, `role/<name>`,
//! `user/<name>`, or `root`). The type/name separator inside the resource
//! path may be a slash or a colon; whichever the input used is preserved, so
//! parsing followed by formatting yields the original string byte for byte.
//!
//! # Example
//!
//! ```
//! use cellar_auth_ram::arn::{Arn, PrincipalKind};
//!
//! let arn: Arn = "acs:aliyun:sts::5138828231865461:assumed-role/deploy/vm-01"
//!     .parse()
//!     .expect("well-formed identifier");
//!
//! assert_eq!(arn.account_id(), "5138828231865461");
//! assert!(matches!(
//!     arn.kind(),
//!     PrincipalKind::AssumedRole { role_name, .. } if role_name == "deploy"
//! ));
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::AuthError;

/// Scheme literal every identifier must start with.
pub const ARN_SCHEME: &str = "acs";

/// The principal kind encoded in an identifier's resource path.
///
/// Role-assumed identities are temporary credentials obtained by assuming a
/// named role; every session of the same role shares the role name. The
/// remaining kinds are primary identities held directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalKind {
    /// A session of an assumed role: `assumed-role/<role>/<session>`.
    AssumedRole {
        /// Name of the assumed role, shared by all of its sessions.
        role_name: String,
        /// Per-session name, unique to this caller.
        session_name: String,
    },
    /// A role resource: `role/<name>`. Used by role bindings to name the
    /// role whose sessions they admit.
    Role {
        /// Name of the role.
        role_name: String,
    },
    /// A directly held user identity: `user/<name>`.
    User {
        /// Name of the user.
        user_name: String,
    },
    /// The account root identity.
    Root,
}

impl PrincipalKind {
    /// Whether this is a role-assumed identity.
    #[must_use]
    pub fn is_assumed_role(&self) -> bool {
        matches!(self, Self::AssumedRole { .. })
    }

    /// The role name, when this kind carries one.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        match self {
            Self::AssumedRole { role_name, .. } | Self::Role { role_name } => Some(role_name),
            Self::User { .. } | Self::Root => None,
        }
    }
}

/// A parsed resource identifier.
///
/// Immutable value type. Two identifiers are compared for role-matching
/// purposes by the rules in [`matcher`](crate::matcher), not by full
/// equality; `Arn` itself compares all fields.
///
/// # Format stability
///
/// The resource path is kept verbatim alongside its parsed
/// [`PrincipalKind`], so `arn.to_string()` reproduces the input exactly,
/// including the separator style inside the resource path. Case is preserved
/// as presented; the verification service is trusted to have normalized it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    partition: String,
    service: String,
    region: String,
    account_id: String,
    resource: String,
    kind: PrincipalKind,
}

impl Arn {
    /// The partition field.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The service field (e.g. `ram`, `sts`).
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The region field. Often empty for identity resources.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The numeric account id, preserved as presented.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The verbatim resource path.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The parsed principal kind.
    #[must_use]
    pub fn kind(&self) -> &PrincipalKind {
        &self.kind
    }
}

impl FromStr for Arn {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The resource path may itself contain colons, so only the first
        // five are field delimiters.
        let fields: Vec<&str> = s.splitn(6, ':').collect();
        if fields.len() < 6 {
            return Err(AuthError::malformed_arn(format!(
                "expected 6 colon-delimited fields, got {}",
                fields.len()
            )));
        }

        if fields[0] != ARN_SCHEME {
            return Err(AuthError::malformed_arn(format!(
                "identifier must start with `{ARN_SCHEME}:`"
            )));
        }

        let account_id = fields[4];
        if account_id.is_empty() || !account_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::malformed_arn("account id must be numeric"));
        }

        let resource = fields[5];
        let kind = parse_resource(resource)?;

        Ok(Self {
            partition: fields[1].to_string(),
            service: fields[2].to_string(),
            region: fields[3].to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
            kind,
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ARN_SCHEME}:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

impl Serialize for Arn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Arn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Parses the resource path into a [`PrincipalKind`].
///
/// The type/name separator may be `/` or `:`; a resource that mixes the two
/// is rejected rather than guessed at.
fn parse_resource(resource: &str) -> Result<PrincipalKind, AuthError> {
    if resource.is_empty() {
        return Err(AuthError::malformed_arn("resource path is empty"));
    }

    if resource == "root" {
        return Ok(PrincipalKind::Root);
    }

    let Some(sep_idx) = resource.find(['/', ':']) else {
        return Err(AuthError::malformed_arn(format!(
            "unrecognized resource path `{resource}`"
        )));
    };
    // find() only returns positions of ASCII separators, so indexing and
    // slicing at sep_idx stays on a char boundary.
    let sep = resource.as_bytes()[sep_idx] as char;
    let resource_type = &resource[..sep_idx];
    let rest = &resource[sep_idx + 1..];

    match resource_type {
        "assumed-role" => {
            let Some((role_name, session_name)) = rest.split_once(sep) else {
                return Err(AuthError::malformed_arn(
                    "assumed-role resource requires a role name and a session name",
                ));
            };
            if role_name.is_empty() || session_name.is_empty() {
                return Err(AuthError::malformed_arn(
                    "assumed-role resource requires a role name and a session name",
                ));
            }
            Ok(PrincipalKind::AssumedRole {
                role_name: role_name.to_string(),
                session_name: session_name.to_string(),
            })
        }
        "role" => {
            if rest.is_empty() {
                return Err(AuthError::malformed_arn("role resource requires a role name"));
            }
            Ok(PrincipalKind::Role { role_name: rest.to_string() })
        }
        "user" => {
            if rest.is_empty() {
                return Err(AuthError::malformed_arn("user resource requires a user name"));
            }
            Ok(PrincipalKind::User { user_name: rest.to_string() })
        }
        other => Err(AuthError::malformed_arn(format!(
            "unrecognized resource type `{other}`"
        ))),
    }
}
