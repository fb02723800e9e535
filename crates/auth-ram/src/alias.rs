//! Display alias derivation for authenticated entities.

use crate::{
    arn::Arn,
    config::{AliasSource, AuthConfig},
    sts::CallerIdentity,
};

/// Derives the display alias for an authenticated entity.
///
/// With [`AliasSource::RoleArn`], the alias is the role name from the
/// caller's identifier — shared by every session of the same role, so the
/// host can correlate them as one logical entity. Identities without a role
/// component (users, the account root) fall back to the verified principal
/// id rather than failing.
///
/// With [`AliasSource::PrincipalId`] (the default), the alias is the
/// verified principal id, unique per underlying account or session.
#[must_use]
pub fn resolve_alias(config: &AuthConfig, principal: &Arn, identity: &CallerIdentity) -> String {
    match config.alias_source {
        AliasSource::RoleArn => principal
            .kind()
            .role_name()
            .map_or_else(|| identity.principal_id.clone(), str::to_string),
        AliasSource::PrincipalId => identity.principal_id.clone(),
    }
}
