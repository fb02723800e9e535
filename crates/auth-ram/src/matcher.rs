//! Role binding selection for verified identities.
//!
//! Given the parsed identifier of a verified caller and the configured role
//! bindings, this module decides which binding (if any) admits the caller:
//!
//! 1. A role-assumed identity is admitted by a binding whose identifier
//!    names the same `(account id, role name)`. The session name is ignored
//!    — every session of a role maps to that role's one binding.
//! 2. Any other identity is admitted only by a binding whose identifier
//!    names exactly the same `(account id, resource kind, resource name)`.
//! 3. No admitting binding means no access. There is no fallback.
//!
//! Bindings are evaluated in the order given; callers pass them in the
//! store's enumeration order (lexicographic by name), which makes the
//! first-match-wins tie-break deterministic when an identity is admitted by
//! more than one binding.

use crate::{
    arn::{Arn, PrincipalKind},
    role::RoleBinding,
};

/// Whether a binding admits the given verified identity.
#[must_use]
pub fn binding_admits(binding: &RoleBinding, principal: &Arn) -> bool {
    if binding.arn.account_id() != principal.account_id() {
        return false;
    }

    match principal.kind() {
        // Sessions are per-caller; only the role identity matters.
        PrincipalKind::AssumedRole { role_name, .. } => {
            binding.arn.kind().role_name() == Some(role_name.as_str())
        }
        primary => binding.arn.kind() == primary,
    }
}

/// Selects the first binding that admits the identity, or `None`.
///
/// Evaluation order is the order of `bindings`; ties between multiple
/// admitting bindings resolve to the earliest one.
#[must_use]
pub fn select_binding<'a>(principal: &Arn, bindings: &'a [RoleBinding]) -> Option<&'a RoleBinding> {
    bindings.iter().find(|binding| binding_admits(binding, principal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn binding_for(name: &str, arn: &str) -> RoleBinding {
        RoleBinding::builder()
            .name(name)
            .arn(arn.parse().unwrap())
            .policies(vec![format!("{name}-policy")])
            .ttl(Duration::from_secs(600))
            .max_ttl(Duration::from_secs(3600))
            .build()
    }

    fn parse(arn: &str) -> Arn {
        arn.parse().unwrap()
    }

    #[test]
    fn test_sessions_of_a_role_share_one_binding() {
        let binding = binding_for("deploy", "acs:aliyun:ram::5138828231865461:role/deploy");

        let session_a = parse("acs:aliyun:sts::5138828231865461:assumed-role/deploy/vm-01");
        let session_b = parse("acs:aliyun:sts::5138828231865461:assumed-role/deploy/vm-02");

        assert!(binding_admits(&binding, &session_a));
        assert!(binding_admits(&binding, &session_b));
    }

    #[test]
    fn test_assumed_role_binding_also_admits_sessions() {
        let binding =
            binding_for("deploy", "acs:aliyun:sts::5138828231865461:assumed-role/deploy/any");

        let session = parse("acs:aliyun:sts::5138828231865461:assumed-role/deploy/vm-77");
        assert!(binding_admits(&binding, &session));
    }

    #[test]
    fn test_assumed_role_requires_same_account() {
        let binding = binding_for("deploy", "acs:aliyun:ram::1111:role/deploy");

        let session = parse("acs:aliyun:sts::2222:assumed-role/deploy/vm-01");
        assert!(!binding_admits(&binding, &session));
    }

    #[test]
    fn test_assumed_role_requires_same_role_name() {
        let binding = binding_for("deploy", "acs:aliyun:ram::1111:role/deploy");

        let session = parse("acs:aliyun:sts::1111:assumed-role/other/vm-01");
        assert!(!binding_admits(&binding, &session));
    }

    #[test]
    fn test_user_binding_does_not_admit_role_sessions() {
        let binding = binding_for("alice", "acs:aliyun:ram::1111:user/deploy");

        let session = parse("acs:aliyun:sts::1111:assumed-role/deploy/vm-01");
        assert!(!binding_admits(&binding, &session));
    }

    #[test]
    fn test_primary_identity_matches_exactly() {
        let binding = binding_for("alice", "acs:aliyun:ram::1111:user/alice");

        assert!(binding_admits(&binding, &parse("acs:aliyun:ram::1111:user/alice")));

        // Changing any one field breaks the match
        assert!(!binding_admits(&binding, &parse("acs:aliyun:ram::2222:user/alice")));
        assert!(!binding_admits(&binding, &parse("acs:aliyun:ram::1111:user/bob")));
        assert!(!binding_admits(&binding, &parse("acs:aliyun:ram::1111:role/alice")));
        assert!(!binding_admits(&binding, &parse("acs:aliyun:ram::1111:root")));
    }

    #[test]
    fn test_root_identity_matches_root_binding() {
        let binding = binding_for("root", "acs:aliyun:ram::1111:root");

        assert!(binding_admits(&binding, &parse("acs:aliyun:ram::1111:root")));
        assert!(!binding_admits(&binding, &parse("acs:aliyun:ram::2222:root")));
    }

    #[test]
    fn test_role_binding_does_not_admit_user_of_same_name() {
        let binding = binding_for("deploy", "acs:aliyun:ram::1111:role/deploy");

        assert!(!binding_admits(&binding, &parse("acs:aliyun:ram::1111:user/deploy")));
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let bindings = vec![
            binding_for("a", "acs:aliyun:ram::1111:role/alpha"),
            binding_for("b", "acs:aliyun:ram::1111:role/beta"),
        ];

        let principal = parse("acs:aliyun:sts::1111:assumed-role/gamma/vm-01");
        assert!(select_binding(&principal, &bindings).is_none());
    }

    #[test]
    fn test_first_match_wins_in_given_order() {
        // Two bindings admit the same identity; the earlier one is chosen
        // on every evaluation.
        let bindings = vec![
            binding_for("a", "acs:aliyun:ram::1111:role/deploy"),
            binding_for("b", "acs:aliyun:sts::1111:assumed-role/deploy/any"),
        ];

        let principal = parse("acs:aliyun:sts::1111:assumed-role/deploy/vm-01");

        for _ in 0..10 {
            let selected = select_binding(&principal, &bindings).expect("a binding matches");
            assert_eq!(selected.name, "a");
        }
    }

    #[test]
    fn test_partition_service_region_do_not_gate_role_matching() {
        // The verified session arrives under the token service; the binding
        // names the role under the resource service. Only account and role
        // name participate in the comparison.
        let binding = binding_for("deploy", "acs:aliyun:ram:cn-hangzhou:1111:role/deploy");

        let session = parse("acs:aliyun:sts::1111:assumed-role/deploy/vm-01");
        assert!(binding_admits(&binding, &session));
    }
}
