//! Role access evaluation against the user's resolved client address.

use crate::ip::entry_matches;
use crate::models::{Role, SessionUser};

/// Decide whether `user` may operate under `role` from their current address.
///
/// Fails closed when there is no user or no resolved address. A role with
/// restriction disabled, or with an empty whitelist, is open.
pub fn is_valid_ip_for_role(role: &Role, user: Option<&SessionUser>) -> bool {
    let Some(ip) = user
        .and_then(|u| u.ip_address.as_deref())
        .filter(|ip| !ip.is_empty())
    else {
        return false;
    };
    if !role.ip_restriction_enabled {
        return true;
    }
    let ip = ip.trim();
    match role.whitelisted_ip_addresses.as_deref() {
        None | Some([]) => true,
        Some(entries) => entries.iter().any(|entry| entry_matches(entry, ip)),
    }
}

/// Pick the first of the user's roles that their address is allowed to use.
pub fn select_role(user: &SessionUser) -> Option<&Role> {
    user.roles
        .iter()
        .find(|role| is_valid_ip_for_role(role, Some(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(enabled: bool, whitelist: Option<&[&str]>) -> Role {
        Role {
            id: "r1".into(),
            name: None,
            ip_restriction_enabled: enabled,
            whitelisted_ip_addresses: whitelist
                .map(|w| w.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn user(ip: Option<&str>) -> SessionUser {
        SessionUser {
            id: "u1".into(),
            email: None,
            name: None,
            ip_address: ip.map(str::to_string),
            roles: vec![],
        }
    }

    #[test]
    fn no_user_is_denied() {
        assert!(!is_valid_ip_for_role(&role(false, None), None));
        assert!(!is_valid_ip_for_role(&role(true, Some(&["10.0.0.0/8"])), None));
    }

    #[test]
    fn missing_or_empty_ip_is_denied() {
        assert!(!is_valid_ip_for_role(&role(false, None), Some(&user(None))));
        assert!(!is_valid_ip_for_role(&role(false, None), Some(&user(Some("")))));
    }

    #[test]
    fn whitespace_ip_only_fails_an_active_whitelist() {
        let blank = user(Some("  "));
        assert!(is_valid_ip_for_role(&role(false, None), Some(&blank)));
        assert!(is_valid_ip_for_role(&role(true, Some(&[])), Some(&blank)));
        assert!(!is_valid_ip_for_role(&role(true, Some(&["10.0.0.0/8"])), Some(&blank)));
    }

    #[test]
    fn restriction_disabled_ignores_whitelist() {
        let r = role(false, Some(&["10.0.0.1"]));
        assert!(is_valid_ip_for_role(&r, Some(&user(Some("203.0.113.9")))));
    }

    #[test]
    fn empty_whitelist_is_open() {
        let u = user(Some("203.0.113.9"));
        assert!(is_valid_ip_for_role(&role(true, Some(&[])), Some(&u)));
        assert!(is_valid_ip_for_role(&role(true, None), Some(&u)));
    }

    #[test]
    fn cidr_whitelist() {
        let r = role(true, Some(&["192.168.1.0/24"]));
        assert!(is_valid_ip_for_role(&r, Some(&user(Some("192.168.1.100")))));
        assert!(!is_valid_ip_for_role(&r, Some(&user(Some("10.0.0.5")))));
    }

    #[test]
    fn range_whitelist() {
        let r = role(true, Some(&["192.168.1.1-192.168.1.200"]));
        assert!(is_valid_ip_for_role(&r, Some(&user(Some("192.168.1.150")))));
        assert!(!is_valid_ip_for_role(&r, Some(&user(Some("192.168.1.201")))));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let r = role(true, Some(&["garbage", "10.0.0.0/7", "10.0.0.5"]));
        assert!(is_valid_ip_for_role(&r, Some(&user(Some(" 10.0.0.5 ")))));
        let r = role(true, Some(&["garbage"]));
        assert!(!is_valid_ip_for_role(&r, Some(&user(Some("10.0.0.5")))));
    }

    #[test]
    fn select_role_skips_blocked_roles() {
        let mut blocked = role(true, Some(&["10.0.0.0/8"]));
        blocked.id = "blocked".into();
        let mut open = role(false, None);
        open.id = "open".into();
        let mut u = user(Some("192.168.1.4"));
        u.roles = vec![blocked, open];
        assert_eq!(select_role(&u).map(|r| r.id.as_str()), Some("open"));

        u.ip_address = None;
        assert!(select_role(&u).is_none());
    }
}
