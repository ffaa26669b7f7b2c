//! Session and token domain models.
//!
//! Wire names follow the backend's JSON (camelCase for roles and users).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::select_role;

/// An access scope a user may operate under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When `false` the whitelist is ignored.
    #[serde(default)]
    pub ip_restriction_enabled: bool,
    /// Exact addresses, CIDR blocks or ranges. Empty or absent means open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelisted_ip_addresses: Option<Vec<String>>,
}

/// The user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Client address resolved at sign-in or the last refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Token pair returned by the backend login and refresh endpoints.
///
/// Accepts both `{access, refresh}` and `{access_token, refresh_token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(default, alias = "refresh_token", skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Backend `/login/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// Server-side view of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    /// Id of the role auto-selected for this session, if any passed the IP check.
    pub active_role: Option<String>,
    pub remember_me: bool,
    pub issued_at: DateTime<Utc>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Start a session and auto-select the first role the user's address allows.
    pub fn new(user: SessionUser, remember_me: bool) -> Self {
        let active_role = select_role(&user).map(|r| r.id.clone());
        Self {
            user,
            active_role,
            remember_me,
            issued_at: Utc::now(),
            refreshed_at: None,
        }
    }

    /// Record a token renewal from `ip`.
    ///
    /// When the address changed it is stored and the role re-selected.
    /// Returns whether the address changed.
    pub fn renew(&mut self, ip: Option<&str>) -> bool {
        self.refreshed_at = Some(Utc::now());
        let ip = ip.map(str::trim).filter(|ip| !ip.is_empty());
        let changed = match ip {
            Some(ip) => self.user.ip_address.as_deref() != Some(ip),
            None => false,
        };
        if changed {
            self.user.ip_address = ip.map(str::to_string);
            self.active_role = select_role(&self.user).map(|r| r.id.clone());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restricted_user(ip: &str) -> SessionUser {
        SessionUser {
            id: "u1".into(),
            email: None,
            name: None,
            ip_address: Some(ip.into()),
            roles: vec![Role {
                id: "office".into(),
                name: None,
                ip_restriction_enabled: true,
                whitelisted_ip_addresses: Some(vec!["10.0.0.0/8".into()]),
            }],
        }
    }

    #[test]
    fn new_session_selects_allowed_role() {
        assert_eq!(
            Session::new(restricted_user("10.1.1.1"), false).active_role.as_deref(),
            Some("office")
        );
        assert!(Session::new(restricted_user("192.0.2.1"), true).active_role.is_none());
    }

    #[test]
    fn renew_updates_changed_address() {
        let mut session = Session::new(restricted_user("10.1.1.1"), false);
        assert!(session.renew(Some("192.0.2.1")));
        assert_eq!(session.user.ip_address.as_deref(), Some("192.0.2.1"));
        assert!(session.active_role.is_none());
        assert!(session.refreshed_at.is_some());
    }

    #[test]
    fn renew_without_address_keeps_previous() {
        let mut session = Session::new(restricted_user("10.1.1.1"), false);
        assert!(!session.renew(None));
        assert!(!session.renew(Some("10.1.1.1")));
        assert_eq!(session.active_role.as_deref(), Some("office"));
    }

    #[test]
    fn token_pair_accepts_short_names() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"access":"a1","refresh":"r1"}"#).unwrap();
        assert_eq!(pair.access, "a1");
        assert_eq!(pair.refresh.as_deref(), Some("r1"));
    }

    #[test]
    fn token_pair_accepts_oauth_names() {
        let pair: TokenPair = serde_json::from_str(r#"{"access_token":"a2"}"#).unwrap();
        assert_eq!(pair.access, "a2");
        assert!(pair.refresh.is_none());
    }

    #[test]
    fn role_reads_camel_case() {
        let role: Role = serde_json::from_str(
            r#"{"id":"admin","ipRestrictionEnabled":true,"whitelistedIpAddresses":["10.0.0.0/8"]}"#,
        )
        .unwrap();
        assert!(role.ip_restriction_enabled);
        assert_eq!(
            role.whitelisted_ip_addresses,
            Some(vec!["10.0.0.0/8".to_string()])
        );
    }

    #[test]
    fn login_response_flattens_tokens() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","user":{"id":"u1","roles":[]}}"#,
        )
        .unwrap();
        assert_eq!(resp.tokens.access, "a");
        assert_eq!(resp.user.map(|u| u.id), Some("u1".to_string()));
    }
}
