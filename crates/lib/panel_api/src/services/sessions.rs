//! In-memory registry of signed-in sessions, keyed by refresh token.
//!
//! Each entry lives as long as its refresh cookie. Expired entries are hidden
//! from lookups and evicted by [`SessionRegistry::cleanup`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use panel_core::models::Session;

/// How often the background task evicts expired sessions.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Entry {
    session: Session,
    expires_at: Instant,
}

impl Entry {
    fn new(session: Session, ttl: Duration) -> Self {
        Self {
            session,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Sessions created by sign-in and rotated on every refresh.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Entry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` under `refresh_token` for `ttl`.
    pub fn insert(&self, refresh_token: &str, session: Session, ttl: Duration) {
        self.sessions
            .insert(refresh_token.to_string(), Entry::new(session, ttl));
    }

    /// Live session for `refresh_token`, if any.
    pub fn get(&self, refresh_token: &str) -> Option<Session> {
        let entry = self.sessions.get(refresh_token)?;
        entry
            .is_live(Instant::now())
            .then(|| entry.session.clone())
    }

    pub fn remove(&self, refresh_token: &str) -> Option<Session> {
        let (_, entry) = self.sessions.remove(refresh_token)?;
        entry.is_live(Instant::now()).then_some(entry.session)
    }

    /// Move a live session to its new refresh token, record the renewal and
    /// extend it by `ttl`.
    pub fn rotate(
        &self,
        old: &str,
        new: &str,
        ip: Option<&str>,
        ttl: Duration,
    ) -> Option<Session> {
        let mut session = self.remove(old)?;
        session.renew(ip);
        self.insert(new, session.clone(), ttl);
        Some(session)
    }

    /// Evict expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.sessions.retain(|_, entry| entry.is_live(now));
    }

    /// Spawn a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                registry.cleanup();
            }
        })
    }

    /// Number of stored entries, expired ones included until cleanup runs.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use panel_core::models::SessionUser;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn session(ip: &str) -> Session {
        Session::new(
            SessionUser {
                id: "u1".into(),
                email: None,
                name: None,
                ip_address: Some(ip.into()),
                roles: vec![],
            },
            false,
        )
    }

    #[test]
    fn rotate_moves_and_renews() {
        let registry = SessionRegistry::new();
        registry.insert("r1", session("10.0.0.1"), HOUR);
        let rotated = registry
            .rotate("r1", "r2", Some("10.0.0.2"), HOUR)
            .unwrap();
        assert_eq!(rotated.user.ip_address.as_deref(), Some("10.0.0.2"));
        assert!(registry.get("r1").is_none());
        assert!(registry.get("r2").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rotate_unknown_token_is_none() {
        let registry = SessionRegistry::new();
        assert!(registry.rotate("missing", "r2", None, HOUR).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn expired_sessions_are_hidden_and_evicted() {
        let registry = SessionRegistry::new();
        registry.insert("fresh", session("10.0.0.1"), HOUR);
        registry.insert("stale", session("10.0.0.1"), Duration::ZERO);

        assert!(registry.get("stale").is_none());
        assert!(registry.rotate("stale", "r2", None, HOUR).is_none());
        registry.insert("stale-2", session("10.0.0.1"), Duration::ZERO);
        assert_eq!(registry.len(), 2);

        registry.cleanup();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("fresh").is_some());
    }

    #[tokio::test]
    async fn spawn_cleanup_task_evicts() {
        let registry = Arc::new(SessionRegistry::new());
        registry.insert("stale", session("10.0.0.1"), Duration::ZERO);
        let handle = registry.spawn_cleanup_task();
        // The first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(registry.is_empty());
        handle.abort();
    }
}
