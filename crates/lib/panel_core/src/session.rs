//! Client-held session state.
//!
//! The browser keeps tokens in cookies. [`SessionStore`] abstracts that jar so
//! the fetch gateway can be driven without a real browser.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

/// Cookie-jar style storage for session values.
///
/// Values are stored and returned decoded; encoding for the wire happens where
/// the `Cookie` header is written.
pub trait SessionStore: Send + Sync {
    /// Read a value, `None` if absent or expired.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a value that expires after `max_age`.
    fn set(&self, name: &str, value: &str, max_age: Duration);

    /// Delete a value.
    fn remove(&self, name: &str);
}

/// Remove both token cookies together.
pub fn clear_tokens(store: &dyn SessionStore) {
    store.remove(ACCESS_TOKEN_COOKIE);
    store.remove(REFRESH_TOKEN_COOKIE);
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory cookie jar.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    cookies: DashMap<String, StoredCookie>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, name: &str) -> Option<String> {
        let entry = self.cookies.get(name)?;
        if Utc::now() >= entry.expires_at {
            drop(entry);
            self.cookies.remove(name);
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    fn remove(&self, name: &str) {
        self.cookies.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_roundtrip() {
        let store = MemorySessionStore::new();
        store.set(ACCESS_TOKEN_COOKIE, "a b", Duration::from_secs(60));
        assert_eq!(store.get(ACCESS_TOKEN_COOKIE).as_deref(), Some("a b"));
        store.remove(ACCESS_TOKEN_COOKIE);
        assert!(store.get(ACCESS_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn expired_value_returns_none() {
        let store = MemorySessionStore::new();
        store.set(ACCESS_TOKEN_COOKIE, "a", Duration::ZERO);
        assert!(store.get(ACCESS_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn clear_tokens_removes_both() {
        let store = MemorySessionStore::new();
        store.set(ACCESS_TOKEN_COOKIE, "a", Duration::from_secs(60));
        store.set(REFRESH_TOKEN_COOKIE, "r", Duration::from_secs(60));
        store.set(crate::cookies::LOCALE_COOKIE, "ar", Duration::from_secs(60));
        clear_tokens(&store);
        assert!(store.get(ACCESS_TOKEN_COOKIE).is_none());
        assert!(store.get(REFRESH_TOKEN_COOKIE).is_none());
        assert_eq!(store.get(crate::cookies::LOCALE_COOKIE).as_deref(), Some("ar"));
    }
}
