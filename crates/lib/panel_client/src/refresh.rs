//! Token refresh against the backend.

use panel_core::cookies::{ACCESS_TOKEN_COOKIE, LONG_SESSION_MAX_AGE, REFRESH_TOKEN_COOKIE};
use panel_core::endpoints::SUBSCRIPTION_KEY_HEADER;
use panel_core::models::TokenPair;
use panel_core::session::SessionStore;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::RefreshError;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Exchange `refresh_token` for a new token pair.
pub async fn request_refresh(
    http: &Client,
    refresh_url: &Url,
    subscription_key: Option<&str>,
    refresh_token: &str,
) -> Result<TokenPair, RefreshError> {
    let mut request = http
        .post(refresh_url.clone())
        .json(&RefreshRequest {
            refresh: refresh_token,
        });
    if let Some(key) = subscription_key {
        request = request.header(SUBSCRIPTION_KEY_HEADER, key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %detail, "token refresh rejected");
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| RefreshError::MalformedResponse(e.to_string()))
}

/// Write a fresh token pair back to the store with the long-lived policy.
///
/// The refresh cookie is only rewritten when the backend rotated it.
pub fn store_tokens(store: &dyn SessionStore, tokens: &TokenPair) {
    store.set(ACCESS_TOKEN_COOKIE, &tokens.access, LONG_SESSION_MAX_AGE);
    if let Some(refresh) = tokens.refresh.as_deref().filter(|r| !r.is_empty()) {
        store.set(REFRESH_TOKEN_COOKIE, refresh, LONG_SESSION_MAX_AGE);
    }
}

/// Refresh the session held in `store`.
///
/// Fails without any network call when there is no usable refresh token.
pub async fn refresh_tokens(
    http: &Client,
    config: &ClientConfig,
    store: &dyn SessionStore,
) -> Result<TokenPair, RefreshError> {
    let refresh_token = store
        .get(REFRESH_TOKEN_COOKIE)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(RefreshError::MissingRefreshToken)?;

    debug!(url = %config.refresh_url, "refreshing access token");
    let tokens = request_refresh(
        http,
        &config.refresh_url,
        config.subscription_key.as_deref(),
        &refresh_token,
    )
    .await?;
    store_tokens(store, &tokens);
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use panel_core::session::MemorySessionStore;

    use super::*;

    #[test]
    fn store_tokens_keeps_refresh_when_not_rotated() {
        let store = MemorySessionStore::new();
        store.set(REFRESH_TOKEN_COOKIE, "r1", Duration::from_secs(60));
        store_tokens(
            &store,
            &TokenPair {
                access: "a2".into(),
                refresh: None,
            },
        );
        assert_eq!(store.get(ACCESS_TOKEN_COOKIE).as_deref(), Some("a2"));
        assert_eq!(store.get(REFRESH_TOKEN_COOKIE).as_deref(), Some("r1"));
    }

    #[test]
    fn store_tokens_rotates_refresh() {
        let store = MemorySessionStore::new();
        store_tokens(
            &store,
            &TokenPair {
                access: "a2".into(),
                refresh: Some("r2".into()),
            },
        );
        assert_eq!(store.get(REFRESH_TOKEN_COOKIE).as_deref(), Some("r2"));
    }
}
