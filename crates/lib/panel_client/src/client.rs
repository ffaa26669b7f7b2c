//! Browser-side authenticated fetch with single-flight token refresh.
//!
//! A 401 from a non-auth endpoint triggers one refresh. Concurrent 401s share
//! the refresh already in flight instead of starting their own, so a rotated
//! refresh token is never replayed. The original request is retried once; if
//! that fails too the user is sent to the login page.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use panel_core::cookies::LOCALE_COOKIE;
use panel_core::endpoints::is_auth_endpoint;
use panel_core::locale::{login_path, resolve_locale};
use panel_core::models::TokenPair;
use panel_core::session::{self, SessionStore};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{FetchError, RefreshError};
use crate::navigator::Navigator;
use crate::refresh;
use crate::request::{Credentials, FetchOptions, build_request};

type SharedRefresh = Shared<BoxFuture<'static, Result<TokenPair, RefreshError>>>;

/// Authenticated HTTP client for browser-held sessions.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    /// Refresh currently in flight, shared by every caller that hit a 401.
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl Inner {
    fn in_flight(&self) -> MutexGuard<'_, Option<SharedRefresh>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_http(Client::new(), config, store, navigator)
    }

    /// Build on an existing `reqwest::Client` (shared connection pool).
    pub fn with_http(
        http: Client,
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                store,
                navigator,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Send a request with session credentials, refreshing once on 401.
    ///
    /// Any response other than a 401 is returned as is, error statuses
    /// included. A 401 that survives the refresh, or a failed refresh,
    /// redirects to login and returns [`FetchError::Unauthorized`] holding the
    /// original response.
    pub async fn authenticated_fetch(
        &self,
        endpoint: &str,
        options: FetchOptions,
    ) -> Result<Response, FetchError> {
        let response = self.send(endpoint, &options, true).await?;
        if response.status() != StatusCode::UNAUTHORIZED || is_auth_endpoint(endpoint) {
            return Ok(response);
        }

        debug!(endpoint, "received 401, refreshing session");
        if let Err(e) = self.refresh_session().await {
            warn!(endpoint, error = %e, "session refresh failed");
            session::clear_tokens(self.inner.store.as_ref());
            self.redirect_to_login();
            return Err(FetchError::Unauthorized(Box::new(response)));
        }

        let retried = self.send(endpoint, &options, false).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "request still unauthorized after refresh");
            self.redirect_to_login();
            return Err(FetchError::Unauthorized(Box::new(response)));
        }
        Ok(retried)
    }

    /// Refresh the access token, joining a refresh already in flight.
    ///
    /// The in-flight slot is cleared when the refresh settles, whether it
    /// succeeded or not, so the next 401 starts a new one.
    pub async fn refresh_session(&self) -> Result<TokenPair, RefreshError> {
        let pending = {
            let mut slot = self.inner.in_flight();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight session refresh");
                    pending.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let pending = async move {
                        let result =
                            refresh::refresh_tokens(&inner.http, &inner.config, inner.store.as_ref())
                                .await;
                        inner.in_flight().take();
                        if result.is_ok() {
                            info!("session refreshed");
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Whether a refresh is currently in flight.
    pub fn refresh_in_flight(&self) -> bool {
        self.inner.in_flight().is_some()
    }

    async fn send(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        caller_headers: bool,
    ) -> Result<Response, FetchError> {
        let credentials = Credentials::from_store(self.inner.store.as_ref());
        let request = build_request(
            &self.inner.http,
            &self.inner.config,
            endpoint,
            options,
            caller_headers,
            &credentials,
        )?;
        Ok(request.send().await?)
    }

    fn redirect_to_login(&self) {
        let config = &self.inner.config;
        let locale = resolve_locale(
            &self.inner.navigator.current_path(),
            self.inner.store.get(LOCALE_COOKIE).as_deref(),
            &config.supported_locales,
            &config.default_locale,
        );
        self.inner.navigator.redirect(&login_path(&locale));
    }
}
