//! # panel_api
//!
//! HTTP surface for the catalog panel: relays `/api/*` calls to the backend
//! with session credentials and hosts the session server actions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{any, get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{health, locale, relay, session};
use crate::services::sessions::SessionRegistry;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Pooled client for backend calls.
    pub http: reqwest::Client,
    /// Signed-in sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Build state with a backend client honoring the configured timeout.
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            config,
            http,
            sessions: Arc::new(SessionRegistry::new()),
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Session actions and locale (no session required up front)
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/session", get(session::current_session_handler))
        .route("/session/login", post(session::login_handler))
        .route("/session/refresh", post(session::refresh_handler))
        .route("/session/logout", post(session::logout_handler))
        .route("/locale", post(locale::set_locale_handler));

    // Backend relay (session required except for auth endpoints)
    let relayed = Router::new()
        .route("/api/{*path}", any(relay::relay_handler))
        .layer(axum::middleware::from_fn(middleware::session::require_session));

    Router::new()
        .merge(public)
        .merge(relayed)
        .layer(cors)
        .with_state(state)
}
