//! Session server actions: sign-in, refresh, lookup and sign-out.
//!
//! Sign-in and refresh set the token cookies and resolve the caller's address
//! so the session's role can be chosen against each role's IP whitelist.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::{Extensions, HeaderMap, Method, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use panel_client::refresh::request_refresh;
use panel_client::{FetchOptions, Gateway, RefreshError, RequestBody, ServerFetcher, read_json};
use panel_core::cookies::{LONG_SESSION_MAX_AGE, REFRESH_TOKEN_COOKIE, token_max_age};
use panel_core::endpoints::{BACKEND_LOGIN_PATH, BACKEND_REFRESH_PATH};
use panel_core::models::{LoginResponse, Session, SessionUser};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::client_ip::client_ip;
use crate::services::cookies::{
    access_cookie, clear_access_cookie, clear_refresh_cookie, refresh_cookie,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Serialize)]
struct BackendCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// `None` when the token refreshed but no session was registered for it.
    pub session: Option<Session>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

fn refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn end_session(jar: CookieJar) -> CookieJar {
    jar.add(clear_access_cookie()).add(clear_refresh_cookie())
}

/// `POST /session/login`: sign in against the backend and start a session.
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<Session>)> {
    let gateway = Gateway::Server(ServerFetcher::new(
        state.http.clone(),
        state.config.backend_client_config()?,
        None,
    ));
    let credentials = RequestBody::json(&BackendCredentials {
        email: &body.email,
        password: &body.password,
    })?;
    let response = gateway
        .fetch(
            BACKEND_LOGIN_PATH,
            FetchOptions::new(Method::POST).with_body(credentials),
        )
        .await?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "backend rejected sign-in");
        return Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::Unauthorized("Invalid credentials".into())
            }
            _ => AppError::Backend {
                status: status.as_u16(),
                detail,
            },
        });
    }

    let login: LoginResponse = read_json(response)
        .await?
        .ok_or_else(|| AppError::Relay("Backend returned an empty sign-in response".into()))?;
    let refresh = login
        .tokens
        .refresh
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::Relay("Backend returned no refresh token".into()))?;

    let mut user = login.user.unwrap_or_else(|| SessionUser {
        id: body.email.clone(),
        email: Some(body.email.clone()),
        name: None,
        ip_address: None,
        roles: Vec::new(),
    });
    user.ip_address = client_ip(
        &headers,
        peer_addr(&extensions),
        state.config.trust_proxy_headers,
    );

    let session = Session::new(user, body.remember_me);
    info!(
        user = %session.user.id,
        ip = ?session.user.ip_address,
        role = ?session.active_role,
        "signed in"
    );
    let age = token_max_age(body.remember_me);
    state.sessions.insert(&refresh, session.clone(), age);

    let jar = jar
        .add(access_cookie(&login.tokens.access, age))
        .add(refresh_cookie(&refresh, age));
    Ok((jar, Json(session)))
}

/// Tokens and session produced by a successful server-side refresh.
struct Renewed {
    access: String,
    refresh: String,
    session: Option<Session>,
}

/// `POST /session/refresh`: renew tokens from the refresh cookie.
///
/// Any failure clears both token cookies.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), (CookieJar, AppError)> {
    match renew_session(&state, &headers, &extensions, &jar).await {
        Ok(renewed) => {
            let jar = jar
                .add(access_cookie(&renewed.access, LONG_SESSION_MAX_AGE))
                .add(refresh_cookie(&renewed.refresh, LONG_SESSION_MAX_AGE));
            Ok((jar, Json(RefreshResponse { session: renewed.session })))
        }
        Err(e) => Err((end_session(jar), e)),
    }
}

async fn renew_session(
    state: &AppState,
    headers: &HeaderMap,
    extensions: &Extensions,
    jar: &CookieJar,
) -> AppResult<Renewed> {
    let old = refresh_token(jar).ok_or(RefreshError::MissingRefreshToken)?;
    let url = state.config.backend_endpoint(BACKEND_REFRESH_PATH)?;

    let tokens = request_refresh(
        &state.http,
        &url,
        state.config.subscription_key.as_deref(),
        &old,
    )
    .await
    .inspect_err(|e| {
        warn!(error = %e, "server-side refresh failed");
        state.sessions.remove(&old);
    })?;

    let refresh = tokens
        .refresh
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| old.clone());
    let ip = client_ip(
        headers,
        peer_addr(extensions),
        state.config.trust_proxy_headers,
    );
    let session = state
        .sessions
        .rotate(&old, &refresh, ip.as_deref(), LONG_SESSION_MAX_AGE);
    info!(known_session = session.is_some(), "session refreshed");

    Ok(Renewed {
        access: tokens.access,
        refresh,
        session,
    })
}

/// `GET /session`: the session behind the refresh cookie.
pub async fn current_session_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<Session>> {
    refresh_token(&jar)
        .and_then(|token| state.sessions.get(&token))
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("No active session".into()))
}

/// `POST /session/logout`: forget the session and clear both token cookies.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    if let Some(token) = refresh_token(&jar)
        && let Some(session) = state.sessions.remove(&token)
    {
        info!(user = %session.user.id, "signed out");
    }
    (end_session(jar), Json(LogoutResponse { success: true }))
}
