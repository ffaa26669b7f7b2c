//! Backend relay: forwards `/api/*` calls to the catalog backend.
//!
//! 1. Maps the panel path to a backend path (auth endpoints to the backend's
//!    login/register routes, everything else by dropping the `/api` prefix)
//! 2. Injects the session bearer token and subscription key
//! 3. Forwards the body bytes untouched, so JSON, text and multipart (with its
//!    boundary in `content-type`) all survive
//! 4. Relays status, headers and body back, minus hop-by-hop headers

use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, RawPathParams, State};
use axum::http::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use axum::http::{Extensions, HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::Response;
use panel_core::endpoints::{
    BACKEND_LOGIN_PATH, BACKEND_REGISTER_PATH, SUBSCRIPTION_KEY_HEADER, is_auth_endpoint,
};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::session::SessionToken;

/// Request headers copied to the backend.
const FORWARDED_REQUEST_HEADERS: [HeaderName; 3] = [CONTENT_TYPE, ACCEPT, ACCEPT_LANGUAGE];

/// Response headers that describe the backend hop's framing, not the payload.
const HOP_BY_HOP_HEADERS: [&str; 4] = [
    "content-encoding",
    "transfer-encoding",
    "content-length",
    "connection",
];

/// Where a relayed request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTarget {
    /// Panel-side path, e.g. `/api/products/3`.
    pub path: String,
    /// Backend path relative to the backend base URL, with query string.
    pub backend_path: String,
    /// Auth endpoints skip the session check and bearer injection.
    pub is_auth: bool,
}

/// Resolve the target from the wildcard route parameter, falling back to the
/// raw request URI.
///
/// Paths with `.` or `..` segments, percent-encoded or not, are rejected so a
/// relayed call cannot climb out of the backend base path.
pub fn resolve_target(param: Option<&str>, uri: &Uri) -> AppResult<RelayTarget> {
    let path = match param {
        Some(rest) => format!("/api/{}", rest.trim_start_matches('/')),
        None => uri.path().to_string(),
    };
    if has_dot_segment(&path) {
        return Err(AppError::Validation(format!(
            "Path may not contain dot segments: {path}"
        )));
    }
    let is_auth = is_auth_endpoint(&path);

    let mut backend_path = if is_auth {
        auth_backend_path(&path).to_string()
    } else {
        path.strip_prefix("/api/")
            .unwrap_or_else(|| path.trim_start_matches('/'))
            .to_string()
    };
    if let Some(query) = uri.query() {
        backend_path.push('?');
        backend_path.push_str(query);
    }

    Ok(RelayTarget {
        path,
        backend_path,
        is_auth,
    })
}

fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|raw| {
        let segment = urlencoding::decode(raw).unwrap_or_else(|_| raw.into());
        segment
            .split(['/', '\\'])
            .any(|part| part == "." || part == "..")
    })
}

fn auth_backend_path(path: &str) -> &'static str {
    if path.starts_with("/api/auth/login") {
        BACKEND_LOGIN_PATH
    } else {
        BACKEND_REGISTER_PATH
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// `ANY /api/{*path}`: relay to the backend.
pub async fn relay_handler(
    State(state): State<AppState>,
    params: RawPathParams,
    OriginalUri(uri): OriginalUri,
    method: Method,
    extensions: Extensions,
    headers: HeaderMap,
    body: Body,
) -> AppResult<Response> {
    let param = params
        .iter()
        .find(|(key, _)| *key == "path")
        .map(|(_, value)| value);
    let target = resolve_target(param, &uri)?;
    let url = state.config.backend_endpoint(&target.backend_path)?;
    debug!(%method, path = %target.path, backend = %url, "relaying request");

    let body = match axum::body::to_bytes(body, state.config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %target.path, error = %e, "failed to read request body, relaying without it");
            Bytes::new()
        }
    };

    let mut upstream = state.http.request(method, url);
    for name in &FORWARDED_REQUEST_HEADERS {
        if let Some(value) = headers.get(name) {
            upstream = upstream.header(name.clone(), value.clone());
        }
    }
    if !target.is_auth
        && let Some(SessionToken(token)) = extensions.get::<SessionToken>()
    {
        upstream = upstream.bearer_auth(token);
    }
    if let Some(key) = &state.config.subscription_key {
        upstream = upstream.header(SUBSCRIPTION_KEY_HEADER, key.as_str());
    }
    if !body.is_empty() {
        upstream = upstream.body(body);
    }

    let response = upstream.send().await.inspect_err(|e| {
        warn!(path = %target.path, error = %e, "backend request failed");
    })?;
    relay_response(response)
}

/// Copy the backend response, dropping hop-by-hop headers.
fn relay_response(upstream: reqwest::Response) -> AppResult<Response> {
    let status = upstream.status();
    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name.as_str()) {
            builder = builder.header(name, value);
        }
    }

    let body = if status == StatusCode::NO_CONTENT {
        Body::empty()
    } else {
        Body::from_stream(upstream.bytes_stream())
    };

    builder
        .body(body)
        .map_err(|e| AppError::Relay(format!("Response build failed: {e}")))
}
