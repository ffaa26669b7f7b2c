//! Session middleware: requires an access token cookie on relayed calls.

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use panel_core::cookies::ACCESS_TOKEN_COOKIE;
use panel_core::endpoints::is_auth_endpoint;

use crate::error::AppError;

/// Access token of the signed-in caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Axum middleware: lets auth endpoints through untouched, otherwise requires
/// a non-empty `auth-token` cookie and injects [`SessionToken`].
pub async fn require_session(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_auth_endpoint(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No active session".into()))?;

    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}
