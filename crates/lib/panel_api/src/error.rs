//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Structured error body.
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Relay failed: {0}")]
    Relay(String),

    #[error("Backend error ({status}): {detail}")]
    Backend { status: u16, detail: String },

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, hint) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone(), None),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone(), None),
            AppError::BackendUnreachable(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "relay_error",
                m.clone(),
                Some("backend_unreachable"),
            ),
            AppError::Relay(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "relay_error",
                m.clone(),
                Some("relay_failed"),
            ),
            AppError::Backend { status, detail } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "backend_error",
                detail.clone(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
                None,
            ),
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            hint: hint.map(str::to_string),
        });
        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            AppError::BackendUnreachable(format!("Backend request failed: {e}"))
        } else {
            AppError::Relay(format!("Backend request failed: {e}"))
        }
    }
}

impl From<panel_client::FetchError> for AppError {
    fn from(e: panel_client::FetchError) -> Self {
        match e {
            panel_client::FetchError::Transport(e) => AppError::from(e),
            panel_client::FetchError::Unauthorized(resp) => {
                AppError::Unauthorized(format!("Backend returned {}", resp.status()))
            }
            panel_client::FetchError::InvalidUrl(e) => AppError::Internal(e.to_string()),
            panel_client::FetchError::InvalidRequest(m) => AppError::Validation(m),
        }
    }
}

impl From<panel_client::RefreshError> for AppError {
    fn from(e: panel_client::RefreshError) -> Self {
        match e {
            panel_client::RefreshError::Transport(m) => AppError::BackendUnreachable(m),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(e: url::ParseError) -> Self {
        AppError::Internal(format!("invalid backend URL: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_backend_maps_to_500_with_hint() {
        let resp = AppError::BackendUnreachable("connection refused".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn backend_status_is_preserved() {
        let resp = AppError::Backend {
            status: 403,
            detail: "nope".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn refresh_rejection_is_unauthorized() {
        let err = AppError::from(panel_client::RefreshError::MissingRefreshToken);
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
