//! Client error types.

use thiserror::Error;

/// Why a token refresh did not produce new tokens.
///
/// `Clone` so every caller waiting on a shared refresh sees the same outcome.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Refresh rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Malformed refresh response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by the fetch gateway.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The session could not be recovered. Carries the original 401 response.
    #[error("Unauthorized ({})", .0.status())]
    Unauthorized(Box<reqwest::Response>),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// HTTP status behind this error, when there is one.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            FetchError::Unauthorized(resp) => Some(resp.status()),
            FetchError::Transport(e) => e.status(),
            FetchError::InvalidUrl(_) | FetchError::InvalidRequest(_) => None,
        }
    }
}
