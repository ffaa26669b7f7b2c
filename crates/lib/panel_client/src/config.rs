//! Client configuration.

use panel_core::endpoints::BACKEND_REFRESH_PATH;
use panel_core::locale::{DEFAULT_LOCALE, DEFAULT_SUPPORTED_LOCALES};
use url::Url;

/// Configuration for the fetch gateway.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Origin that relative endpoints are resolved against.
    pub base_url: Url,
    /// Backend token refresh endpoint.
    pub refresh_url: Url,
    /// Value for the `ocp-apim-subscription-key` header, if required.
    pub subscription_key: Option<String>,
    /// Locales recognized in paths and the locale cookie.
    pub supported_locales: Vec<String>,
    /// Locale used when nothing else matches.
    pub default_locale: String,
}

impl ClientConfig {
    /// Config with the refresh endpoint under `backend_url` and default locales.
    pub fn new(base_url: Url, backend_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url,
            refresh_url: join_url(backend_url, BACKEND_REFRESH_PATH)?,
            subscription_key: None,
            supported_locales: DEFAULT_SUPPORTED_LOCALES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_locale: DEFAULT_LOCALE.to_string(),
        })
    }

    /// Set the subscription key.
    pub fn with_subscription_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.subscription_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Resolve an endpoint: absolute URLs pass through, paths join `base_url`.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => join_url(&self.base_url, endpoint),
            Err(e) => Err(e),
        }
    }

    /// Whether requests to `url` may carry session credentials.
    ///
    /// Only the panel origin and the backend origin qualify, matching what a
    /// browser sends with credentials included.
    pub fn allows_credentials(&self, url: &Url) -> bool {
        let origin = url.origin();
        origin == self.base_url.origin() || origin == self.refresh_url.origin()
    }
}

/// Append `path` to `base`, keeping any path prefix already on `base`.
///
/// `Url::join` drops the last base segment without a trailing slash; this
/// treats the base as a directory instead.
pub fn join_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{base}/{path}"))
}
