//! Outbound request assembly shared by the client and server transports.

use cookie::Cookie;
use panel_core::cookies::{ACCESS_TOKEN_COOKIE, LOCALE_COOKIE, REFRESH_TOKEN_COOKIE};
use panel_core::endpoints::{SUBSCRIPTION_KEY_HEADER, is_auth_endpoint};
use panel_core::session::SessionStore;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};

use crate::body::RequestBody;
use crate::config::ClientConfig;
use crate::error::FetchError;

/// Caller-supplied request options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Credentials attached to one outbound request.
#[derive(Debug, Default)]
pub(crate) struct Credentials {
    pub access_token: Option<String>,
    pub cookie_header: Option<String>,
}

impl Credentials {
    /// Read the access token and cookie header from a session store.
    pub fn from_store(store: &dyn SessionStore) -> Self {
        Self {
            access_token: store.get(ACCESS_TOKEN_COOKIE).filter(|t| !t.trim().is_empty()),
            cookie_header: cookie_header(store),
        }
    }
}

/// `Cookie` header value for the session cookies present in `store`.
pub fn cookie_header(store: &dyn SessionStore) -> Option<String> {
    let pairs: Vec<String> = [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, LOCALE_COOKIE]
        .into_iter()
        .filter_map(|name| {
            store
                .get(name)
                .map(|value| Cookie::new(name, value).encoded().to_string())
        })
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

/// Build a request for `endpoint`.
///
/// Auth endpoints never get a bearer token, even one the caller supplied.
/// Session cookies and the bearer only go to the panel and backend origins.
/// `caller_headers` is `false` on the post-refresh retry so only freshly read
/// credentials are sent.
pub(crate) fn build_request(
    http: &Client,
    config: &ClientConfig,
    endpoint: &str,
    options: &FetchOptions,
    caller_headers: bool,
    credentials: &Credentials,
) -> Result<RequestBuilder, FetchError> {
    let url = config.endpoint_url(endpoint)?;
    let mut headers = if caller_headers {
        options.headers.clone()
    } else {
        HeaderMap::new()
    };
    options.body.normalize_headers(&mut headers);
    let credentialed = config.allows_credentials(&url);

    if is_auth_endpoint(endpoint) {
        headers.remove(AUTHORIZATION);
    } else if credentialed && let Some(token) = &credentials.access_token {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
    }
    if let Some(key) = &config.subscription_key {
        headers.insert(SUBSCRIPTION_KEY_HEADER, header_value(key)?);
    }
    if credentialed && let Some(cookie) = &credentials.cookie_header {
        headers.insert(COOKIE, header_value(cookie)?);
    }

    let builder = http
        .request(options.method.clone(), url)
        .headers(headers);
    options.body.attach(builder)
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchError::InvalidRequest(format!("invalid header value: {e}")))
}
