//! Single entry point for backend calls from either side of the panel.
//!
//! Browser-side calls go through [`AuthClient`] and its refresh handling.
//! Server-side calls reuse the access token from the inbound request's
//! cookies and never refresh; refresh is a separate server action.

use cookie::Cookie;
use panel_core::cookies::ACCESS_TOKEN_COOKIE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::client::AuthClient;
use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::request::{Credentials, FetchOptions, build_request};

/// Server-side transport: fixed credentials taken from request cookies.
#[derive(Debug, Clone)]
pub struct ServerFetcher {
    http: Client,
    config: ClientConfig,
    access_token: Option<String>,
}

impl ServerFetcher {
    pub fn new(http: Client, config: ClientConfig, access_token: Option<String>) -> Self {
        Self {
            http,
            config,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Take the access token from a raw `Cookie` header.
    pub fn from_cookie_header(http: Client, config: ClientConfig, header: Option<&str>) -> Self {
        let token = header.and_then(|h| cookie_value(h, ACCESS_TOKEN_COOKIE));
        Self::new(http, config, token)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub async fn fetch(&self, endpoint: &str, options: FetchOptions) -> Result<Response, FetchError> {
        let credentials = Credentials {
            access_token: self.access_token.clone(),
            cookie_header: None,
        };
        let request = build_request(
            &self.http,
            &self.config,
            endpoint,
            &options,
            true,
            &credentials,
        )?;
        Ok(request.send().await?)
    }
}

/// Find and decode cookie `name` in a `Cookie` header.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse_encoded(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// Backend gateway used by feature code.
#[derive(Debug, Clone)]
pub enum Gateway {
    Client(AuthClient),
    Server(ServerFetcher),
}

impl Gateway {
    pub async fn fetch(&self, endpoint: &str, options: FetchOptions) -> Result<Response, FetchError> {
        match self {
            Gateway::Client(client) => client.authenticated_fetch(endpoint, options).await,
            Gateway::Server(server) => server.fetch(endpoint, options).await,
        }
    }
}

/// Decode a JSON response body. `204 No Content` yields `None` without
/// touching the body.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>, FetchError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    Ok(Some(response.json::<T>().await?))
}
