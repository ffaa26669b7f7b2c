//! API server configuration.

use panel_client::ClientConfig;
use panel_client::config::join_url;
use panel_core::endpoints::BACKEND_REFRESH_PATH;
use panel_core::locale::{DEFAULT_LOCALE, DEFAULT_SUPPORTED_LOCALES};
use thiserror::Error;
use url::Url;

/// Backend used when `BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("Invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// Base URL of the catalog backend.
    pub backend_url: Url,
    /// `ocp-apim-subscription-key` sent with every backend call, if set.
    pub subscription_key: Option<String>,
    /// Locale codes the panel serves.
    pub supported_locales: Vec<String>,
    /// Locale used when a request names none.
    pub default_locale: String,
    /// Upper bound for a single backend call.
    pub backend_timeout_secs: u64,
    /// Largest request body the relay will buffer.
    pub max_body_bytes: usize,
    /// Take the client address from `x-forwarded-for` / `x-real-ip`. Only
    /// safe when a proxy in front of the panel overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl ApiConfig {
    /// Config for `backend_url` with defaults everywhere else.
    pub fn new(backend_url: Url) -> Self {
        Self {
            bind_addr: "127.0.0.1:3200".into(),
            backend_url,
            subscription_key: None,
            supported_locales: DEFAULT_SUPPORTED_LOCALES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_locale: DEFAULT_LOCALE.into(),
            backend_timeout_secs: 30,
            max_body_bytes: 25 * 1024 * 1024,
            trust_proxy_headers: false,
        }
    }

    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable              | Default                   |
    /// |-----------------------|---------------------------|
    /// | `BIND_ADDR`           | `127.0.0.1:3200`          |
    /// | `BACKEND_URL`         | `http://127.0.0.1:8000/`  |
    /// | `SUBSCRIPTION_KEY`    | unset                     |
    /// | `SUPPORTED_LOCALES`   | `en,ar`                   |
    /// | `DEFAULT_LOCALE`      | `en`                      |
    /// | `BACKEND_TIMEOUT_SECS`| `30`                      |
    /// | `TRUST_PROXY_HEADERS` | `false`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());
        let backend_url = Url::parse(&backend).map_err(|source| ConfigError::InvalidUrl {
            var: "BACKEND_URL",
            source,
        })?;
        let mut config = Self::new(backend_url);

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.subscription_key = std::env::var("SUBSCRIPTION_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Ok(locales) = std::env::var("SUPPORTED_LOCALES") {
            config.supported_locales = parse_locales(&locales);
        }
        if let Ok(locale) = std::env::var("DEFAULT_LOCALE") {
            config.default_locale = locale.trim().to_string();
        }
        if let Ok(secs) = std::env::var("BACKEND_TIMEOUT_SECS") {
            config.backend_timeout_secs =
                secs.trim().parse().map_err(|e| ConfigError::Invalid {
                    var: "BACKEND_TIMEOUT_SECS",
                    message: format!("{e}"),
                })?;
        }
        if let Ok(flag) = std::env::var("TRUST_PROXY_HEADERS") {
            config.trust_proxy_headers = parse_flag(&flag).ok_or_else(|| ConfigError::Invalid {
                var: "TRUST_PROXY_HEADERS",
                message: format!("expected true or false, got '{flag}'"),
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_locales.is_empty() {
            return Err(ConfigError::Invalid {
                var: "SUPPORTED_LOCALES",
                message: "at least one locale is required".into(),
            });
        }
        if !self.supported_locales.contains(&self.default_locale) {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_LOCALE",
                message: format!("'{}' is not a supported locale", self.default_locale),
            });
        }
        Ok(())
    }

    /// Absolute backend URL for `path`.
    pub fn backend_endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        join_url(&self.backend_url, path)
    }

    /// Gateway config for server-side calls straight to the backend.
    pub fn backend_client_config(&self) -> Result<ClientConfig, url::ParseError> {
        Ok(ClientConfig {
            base_url: self.backend_url.clone(),
            refresh_url: self.backend_endpoint(BACKEND_REFRESH_PATH)?,
            subscription_key: self.subscription_key.clone(),
            supported_locales: self.supported_locales.clone(),
            default_locale: self.default_locale.clone(),
        })
    }

    pub fn is_supported_locale(&self, locale: &str) -> bool {
        self.supported_locales.iter().any(|l| l == locale)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_locales(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
