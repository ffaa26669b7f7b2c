//! # panel_client
//!
//! Authenticated fetch gateway for the catalog panel backend, with
//! single-flight token refresh and login redirect on unrecoverable 401s.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod navigator;
pub mod refresh;
pub mod request;

pub use body::{MultipartBody, RequestBody};
pub use client::AuthClient;
pub use config::ClientConfig;
pub use error::{FetchError, RefreshError};
pub use gateway::{Gateway, ServerFetcher, read_json};
pub use navigator::Navigator;
pub use request::FetchOptions;
