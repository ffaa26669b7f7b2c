//! # panel_core
//!
//! Core domain logic for the catalog panel: IP whitelist matching, role access
//! decisions, session cookies and locale handling.

pub mod access;
pub mod cookies;
pub mod endpoints;
pub mod ip;
pub mod locale;
pub mod models;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
