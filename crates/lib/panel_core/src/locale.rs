//! Locale resolution for redirects.

/// Locales served when none are configured.
pub const DEFAULT_SUPPORTED_LOCALES: [&str; 2] = ["en", "ar"];
/// Fallback locale.
pub const DEFAULT_LOCALE: &str = "en";

/// Resolve the locale for a request.
///
/// The first path segment wins when it is a supported locale, then the locale
/// cookie, then `default`.
pub fn resolve_locale(
    path: &str,
    cookie: Option<&str>,
    supported: &[String],
    default: &str,
) -> String {
    let is_supported = |candidate: &str| supported.iter().any(|l| l == candidate);

    let first_segment = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .find(|s| !s.is_empty());
    if let Some(segment) = first_segment
        && is_supported(segment)
    {
        return segment.to_string();
    }
    if let Some(cookie) = cookie.map(str::trim)
        && is_supported(cookie)
    {
        return cookie.to_string();
    }
    default.to_string()
}

/// Path of the login page for `locale`.
pub fn login_path(locale: &str) -> String {
    format!("/{locale}/login")
}
