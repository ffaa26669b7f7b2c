//! Session cookie names and lifetimes.
//!
//! Both token cookies share one lifetime, chosen by the "remember me" flag
//! at sign-in.

use std::time::Duration;

/// Cookie holding the bearer access token.
pub const ACCESS_TOKEN_COOKIE: &str = "auth-token";
/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "auth-refresh-token";
/// Cookie holding the user's chosen locale.
pub const LOCALE_COOKIE: &str = "user-locale";

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Token lifetime without "remember me".
pub const SHORT_SESSION_MAX_AGE: Duration = DAY;
/// Token lifetime with "remember me", also used when tokens are refreshed.
pub const LONG_SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Locale cookie lifetime.
pub const LOCALE_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Token cookie lifetime for the given "remember me" choice.
pub fn token_max_age(remember_me: bool) -> Duration {
    if remember_me {
        LONG_SESSION_MAX_AGE
    } else {
        SHORT_SESSION_MAX_AGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_me_picks_long_lifetime() {
        assert_eq!(token_max_age(false), Duration::from_secs(86_400));
        assert_eq!(token_max_age(true), Duration::from_secs(30 * 86_400));
    }
}
