//! Cookie service: set/clear the session and locale cookies.

use std::time::Duration as StdDuration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use panel_core::cookies::{
    ACCESS_TOKEN_COOKIE, LOCALE_COOKIE, LOCALE_MAX_AGE, REFRESH_TOKEN_COOKIE,
};
use time::Duration;

fn max_age(age: StdDuration) -> Duration {
    Duration::try_from(age).unwrap_or(Duration::MAX)
}

fn base_cookie(name: &'static str, value: String, age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .secure(false)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(age)
        .build()
}

/// Access token cookie.
pub fn access_cookie(token: &str, age: StdDuration) -> Cookie<'static> {
    base_cookie(ACCESS_TOKEN_COOKIE, token.to_string(), max_age(age))
}

/// Refresh token cookie.
pub fn refresh_cookie(token: &str, age: StdDuration) -> Cookie<'static> {
    base_cookie(REFRESH_TOKEN_COOKIE, token.to_string(), max_age(age))
}

/// Locale cookie (1 year).
pub fn locale_cookie(locale: &str) -> Cookie<'static> {
    base_cookie(LOCALE_COOKIE, locale.to_string(), max_age(LOCALE_MAX_AGE))
}

/// Expired access token cookie.
pub fn clear_access_cookie() -> Cookie<'static> {
    base_cookie(ACCESS_TOKEN_COOKIE, String::new(), Duration::ZERO)
}

/// Expired refresh token cookie.
pub fn clear_refresh_cookie() -> Cookie<'static> {
    base_cookie(REFRESH_TOKEN_COOKIE, String::new(), Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use panel_core::cookies::token_max_age;

    use super::*;

    #[test]
    fn token_cookies_follow_remember_me() {
        let short = access_cookie("a", token_max_age(false));
        assert_eq!(short.max_age(), Some(Duration::days(1)));
        let long = refresh_cookie("r", token_max_age(true));
        assert_eq!(long.max_age(), Some(Duration::days(30)));
        assert_eq!(long.name(), REFRESH_TOKEN_COOKIE);
    }

    #[test]
    fn clearing_cookies_expire_immediately() {
        assert_eq!(clear_access_cookie().max_age(), Some(Duration::ZERO));
        assert_eq!(clear_refresh_cookie().value(), "");
    }

    #[test]
    fn locale_cookie_lasts_a_year() {
        assert_eq!(locale_cookie("ar").max_age(), Some(Duration::days(365)));
    }
}
