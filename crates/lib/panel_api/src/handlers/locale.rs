//! Locale switch.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::cookies::locale_cookie;

#[derive(Debug, Deserialize, Serialize)]
pub struct LocaleRequest {
    pub locale: String,
}

/// `POST /locale`: remember the user's locale for a year.
pub async fn set_locale_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LocaleRequest>,
) -> AppResult<(CookieJar, Json<LocaleRequest>)> {
    let locale = body.locale.trim().to_string();
    if !state.config.is_supported_locale(&locale) {
        return Err(AppError::Validation(format!("Unsupported locale: {locale}")));
    }
    Ok((jar.add(locale_cookie(&locale)), Json(LocaleRequest { locale })))
}
