//! Backend paths, shared headers and auth endpoint classification.

/// Backend token refresh endpoint, relative to the backend base URL.
pub const BACKEND_REFRESH_PATH: &str = "token/refresh/";
/// Backend login endpoint.
pub const BACKEND_LOGIN_PATH: &str = "login/";
/// Backend registration endpoint.
pub const BACKEND_REGISTER_PATH: &str = "register/";

/// API gateway subscription key header.
pub const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";

/// Path prefixes of endpoints that never carry a bearer token and skip
/// session checks.
pub const AUTH_ENDPOINT_PREFIXES: [&str; 4] = [
    "/api/auth/login",
    "/api/auth/sign-up",
    "/api/auth/signup",
    "/api/auth/register",
];

/// Whether `path` (optionally with a query string or full URL) is an auth
/// endpoint.
pub fn is_auth_endpoint(path: &str) -> bool {
    let path = strip_origin(path);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    AUTH_ENDPOINT_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

fn strip_origin(path: &str) -> &str {
    match path.find("://") {
        Some(scheme_end) => {
            let rest = &path[scheme_end + 3..];
            rest.find('/').map_or("/", |i| &rest[i..])
        }
        None => path,
    }
}
