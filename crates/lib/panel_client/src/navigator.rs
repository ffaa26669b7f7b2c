//! Page navigation hooks for forced sign-out.

/// Where the user currently is, and how to send them elsewhere.
pub trait Navigator: Send + Sync {
    /// Path of the current page, used to pick the login locale.
    fn current_path(&self) -> String;

    /// Navigate away to `location`.
    fn redirect(&self, location: &str);
}
