//! Request handlers.

pub mod health;
pub mod locale;
pub mod relay;
pub mod session;
