//! Services shared by request handlers.

pub mod client_ip;
pub mod cookies;
pub mod sessions;
