//! Shared building blocks for the portal crates: response envelope, logging setup and
//! the optional admin listener.

pub mod types;
pub mod utils;
pub mod admin_http;
