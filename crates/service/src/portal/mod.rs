//! Portal module: domain types, errors and the business service.
//!
//! Handlers call `PortalService`, which validates input, authenticates the caller's
//! secret code and checks admin rights before touching the store.

pub mod domain;
pub mod errors;
pub mod service;

pub use errors::PortalError;
pub use service::PortalService;
