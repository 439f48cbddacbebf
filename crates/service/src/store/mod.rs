//! In-memory account and complaint storage
//!
//! One `parking_lot::RwLock` guards every map and both id counters, so readers
//! never observe a complaint that is only partly inserted or resolved.

pub mod memory;
pub mod token;

pub use memory::{Store, StoreStats, MAX_TOKEN_ATTEMPTS};
pub use token::{RandomTokens, TokenSource};
