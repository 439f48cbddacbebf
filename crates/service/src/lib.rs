//! Service layer for the complaint portal.
//! - `store` holds every account and complaint behind a single reader/writer lock.
//! - `portal` validates requests, authenticates secret codes and checks admin rights.
//! - Both layers are independent of the web framework.

pub mod errors;
pub mod portal;
pub mod store;

pub use portal::PortalService;
pub use store::Store;
