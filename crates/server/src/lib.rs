pub mod errors;
pub mod metrics;
pub mod routes;
pub mod startup;

pub use routes::AppState;
pub use startup::run;
