pub mod analytics;
pub mod error;
pub mod manufacturer;
pub mod negotiation;
pub mod newsletter;
pub mod routes;

pub use error::ApiError;
