//! Textile Negotiation Backend Library
//!
//! Exposes the stores, services and router for the server binary and the
//! integration tests.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod middleware;
pub mod negotiation;
pub mod newsletter;
pub mod state;

pub use api::routes::create_router;
pub use config::Config;
pub use state::AppState;
