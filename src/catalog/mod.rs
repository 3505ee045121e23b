//! Catalog Module
//! Mission: Manufacturer profiles and the fabric products they offer

pub mod models;
pub mod store;

pub use store::CatalogStore;
