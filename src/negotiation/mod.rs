//! Negotiation Module
//! Mission: Proxy buyer negotiations to the MPSO optimizer and keep their history

pub mod client;
pub mod models;
pub mod store;
pub mod summary;

pub use client::{Optimizer, OptimizerClient, OptimizerError};
pub use store::NegotiationStore;
pub use summary::{summarize, NegotiationSummary, SummaryPeriod};
