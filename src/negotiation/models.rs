//! Negotiation Models
//! Mission: Typed contract with the external optimizer plus stored history

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Buyer preferences forwarded to the optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub fabric_type: String,
    pub quantity: u32,
    pub price_range: i64,
    pub quality_preference: String,
    pub delivery_timeline: i64,
}

/// Price / delivery / quality triple as the optimizer speaks it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub price: f64,
    pub delivery: i64,
    pub quality: String,
}

/// One manufacturer taking part in a negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerOffer {
    pub id: i64,
    pub initial_offer: OfferTerms,
    pub min_price: i64,
    pub min_delivery: i64,
    pub qualities: Vec<String>,
    pub max_quality_cost: f64,
    pub delivery_capacity: i64,
}

/// Relative weight of each side in the fitness function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub user: f64,
    pub manufacturer: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            user: 0.5,
            manufacturer: 0.5,
        }
    }
}

/// Body of `POST /api/negotiation`, forwarded to the optimizer's `/optimize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRequest {
    pub user: UserPreferences,
    pub manufacturers: Vec<ManufacturerOffer>,
    #[serde(default)]
    pub weights: Weights,
}

impl NegotiationRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.manufacturers.is_empty() {
            return Err("At least one manufacturer offer is required");
        }
        if self.user.quantity == 0 {
            return Err("Quantity must be positive");
        }
        let w = &self.weights;
        if !(w.user.is_finite() && w.manufacturer.is_finite()) || w.user < 0.0 || w.manufacturer < 0.0
        {
            return Err("Weights must be non-negative numbers");
        }
        Ok(())
    }
}

/// Best offer the optimizer found for one manufacturer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedOffer {
    #[serde(rename = "manufacturerID")]
    pub manufacturer_id: i64,
    pub optimized_offer: OfferTerms,
    pub fitness: f64,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub round_history: Value,
}

/// Optimizer answer, offers sorted by fitness descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub recommended: OptimizedOffer,
    #[serde(default)]
    pub rejected: Vec<OptimizedOffer>,
    #[serde(default)]
    pub all_results: Vec<OptimizedOffer>,
}

fn default_algorithms() -> Vec<String> {
    vec!["PSO".to_string(), "GA".to_string(), "ABC".to_string()]
}

/// Body of `POST /api/negotiation/run`: multi-algorithm comparison.
///
/// Offers are passed through untouched; only the algorithm list is defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRequest {
    pub user_offer: Value,
    pub manufacturer_offers: Value,
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<String>,
}

/// Recommendation kept in the negotiation history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub optimized_offer: OfferTerms,
    pub fitness: f64,
    #[serde(rename = "manufacturerID")]
    pub manufacturer_id: i64,
}

/// Stored negotiation outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRecord {
    pub id: i64,
    pub username: String,
    pub date: String,
    pub recommended: Recommendation,
}
