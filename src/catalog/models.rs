//! Catalog Models
//! Mission: Describe manufacturers and the fabric products they list

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name given to a manufacturer that never supplied one.
pub const DEFAULT_MANUFACTURER_NAME: &str = "Unnamed Manufacturer";

/// Fabric quality tiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Quality {
    Economy,
    Standard,
    Premium,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Economy => "Economy",
            Quality::Standard => "Standard",
            Quality::Premium => "Premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Economy" => Some(Quality::Economy),
            "Standard" => Some(Quality::Standard),
            "Premium" => Some(Quality::Premium),
            _ => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opening offer a manufacturer publishes for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialOffer {
    pub price: f64,
    pub delivery: u32, // days
    pub quality: Quality,
}

/// A product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub fabric_type: String,
    pub qualities: Vec<Quality>,
    pub min_price: f64,
    pub min_delivery: u32,
    pub initial_offer: InitialOffer,
}

/// A manufacturer profile, one per manufacturer account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub manufacturer_name: String,
    pub products: Vec<Product>,
    pub created_at: String,
    pub updated_at: String,
}

/// Product flattened together with its manufacturer's name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub manufacturer_name: String,
    #[serde(flatten)]
    pub product: Product,
}

/// Add-product request body. Everything is optional so that missing fields
/// produce one validation message instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    pub manufacturer_name: Option<String>,
    pub fabric_type: Option<String>,
    pub qualities: Option<Vec<Quality>>,
    pub min_price: Option<f64>,
    pub min_delivery: Option<u32>,
    pub initial_offer: Option<InitialOfferInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InitialOfferInput {
    pub price: Option<f64>,
    pub delivery: Option<u32>,
    pub quality: Option<Quality>,
}

impl AddProductRequest {
    /// Trimmed manufacturer name, when one was supplied.
    pub fn manufacturer_name(&self) -> Option<&str> {
        self.manufacturer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Validate into a [`Product`]. `None` means a required field is missing
    /// or out of range.
    pub fn to_product(&self) -> Option<Product> {
        let fabric_type = self.fabric_type.as_deref().map(str::trim)?;
        if fabric_type.is_empty() {
            return None;
        }

        let mut qualities: Vec<Quality> = Vec::new();
        for q in self.qualities.as_deref()? {
            if !qualities.contains(q) {
                qualities.push(*q);
            }
        }
        if qualities.is_empty() {
            return None;
        }

        let min_price = self.min_price.filter(|p| p.is_finite() && *p >= 0.0)?;
        let min_delivery = self.min_delivery.filter(|d| *d >= 1)?;

        let offer = self.initial_offer.as_ref()?;
        let price = offer.price.filter(|p| p.is_finite() && *p > 0.0)?;
        let delivery = offer.delivery.filter(|d| *d >= 1)?;
        let quality = offer.quality?;

        Some(Product {
            fabric_type: fabric_type.to_string(),
            qualities,
            min_price,
            min_delivery,
            initial_offer: InitialOffer {
                price,
                delivery,
                quality,
            },
        })
    }
}
