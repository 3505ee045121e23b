//! Manufacturer endpoints - /api/manufacturer

use crate::api::error::ApiError;
use crate::auth::models::AuthUser;
use crate::catalog::models::AddProductRequest;
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

/// POST /api/manufacturer/product (manufacturer)
pub async fn add_product(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<AddProductRequest>,
) -> Result<Json<Value>, ApiError> {
    let product = payload.to_product().ok_or_else(|| {
        warn!("Rejected product from {}: missing fields", caller.username);
        ApiError::BadRequest("Missing required product fields.".to_string())
    })?;

    let added = state
        .catalog
        .add_product(&caller.id, payload.manufacturer_name(), &product)?;

    info!(
        "🧵 {} listed {} ({} products)",
        added.manufacturer_name, product.fabric_type, added.total_products
    );

    Ok(Json(json!({
        "message": "Product added successfully",
        "product": product,
        "totalProducts": added.total_products,
    })))
}

/// GET /api/manufacturer/products (any role)
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let products = state.catalog.list_products()?;
    if products.is_empty() {
        return Ok(Json(json!({
            "message": "No products available.",
            "products": [],
        })));
    }
    Ok(Json(json!({ "products": products })))
}

/// GET /api/manufacturer/my-products (manufacturer)
pub async fn my_products(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let manufacturer = state
        .catalog
        .get_for_user(&caller.id)?
        .ok_or_else(|| ApiError::NotFound("Manufacturer profile not found.".to_string()))?;

    Ok(Json(json!({
        "manufacturerName": manufacturer.manufacturer_name,
        "products": manufacturer.products,
    })))
}

/// GET /api/manufacturer/test
pub async fn probe() -> Json<Value> {
    Json(json!({ "message": "Manufacturer routes are working" }))
}
