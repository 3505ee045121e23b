//! Negotiation endpoints - /api/negotiation

use crate::api::error::ApiError;
use crate::auth::models::AuthUser;
use crate::negotiation::models::{ComparisonRequest, NegotiationRequest, OptimizeResponse};
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use serde_json::Value;
use tracing::{info, warn};

/// POST /api/negotiation (user)
///
/// Forwards to the optimizer and records the recommended offer.
pub async fn run_negotiation(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<NegotiationRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    request.validate().map_err(|msg| {
        warn!("Rejected negotiation from {}: {}", caller.username, msg);
        ApiError::BadRequest(msg.to_string())
    })?;

    let response = state.optimizer.optimize(&request).await?;

    let record = state
        .negotiations
        .insert(&caller.username, &response.recommended)?;

    info!(
        "🤝 Negotiation #{} for {}: manufacturer {} at fitness {:.4}",
        record.id, caller.username, response.recommended.manufacturer_id, response.recommended.fitness
    );

    Ok(Json(response))
}

/// POST /api/negotiation/run (user)
pub async fn run_comparison(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<ComparisonRequest>,
) -> Result<Json<Value>, ApiError> {
    info!(
        "📊 Algorithm comparison for {}: {}",
        caller.username,
        request.algorithms.join(", ")
    );
    let result = state.optimizer.run_comparison(&request).await?;
    Ok(Json(result))
}
