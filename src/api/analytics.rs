//! Admin analytics endpoints - /api/analytics

use crate::api::error::ApiError;
use crate::auth::models::RecentLogin;
use crate::auth::user_store::RoleCounts;
use crate::catalog::models::ProductListing;
use crate::negotiation::models::NegotiationRecord;
use crate::negotiation::{summarize, NegotiationSummary, SummaryPeriod};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rows shown in the "recent logins" widget
pub const RECENT_LOGIN_LIMIT: usize = 5;

/// One row of the manufacturer statistics table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerStat {
    pub manufacturer_name: String,
    pub fabric_type: String,
    pub count: i64,
}

/// Pair every listed product with how often it was recommended.
///
/// Clients number manufacturers by 1-based position in the flattened
/// product listing, so that position is the key into `counts`.
pub fn manufacturer_stats(
    listing: &[ProductListing],
    counts: &HashMap<i64, i64>,
) -> Vec<ManufacturerStat> {
    listing
        .iter()
        .enumerate()
        .map(|(idx, l)| ManufacturerStat {
            manufacturer_name: l.manufacturer_name.clone(),
            fabric_type: l.product.fabric_type.clone(),
            count: counts.get(&(idx as i64 + 1)).copied().unwrap_or(0),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub period: SummaryPeriod,
}

/// GET /api/analytics/statistics
pub async fn statistics(State(state): State<AppState>) -> Result<Json<RoleCounts>, ApiError> {
    Ok(Json(state.users.count_by_role()?))
}

/// GET /api/analytics/manufacturer-stats
pub async fn manufacturer_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ManufacturerStat>>, ApiError> {
    let listing = state.catalog.list_products()?;
    let counts = state.negotiations.recommendation_counts()?;
    Ok(Json(manufacturer_stats(&listing, &counts)))
}

/// GET /api/analytics/negotiations
pub async fn negotiations(
    State(state): State<AppState>,
) -> Result<Json<Vec<NegotiationRecord>>, ApiError> {
    Ok(Json(state.negotiations.list()?))
}

/// GET /api/analytics/recent-logins
pub async fn recent_logins(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecentLogin>>, ApiError> {
    Ok(Json(state.users.recent_logins(RECENT_LOGIN_LIMIT)?))
}

/// GET /api/analytics/summary?period=daily|weekly
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<NegotiationSummary>, ApiError> {
    Ok(Json(summarize(&state.negotiations, query.period, Utc::now())?))
}
