//! Newsletter endpoint - /api/newsletter

use crate::api::error::ApiError;
use crate::auth::models::is_plausible_email;
use crate::newsletter::Subscription;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/newsletter/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| is_plausible_email(e))
        .ok_or_else(|| ApiError::BadRequest("Invalid email address.".to_string()))?;

    let (status, message) = match state.newsletter.subscribe(email)? {
        Subscription::Created => (StatusCode::CREATED, "Successfully subscribed."),
        Subscription::AlreadySubscribed => (StatusCode::OK, "Already subscribed."),
    };

    Ok((status, Json(json!({ "message": message }))))
}
