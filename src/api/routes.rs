//! REST API routes
//!
//! Routers are grouped by access tier. Every protected tier runs
//! `auth_middleware` first, then its `RoleGuard`.

use crate::api::{analytics, manufacturer, negotiation, newsletter};
use crate::auth::{api as users, auth_middleware, require_roles, AuthState, RoleGuard};
use crate::middleware::{rate_limit_middleware, request_logging, RateLimitLayer};
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete application router
pub fn create_router(state: AppState, login_limiter: RateLimitLayer) -> Router {
    let auth_state = AuthState::from_ref(&state);

    // Credential endpoints, throttled per client IP
    let credential_routes = Router::new()
        .route("/api/users/signup", post(users::signup))
        .route("/api/users/login", post(users::login))
        .route_layer(from_fn_with_state(login_limiter, rate_limit_middleware));

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/users/logout", post(users::logout))
        .route("/api/manufacturer/test", get(manufacturer::probe))
        .route("/api/newsletter/subscribe", post(newsletter::subscribe))
        .merge(credential_routes);

    // Any signed-in account
    let account_routes = Router::new()
        .route("/api/users/meta/login", put(users::login_meta))
        .route("/api/users/checkAuth", get(users::check_auth))
        .route("/api/users/users/:userId", get(users::get_user_by_id))
        .route("/api/users/users/:userId/activity", get(users::user_activity))
        .route("/api/users/profile/:userId", put(users::update_profile))
        .route("/api/users/dashboard", get(users::dashboard))
        .route("/api/manufacturer/products", get(manufacturer::list_products))
        .route_layer(from_fn_with_state(RoleGuard::ANY, require_roles))
        .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/api/users/admin", get(users::admin_welcome))
        .route("/api/users/users", get(users::list_users))
        .route("/api/users/all", get(users::list_users))
        .route("/api/users/users/:userId", delete(users::delete_user))
        .route("/api/users/delete/:userId", delete(users::delete_user))
        .route("/api/users/admin/update-user/:userId", put(users::admin_update_user))
        .route("/api/users/admin/update-role/:userId", put(users::update_role))
        .route("/api/users/toggle-block/:userId", put(users::toggle_block))
        .route("/api/analytics/statistics", get(analytics::statistics))
        .route(
            "/api/analytics/manufacturer-stats",
            get(analytics::manufacturer_stats_handler),
        )
        .route("/api/analytics/negotiations", get(analytics::negotiations))
        .route("/api/analytics/recent-logins", get(analytics::recent_logins))
        .route("/api/analytics/summary", get(analytics::summary))
        .route_layer(from_fn_with_state(RoleGuard::ADMIN, require_roles))
        .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware));

    let manufacturer_routes = Router::new()
        .route("/api/manufacturer/product", post(manufacturer::add_product))
        .route("/api/manufacturer/my-products", get(manufacturer::my_products))
        .route_layer(from_fn_with_state(RoleGuard::MANUFACTURER, require_roles))
        .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware));

    let buyer_routes = Router::new()
        .route("/api/negotiation", post(negotiation::run_negotiation))
        .route("/api/negotiation/run", post(negotiation::run_comparison))
        .route_layer(from_fn_with_state(RoleGuard::USER, require_roles))
        .route_layer(from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(admin_routes)
        .merge(manufacturer_routes)
        .merge(buyer_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
}
