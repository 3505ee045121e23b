//! Authentication API Endpoints
//! Mission: Signup, login and user management endpoints under /api/users

use crate::auth::{
    middleware::TOKEN_COOKIE,
    models::{
        ActivityEntry, AdminUpdateUserRequest, AuthUser, LoginRequest, LoginResponse,
        ProfileUpdate, SignupRequest, UpdateRoleRequest, User, UserResponse, UserRole,
        MIN_PASSWORD_LEN,
    },
    user_store::{UserConflict, UserStore},
};
use crate::middleware::rate_limit::client_ip;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Signup endpoint - POST /api/users/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>), AuthApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!("Malformed signup body: {}", e.body_text());
        AuthApiError::MissingFields
    })?;

    if payload.role == Some(UserRole::Admin) {
        warn!("⛔ Admin self-registration attempt: {}", payload.email);
        return Err(AuthApiError::AdminSignupForbidden);
    }

    let new_user = payload
        .into_new_user()
        .map_err(|msg| AuthApiError::BadRequest(msg.to_string()))?;

    if let Some(field) = state
        .users
        .find_conflict(&new_user.username, &new_user.email)
        .map_err(internal)?
    {
        return Err(AuthApiError::Conflict(field));
    }

    let user = state.users.create_user(&new_user).map_err(|e| {
        match e.downcast_ref::<UserConflict>().copied() {
            Some(conflict) => AuthApiError::Conflict(conflict.field),
            None => internal(e),
        }
    })?;
    let (token, expires_in) = state.jwt.generate_token(&user).map_err(internal)?;

    info!("✅ Signup: {} ({})", user.username, user.role);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            expires_in,
            user: UserResponse::from_user(&user),
        }),
    ))
}

/// Login endpoint - POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthApiError> {
    let Json(payload) = payload.map_err(|_| AuthApiError::MissingFields)?;
    let email = payload.email.trim().to_lowercase();
    info!("🔐 Login attempt: {}", email);

    let user = state
        .users
        .get_user_by_email(&email)
        .map_err(internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    if user.blocked {
        warn!("⛔ Blocked user tried to log in: {}", user.username);
        return Err(AuthApiError::Blocked);
    }

    if !UserStore::check_password(&user, &payload.password).map_err(internal)? {
        warn!("❌ Failed login attempt: {}", email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let (token, expires_in) = state.jwt.generate_token(&user).map_err(internal)?;

    let ip = client_ip(connect_info.as_ref().map(|c| &c.0), &headers).to_string();
    state.users.record_login(&user.id, Some(ip.as_str())).map_err(internal)?;
    let user = reload(&state, user)?;

    info!("✅ Login successful: {} ({})", user.username, user.role);

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.cookie_secure);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            expires_in,
            user: UserResponse::from_user(&user),
        }),
    ))
}

/// Logout endpoint - POST /api/users/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/"));
    (jar, Json(json!({ "message": "Logout successful" })))
}

/// Record login metadata for the caller - PUT /api/users/meta/login
pub async fn login_meta(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthApiError> {
    let ip = client_ip(connect_info.as_ref().map(|c| &c.0), &headers).to_string();
    if !state.users.record_login(&caller.id, Some(ip.as_str())).map_err(internal)? {
        return Err(AuthApiError::UserNotFound);
    }
    Ok(Json(json!({ "message": "Login metadata updated" })))
}

/// Current session - GET /api/users/checkAuth
pub async fn check_auth(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, AuthApiError> {
    let user = load_user(&state, &caller.id)?;
    Ok(Json(json!({ "user": UserResponse::from_user(&user) })))
}

/// GET /api/users/users/:userId
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;
    let user = load_user(&state, &user_id)?;
    Ok(Json(UserResponse::from_user(&user)))
}

/// Activity log of a user - GET /api/users/users/:userId/activity (self or admin)
pub async fn user_activity(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ActivityEntry>>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;
    if caller.id != user_id && !caller.is_admin() {
        return Err(AuthApiError::NotOwner);
    }
    load_user(&state, &user_id)?;

    let entries = state.users.activity_log(&user_id).map_err(internal)?;
    Ok(Json(entries))
}

/// PUT /api/users/profile/:userId (self or admin)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;
    if caller.id != user_id && !caller.is_admin() {
        warn!("{} tried to edit another profile", caller.username);
        return Err(AuthApiError::NotOwner);
    }
    if update.is_empty() {
        return Err(AuthApiError::BadRequest("No profile fields to update".to_string()));
    }

    let user = state
        .users
        .update_profile(&user_id, &update)
        .map_err(internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    info!("📝 Profile updated: {}", user.username);

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserResponse::from_user(&user),
    })))
}

/// GET /api/users/users and /api/users/all (admin)
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AuthApiError> {
    let users = state.users.list_users().map_err(internal)?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// DELETE /api/users/users/:userId and /api/users/delete/:id (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;

    // Don't allow deleting yourself
    if user_id == caller.id {
        return Err(AuthApiError::CannotDeleteSelf);
    }

    if !state.users.delete_user(&user_id).map_err(internal)? {
        return Err(AuthApiError::UserNotFound);
    }
    if state.catalog.delete_for_user(&user_id).map_err(internal)? {
        info!("🏭 Removed manufacturer profile of {}", user_id);
    }

    info!("🗑️  User deleted by {}: {}", caller.username, user_id);

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// PUT /api/users/admin/update-user/:id (admin)
///
/// An unrecognized role is ignored; a weak password rejects the whole request.
pub async fn admin_update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<Value>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;
    load_user(&state, &user_id)?;

    if let Some(password) = payload.new_password.as_deref() {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthApiError::WeakPassword);
        }
    }

    match payload.new_role.as_deref().map(UserRole::parse) {
        Some(Some(role)) => {
            state.users.set_role(&user_id, role).map_err(internal)?;
        }
        Some(None) => warn!("Ignoring unknown role for {}", user_id),
        None => {}
    }

    if let Some(password) = payload.new_password.as_deref() {
        state.users.set_password(&user_id, password).map_err(internal)?;
        info!("🔑 Password reset by admin for {}", user_id);
    }

    let user = load_user(&state, &user_id)?;
    Ok(Json(json!({
        "message": "User updated successfully",
        "user": UserResponse::from_user(&user),
    })))
}

/// PUT /api/users/admin/update-role/:id (admin)
pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<Value>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;
    let role = UserRole::parse(&payload.new_role).ok_or(AuthApiError::InvalidRole)?;

    if !state.users.set_role(&user_id, role).map_err(internal)? {
        return Err(AuthApiError::UserNotFound);
    }

    let user = load_user(&state, &user_id)?;
    Ok(Json(json!({
        "message": "User role updated successfully",
        "user": UserResponse::from_user(&user),
    })))
}

/// PUT /api/users/toggle-block/:id (admin)
pub async fn toggle_block(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AuthApiError> {
    let user_id = parse_user_id(&user_id)?;
    if user_id == caller.id {
        return Err(AuthApiError::CannotBlockSelf);
    }

    let blocked = state
        .users
        .toggle_blocked(&user_id)
        .map_err(internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(json!({ "success": true, "blocked": blocked })))
}

/// GET /api/users/admin (admin)
pub async fn admin_welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome, Admin!" }))
}

/// GET /api/users/dashboard (any role)
pub async fn dashboard(Extension(caller): Extension<AuthUser>) -> Json<Value> {
    Json(json!({ "message": format!("Welcome to the Dashboard, {}!", caller.role) }))
}

fn parse_user_id(raw: &str) -> Result<Uuid, AuthApiError> {
    Uuid::parse_str(raw).map_err(|_| AuthApiError::InvalidUserId)
}

fn load_user(state: &AppState, user_id: &Uuid) -> Result<User, AuthApiError> {
    state
        .users
        .get_user_by_id(user_id)
        .map_err(internal)?
        .ok_or(AuthApiError::UserNotFound)
}

fn reload(state: &AppState, user: User) -> Result<User, AuthApiError> {
    Ok(state.users.get_user_by_id(&user.id).map_err(internal)?.unwrap_or(user))
}

fn internal(e: anyhow::Error) -> AuthApiError {
    error!("Auth API failure: {:#}", e);
    AuthApiError::InternalError
}

/// Auth API errors
#[derive(Debug, PartialEq, Eq)]
pub enum AuthApiError {
    MissingFields,
    BadRequest(String),
    AdminSignupForbidden,
    Conflict(&'static str),
    UserNotFound,
    Blocked,
    InvalidCredentials,
    NotOwner,
    WeakPassword,
    InvalidRole,
    InvalidUserId,
    CannotDeleteSelf,
    CannotBlockSelf,
    InternalError,
}

impl AuthApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthApiError::MissingFields
            | AuthApiError::BadRequest(_)
            | AuthApiError::Conflict(_)
            | AuthApiError::WeakPassword
            | AuthApiError::InvalidRole
            | AuthApiError::InvalidUserId
            | AuthApiError::CannotDeleteSelf
            | AuthApiError::CannotBlockSelf => StatusCode::BAD_REQUEST,
            AuthApiError::AdminSignupForbidden
            | AuthApiError::Blocked
            | AuthApiError::NotOwner => StatusCode::FORBIDDEN,
            AuthApiError::UserNotFound => StatusCode::NOT_FOUND,
            AuthApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthApiError::MissingFields => "All fields are required.".to_string(),
            AuthApiError::BadRequest(msg) => msg.clone(),
            AuthApiError::AdminSignupForbidden => {
                "Admin accounts cannot be created through signup.".to_string()
            }
            AuthApiError::Conflict(field) => format!("User with this {} already exists.", field),
            AuthApiError::UserNotFound => "User not found".to_string(),
            AuthApiError::Blocked => "Your account is blocked by the admin.".to_string(),
            AuthApiError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthApiError::NotOwner => "You can only modify your own profile.".to_string(),
            AuthApiError::WeakPassword => {
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN)
            }
            AuthApiError::InvalidRole => "Invalid role".to_string(),
            AuthApiError::InvalidUserId => "Invalid user ID format".to_string(),
            AuthApiError::CannotDeleteSelf => "Cannot delete your own account".to_string(),
            AuthApiError::CannotBlockSelf => "Cannot block your own account".to_string(),
            AuthApiError::InternalError => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}
