//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role checks

use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::{AuthUser, UserRole},
    user_store::UserStore,
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Name of the cookie the login endpoint sets.
pub const TOKEN_COOKIE: &str = "token";

/// State the authentication middleware needs
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<UserStore>,
    pub jwt: Arc<JwtHandler>,
}

/// Auth middleware that validates JWT tokens and loads the caller's account
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Authorization header first, then the cookie set by /login
    let token = bearer_token(req.headers())
        .or_else(|| cookie_token(req.headers()))
        .ok_or(AuthError::MissingToken)?;

    let claims = auth.jwt.validate_token(&token).map_err(|e| {
        debug!("Rejected token for {}: {}", req.uri().path(), e);
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Invalid => AuthError::InvalidToken,
        }
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    let user = auth
        .users
        .get_user_by_id(&user_id)
        .map_err(|e| {
            error!("Failed to load user {}: {}", user_id, e);
            AuthError::Internal
        })?
        .ok_or(AuthError::UnknownUser)?;

    if user.blocked {
        warn!("⛔ Blocked user presented a token: {}", user.username);
        return Err(AuthError::Blocked);
    }

    info!("✅ Authenticated: {} ({})", user.username, user.role);

    // Add the principal to request extensions so guards and handlers can access it
    req.extensions_mut().insert(AuthUser::from_user(&user));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Roles allowed through a route group
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    allowed: &'static [UserRole],
}

impl RoleGuard {
    pub const ADMIN: RoleGuard = RoleGuard::new(&[UserRole::Admin]);
    pub const MANUFACTURER: RoleGuard = RoleGuard::new(&[UserRole::Manufacturer]);
    pub const USER: RoleGuard = RoleGuard::new(&[UserRole::User]);
    pub const ADMIN_OR_USER: RoleGuard = RoleGuard::new(&[UserRole::Admin, UserRole::User]);
    pub const ADMIN_OR_MANUFACTURER: RoleGuard =
        RoleGuard::new(&[UserRole::Admin, UserRole::Manufacturer]);
    pub const ANY: RoleGuard =
        RoleGuard::new(&[UserRole::Admin, UserRole::User, UserRole::Manufacturer]);

    pub const fn new(allowed: &'static [UserRole]) -> Self {
        Self { allowed }
    }

    /// Decide whether `user` may pass.
    pub fn check(&self, user: Option<&AuthUser>) -> Result<(), AuthError> {
        let user = user.ok_or(AuthError::NotAuthenticated)?;
        if self.allowed.contains(&user.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                required: self.allowed,
                actual: user.role,
            })
        }
    }
}

/// Role authorization middleware. Must run after [`auth_middleware`].
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = extract_auth_user(&req);
    if let Err(e) = guard.check(user) {
        warn!("Role check failed on {}: {}", req.uri().path(), e.message());
        return Err(e);
    }

    if let Some(user) = user {
        debug!("Role authorized: {} → {}", user.username, user.role);
    }

    Ok(next.run(req).await)
}

/// Extract the authenticated principal from a request
pub fn extract_auth_user(req: &Request) -> Option<&AuthUser> {
    req.extensions().get::<AuthUser>()
}

/// Auth error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    ExpiredToken,
    InvalidToken,
    UnknownUser,
    Blocked,
    NotAuthenticated,
    Forbidden {
        required: &'static [UserRole],
        actual: UserRole,
    },
    Internal,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::ExpiredToken
            | AuthError::InvalidToken
            | AuthError::UnknownUser
            | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Blocked | AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::MissingToken => "Access denied. No token provided.".to_string(),
            AuthError::ExpiredToken => "Session expired. Please log in again.".to_string(),
            AuthError::InvalidToken => "Unauthorized access. Invalid token.".to_string(),
            AuthError::UnknownUser => "Invalid user token.".to_string(),
            AuthError::Blocked => "Your account is blocked by the admin.".to_string(),
            AuthError::NotAuthenticated => {
                "Access denied. User not authenticated.".to_string()
            }
            AuthError::Forbidden { required, actual } => {
                let roles: Vec<&str> = required.iter().map(UserRole::as_str).collect();
                format!(
                    "Access denied. Requires role: [{}], but your role is '{}'.",
                    roles.join(", "),
                    actual
                )
            }
            AuthError::Internal => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{Claims, Gender, NewUser, User};
    use crate::db;
    use axum::{
        body::{to_bytes, Body},
        http::Request as HttpRequest,
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn auth_state() -> AuthState {
        let users = UserStore::with_hash_cost(db::open_in_memory().unwrap(), 4 /* bcrypt minimum cost */)
            .unwrap();
        AuthState {
            users: Arc::new(users),
            jwt: Arc::new(JwtHandler::new("middleware-test-secret".to_string())),
        }
    }

    fn add_user(state: &AuthState, username: &str, role: UserRole) -> User {
        state
            .users
            .create_user(&NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: "password123".to_string(),
                gender: Gender::Other,
                first_name: "F".to_string(),
                last_name: "L".to_string(),
                role,
            })
            .unwrap()
    }

    fn app(state: AuthState, guard: RoleGuard) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Extension(user): Extension<AuthUser>| async move { user.username }),
            )
            .route_layer(from_fn_with_state(guard, require_roles))
            .route_layer(from_fn_with_state(state, auth_middleware))
    }

    async fn call(app: Router, req: HttpRequest<Body>) -> (StatusCode, String) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_with(header: (&str, String)) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/whoami")
            .header(header.0, header.1)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let state = auth_state();
        let req = HttpRequest::builder().uri("/whoami").body(Body::empty()).unwrap();
        let (status, body) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("No token provided"));
    }

    #[tokio::test]
    async fn test_bearer_token_authenticates() {
        let state = auth_state();
        let user = add_user(&state, "buyer", UserRole::User);
        let (token, _) = state.jwt.generate_token(&user).unwrap();

        let req = get_with(("Authorization", format!("Bearer {}", token)));
        let (status, body) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "buyer");
    }

    #[tokio::test]
    async fn test_cookie_token_is_fallback() {
        let state = auth_state();
        let user = add_user(&state, "cookie", UserRole::Manufacturer);
        let (token, _) = state.jwt.generate_token(&user).unwrap();

        let req = get_with(("Cookie", format!("theme=dark; token={}", token)));
        let (status, body) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "cookie");
    }

    #[tokio::test]
    async fn test_garbage_token_is_401() {
        let state = auth_state();
        let req = get_with(("Authorization", "Bearer not.a.jwt".to_string()));
        let (status, body) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid token"));
    }

    #[tokio::test]
    async fn test_expired_token_is_401() {
        let state = auth_state();
        let user = add_user(&state, "stale", UserRole::User);
        let issued = (chrono::Utc::now().timestamp() - 7200) as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: issued,
            exp: issued + 3600,
        };
        let token = state.jwt.encode_claims(&claims).unwrap();

        let req = get_with(("Authorization", format!("Bearer {}", token)));
        let (status, body) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"message":"Session expired. Please log in again."}"#);
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_401() {
        let state = auth_state();
        let user = add_user(&state, "ghost", UserRole::User);
        let (token, _) = state.jwt.generate_token(&user).unwrap();
        state.users.delete_user(&user.id).unwrap();

        let req = get_with(("Authorization", format!("Bearer {}", token)));
        let (status, body) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid user token"));
    }

    #[tokio::test]
    async fn test_blocked_user_is_403() {
        let state = auth_state();
        let user = add_user(&state, "blocked", UserRole::User);
        let (token, _) = state.jwt.generate_token(&user).unwrap();
        state.users.toggle_blocked(&user.id).unwrap();

        let req = get_with(("Authorization", format!("Bearer {}", token)));
        let (status, _) = call(app(state, RoleGuard::ANY), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_guard_uses_stored_role() {
        let state = auth_state();
        let user = add_user(&state, "climber", UserRole::User);
        let (token, _) = state.jwt.generate_token(&user).unwrap();

        let req = get_with(("Authorization", format!("Bearer {}", token.clone())));
        let (status, body) = call(app(state.clone(), RoleGuard::ADMIN), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("Requires role: [admin], but your role is 'user'"));

        // Promotion takes effect without a new token
        state.users.set_role(&user.id, UserRole::Admin).unwrap();
        let req = get_with(("Authorization", format!("Bearer {}", token)));
        let (status, _) = call(app(state, RoleGuard::ADMIN), req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_role_guard_check() {
        let principal = AuthUser {
            id: Uuid::new_v4(),
            username: "mill".to_string(),
            email: "mill@example.com".to_string(),
            role: UserRole::Manufacturer,
        };

        assert_eq!(
            RoleGuard::ADMIN.check(None),
            Err(AuthError::NotAuthenticated)
        );
        assert!(RoleGuard::ADMIN_OR_MANUFACTURER.check(Some(&principal)).is_ok());
        assert!(RoleGuard::ANY.check(Some(&principal)).is_ok());

        let err = RoleGuard::ADMIN_OR_USER.check(Some(&principal)).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.message(),
            "Access denied. Requires role: [admin, user], but your role is 'manufacturer'."
        );
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(AuthError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UnknownUser.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Blocked.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::ExpiredToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_extract_auth_user_from_request() {
        let mut req = HttpRequest::new(Body::empty());
        assert!(extract_auth_user(&req).is_none());

        req.extensions_mut().insert(AuthUser {
            id: Uuid::new_v4(),
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            role: UserRole::User,
        });
        assert_eq!(extract_auth_user(&req).unwrap().username, "test");
    }
}
