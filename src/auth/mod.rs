//! Authentication Module
//! Mission: Secure API access with JWT tokens, RBAC, and account management

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, require_roles, AuthState, RoleGuard};
pub use user_store::UserStore;
