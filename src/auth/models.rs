//! Authentication Models
//! Mission: Define user accounts, roles and token payloads

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Minimum accepted password length for signup and admin resets.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum username length after trimming.
pub const MIN_USERNAME_LEN: usize = 3;

/// User account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String, // bcrypt hash - never serialize
    pub gender: Gender,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub profile_photo: Option<String>,
    pub receive_notifications: bool,
    pub blocked: bool,
    pub last_login: Option<String>,
    pub last_ip: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[default]
    #[serde(rename = "user")]
    User, // Runs negotiations, browses listings
    #[serde(rename = "manufacturer")]
    Manufacturer, // Publishes products
    #[serde(rename = "admin")]
    Admin, // Dashboards, analytics and user management
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Manufacturer => "manufacturer",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(UserRole::User),
            "manufacturer" => Some(UserRole::Manufacturer),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

// Accepts any casing, same as `UserRole::parse`.
impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        UserRole::parse(&raw).ok_or_else(|| {
            de::Error::unknown_variant(&raw, &["user", "manufacturer", "admin"])
        })
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user_id)
    pub username: String,
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize, // expiration timestamp
}

/// Principal attached to a request once the auth middleware has run.
///
/// Built from the stored account, not from the token, so a role change or a
/// deletion is visible on the very next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Fields required to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

/// Signup request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl SignupRequest {
    /// Normalize and validate into a [`NewUser`].
    pub fn into_new_user(self) -> Result<NewUser, &'static str> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_lowercase();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err("Username must be at least 3 characters");
        }
        if !is_plausible_email(&email) {
            return Err("Invalid email address.");
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 8 characters");
        }
        if first_name.is_empty() || last_name.is_empty() {
            return Err("First and last name are required");
        }

        Ok(NewUser {
            username,
            email,
            password: self.password,
            gender: self.gender,
            first_name,
            last_name,
            role: self.role.unwrap_or_default(),
        })
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login / signup response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: usize, // seconds until expiration
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub gender: Gender,
    pub first_name: String,
    pub last_name: String,
    pub profile_photo: Option<String>,
    pub receive_notifications: bool,
    pub blocked: bool,
    pub last_login: Option<String>,
    pub last_ip: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            gender: user.gender,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_photo: user.profile_photo.clone(),
            receive_notifications: user.receive_notifications,
            blocked: user.blocked,
            last_login: user.last_login.clone(),
            last_ip: user.last_ip.clone(),
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub profile_photo: Option<String>,
    pub receive_notifications: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.gender.is_none()
            && self.profile_photo.is_none()
            && self.receive_notifications.is_none()
    }
}

/// Admin panel: change role and/or password
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub new_role: Option<String>,
    pub new_password: Option<String>,
}

/// Admin panel: change role only
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub new_role: String,
}

/// Entry of the per-user activity log
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub action: String,
    pub timestamp: String,
}

/// Row of the "recent logins" admin widget
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentLogin {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub last_login: String,
    pub profile_photo: Option<String>,
}

pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
