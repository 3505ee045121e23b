//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{
    ActivityEntry, Gender, NewUser, ProfileUpdate, RecentLogin, User, UserRole,
};
use crate::db::{timestamp_now, SharedConnection};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    gender TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    profile_photo TEXT,
    receive_notifications INTEGER NOT NULL DEFAULT 1,
    blocked INTEGER NOT NULL DEFAULT 0,
    last_login TEXT,
    last_ip TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
CREATE INDEX IF NOT EXISTS idx_users_last_login ON users(last_login DESC);

CREATE TABLE IF NOT EXISTS user_activity (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    action TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_user_activity_user ON user_activity(user_id, id);
"#;

const USER_COLUMNS: &str = "id, username, email, password_hash, gender, first_name, last_name, \
     role, profile_photo, receive_notifications, blocked, last_login, last_ip, \
     created_at, updated_at";

/// Per-role account counts for the admin statistics widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCounts {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_manufacturers: i64,
    pub total_regular_users: i64,
}

/// Signup refused because a unique field is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserConflict {
    pub field: &'static str,
}

impl fmt::Display for UserConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User with this {} already exists.", self.field)
    }
}

impl std::error::Error for UserConflict {}

/// User storage with SQLite backend
pub struct UserStore {
    conn: SharedConnection,
    hash_cost: u32,
}

impl UserStore {
    /// Create a new user store and initialize its tables
    pub fn new(conn: SharedConnection) -> Result<Self> {
        Self::with_hash_cost(conn, DEFAULT_COST)
    }

    /// Same as [`UserStore::new`] with an explicit bcrypt cost.
    pub fn with_hash_cost(conn: SharedConnection, hash_cost: u32) -> Result<Self> {
        conn.lock()
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize user schema")?;
        Ok(Self { conn, hash_cost })
    }

    /// Create an admin account for initial setup unless the email is taken.
    ///
    /// Returns `true` when an account was created.
    pub fn ensure_admin(&self, email: &str, password: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        if self.get_user_by_email(&email)?.is_some() {
            return Ok(false);
        }

        let local = email.split('@').next().unwrap_or_default();
        let mut username = if local.chars().count() >= 3 {
            local.to_string()
        } else {
            "admin".to_string()
        };
        if self.get_user_by_username(&username)?.is_some() {
            username = format!("{}-{}", username, &Uuid::new_v4().simple().to_string()[..6]);
        }

        self.create_user(&NewUser {
            username,
            email,
            password: password.to_string(),
            gender: Gender::Other,
            first_name: "Platform".to_string(),
            last_name: "Admin".to_string(),
            role: UserRole::Admin,
        })?;

        info!("🔐 Bootstrap admin account created");
        Ok(true)
    }

    /// Which unique field (`username` or `email`) an account would clash on.
    pub fn find_conflict(&self, username: &str, email: &str) -> Result<Option<&'static str>> {
        let conn = self.conn.lock();
        conflict_in(&conn, username, email)
    }

    /// Create a new user.
    ///
    /// A taken username or email fails with a [`UserConflict`] inside the
    /// returned error, also when a concurrent signup wins the race.
    pub fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let password_hash =
            hash(&new_user.password, self.hash_cost).context("Failed to hash password")?;
        let now = timestamp_now();

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash,
            gender: new_user.gender,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            role: new_user.role,
            profile_photo: None,
            receive_notifications: true,
            blocked: false,
            last_login: None,
            last_ip: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.conn.lock();
        if let Some(field) = conflict_in(&conn, &user.username, &user.email)? {
            return Err(UserConflict { field }.into());
        }
        let inserted = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, gender, first_name,
                                last_name, role, receive_notifications, blocked,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, 0, ?9, ?10)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.gender.as_str(),
                user.first_name,
                user.last_name,
                user.role.as_str(),
                user.created_at,
                user.updated_at,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                let field = conflict_in(&conn, &user.username, &user.email)?.unwrap_or("username");
                return Err(UserConflict { field }.into());
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert user")),
        }

        info!("✅ Created user: {} ({})", user.username, user.role.as_str());

        Ok(user)
    }

    pub fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock();
        query_user(&conn, "id", &user_id.to_string())
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        query_user(&conn, "email", &email.trim().to_lowercase())
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        query_user(&conn, "username", username)
    }

    /// Check a plaintext password against the stored hash
    pub fn check_password(user: &User, password: &str) -> Result<bool> {
        verify(password, &user.password_hash).context("Failed to verify password")
    }

    /// Verify email and password
    #[cfg(test)]
    pub fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        match self.get_user_by_email(email)? {
            Some(user) => Self::check_password(&user, password),
            None => Ok(false),
        }
    }

    /// List all users, newest first (admin only)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, rowid DESC",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Delete a user by ID. Returns `false` when no such user exists.
    pub fn delete_user(&self, user_id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            params![user_id.to_string()],
        )?;

        if rows_affected > 0 {
            info!("🗑️  Deleted user: {}", user_id);
        }
        Ok(rows_affected > 0)
    }

    /// Apply a partial profile update and return the updated account
    pub fn update_profile(&self, user_id: &Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let Some(mut user) = query_user(&conn, "id", &user_id.to_string())? else {
            return Ok(None);
        };

        if let Some(first_name) = update.first_name.as_deref().map(str::trim) {
            if !first_name.is_empty() {
                user.first_name = first_name.to_string();
            }
        }
        if let Some(last_name) = update.last_name.as_deref().map(str::trim) {
            if !last_name.is_empty() {
                user.last_name = last_name.to_string();
            }
        }
        if let Some(gender) = update.gender {
            user.gender = gender;
        }
        if let Some(photo) = update.profile_photo.as_deref().map(str::trim) {
            user.profile_photo = (!photo.is_empty()).then(|| photo.to_string());
        }
        if let Some(receive) = update.receive_notifications {
            user.receive_notifications = receive;
        }
        user.updated_at = timestamp_now();

        conn.execute(
            "UPDATE users SET first_name = ?2, last_name = ?3, gender = ?4, profile_photo = ?5,
                              receive_notifications = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                user.id.to_string(),
                user.first_name,
                user.last_name,
                user.gender.as_str(),
                user.profile_photo,
                user.receive_notifications,
                user.updated_at,
            ],
        )
        .context("Failed to update profile")?;

        Ok(Some(user))
    }

    pub fn set_role(&self, user_id: &Uuid, role: UserRole) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE users SET role = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id.to_string(), role.as_str(), timestamp_now()],
        )?;
        if rows > 0 {
            info!("🔁 Role of {} set to {}", user_id, role);
        }
        Ok(rows > 0)
    }

    pub fn set_password(&self, user_id: &Uuid, password: &str) -> Result<bool> {
        let password_hash = hash(password, self.hash_cost).context("Failed to hash password")?;
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id.to_string(), password_hash, timestamp_now()],
        )?;
        Ok(rows > 0)
    }

    /// Flip the blocked flag. Returns the new value, or `None` for an unknown user.
    pub fn toggle_blocked(&self, user_id: &Uuid) -> Result<Option<bool>> {
        let conn = self.conn.lock();
        let blocked: Option<bool> = conn
            .query_row(
                "UPDATE users SET blocked = NOT blocked, updated_at = ?2
                 WHERE id = ?1 RETURNING blocked",
                params![user_id.to_string(), timestamp_now()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(blocked) = blocked {
            if blocked {
                warn!("⛔ User blocked: {}", user_id);
            } else {
                info!("✅ User unblocked: {}", user_id);
            }
        }
        Ok(blocked)
    }

    /// Stamp last_login / last_ip and append a "Login" activity entry
    pub fn record_login(&self, user_id: &Uuid, ip: Option<&str>) -> Result<bool> {
        let mut conn = self.conn.lock();
        let now = timestamp_now();
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE users SET last_login = ?2, last_ip = COALESCE(?3, last_ip) WHERE id = ?1",
            params![user_id.to_string(), now, ip],
        )?;
        if rows > 0 {
            tx.execute(
                "INSERT INTO user_activity (user_id, action, timestamp) VALUES (?1, 'Login', ?2)",
                params![user_id.to_string(), now],
            )?;
        }
        tx.commit().context("Failed to record login")?;

        Ok(rows > 0)
    }

    pub fn activity_log(&self, user_id: &Uuid) -> Result<Vec<ActivityEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT action, timestamp FROM user_activity WHERE user_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(ActivityEntry {
                    action: row.get(0)?,
                    timestamp: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Most recent logins, newest first
    pub fn recent_logins(&self, limit: usize) -> Result<Vec<RecentLogin>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT username, email, role, last_login, profile_photo FROM users
             WHERE last_login IS NOT NULL
             ORDER BY last_login DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let role: String = row.get(2)?;
                Ok(RecentLogin {
                    username: row.get(0)?,
                    email: row.get(1)?,
                    role: UserRole::parse(&role).ok_or_else(|| unknown_value(2, "role", &role))?,
                    last_login: row.get(3)?,
                    profile_photo: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_by_role(&self) -> Result<RoleCounts> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT role, COUNT(*) FROM users GROUP BY role")?;
        let mut counts = RoleCounts::default();

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (role, n) = row?;
            counts.total_users += n;
            match UserRole::parse(&role) {
                Some(UserRole::Admin) => counts.total_admins += n,
                Some(UserRole::Manufacturer) => counts.total_manufacturers += n,
                Some(UserRole::User) => counts.total_regular_users += n,
                None => warn!("Unknown role in users table: {}", role),
            }
        }

        Ok(counts)
    }
}

fn conflict_in(conn: &Connection, username: &str, email: &str) -> Result<Option<&'static str>> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT username FROM users WHERE username = ?1 OR email = ?2 LIMIT 1",
            params![username, email],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to check for existing users")?;

    Ok(existing.map(|name| if name == username { "username" } else { "email" }))
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    conn.query_row(&sql, params![value], user_from_row)
        .optional()
        .with_context(|| format!("Failed to load user by {}", column))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let gender: String = row.get(4)?;
    let role: String = row.get(7)?;

    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        gender: Gender::parse(&gender).ok_or_else(|| unknown_value(4, "gender", &gender))?,
        first_name: row.get(5)?,
        last_name: row.get(6)?,
        role: UserRole::parse(&role).ok_or_else(|| unknown_value(7, "role", &role))?,
        profile_photo: row.get(8)?,
        receive_notifications: row.get(9)?,
        blocked: row.get(10)?,
        last_login: row.get(11)?,
        last_ip: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn unknown_value(column: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        format!("unknown {} '{}'", what, value).into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::NamedTempFile;

    fn create_test_store() -> UserStore {
        UserStore::with_hash_cost(db::open_in_memory().unwrap(), 4 /* bcrypt minimum cost */).unwrap()
    }

    fn new_user(username: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "password123".to_string(),
            gender: Gender::Other,
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            role,
        }
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let store = create_test_store();

        let created = store
            .create_user(&new_user("mill1", UserRole::Manufacturer))
            .unwrap();
        assert_eq!(created.role, UserRole::Manufacturer);
        assert!(!created.blocked);
        assert!(created.receive_notifications);

        let by_name = store.get_user_by_username("mill1").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_email = store.get_user_by_email("MILL1@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.get_user_by_id(&created.id).unwrap().unwrap();
        assert_eq!(by_id.username, "mill1");
    }

    #[test]
    fn test_password_verification() {
        let store = create_test_store();
        store.create_user(&new_user("buyer", UserRole::User)).unwrap();

        assert!(store.verify_password("buyer@example.com", "password123").unwrap());
        assert!(!store.verify_password("buyer@example.com", "wrongpassword").unwrap());
        assert!(!store.verify_password("nobody@example.com", "password123").unwrap());
    }

    #[test]
    fn test_conflict_detection_names_field() {
        let store = create_test_store();
        store.create_user(&new_user("buyer", UserRole::User)).unwrap();

        assert_eq!(
            store.find_conflict("buyer", "other@example.com").unwrap(),
            Some("username")
        );
        assert_eq!(
            store.find_conflict("someone", "buyer@example.com").unwrap(),
            Some("email")
        );
        assert_eq!(store.find_conflict("someone", "new@example.com").unwrap(), None);

        let err = store
            .create_user(&new_user("buyer", UserRole::User))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<UserConflict>(),
            Some(&UserConflict { field: "username" })
        );

        let mut same_email = new_user("other", UserRole::User);
        same_email.email = "buyer@example.com".to_string();
        let err = store.create_user(&same_email).unwrap_err();
        assert_eq!(err.to_string(), "User with this email already exists.");
    }

    #[test]
    fn test_concurrent_duplicate_signups_conflict() {
        let store = std::sync::Arc::new(create_test_store());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.create_user(&new_user("racer", UserRole::User)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(err.downcast_ref::<UserConflict>().is_some());
        }
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_stored_role_is_an_error() {
        let store = create_test_store();
        let user = store.create_user(&new_user("odd", UserRole::User)).unwrap();
        store
            .conn
            .lock()
            .execute(
                "UPDATE users SET role = 'weaver' WHERE id = ?1",
                params![user.id.to_string()],
            )
            .unwrap();

        assert!(store.get_user_by_id(&user.id).is_err());
        assert!(store.list_users().is_err());
    }

    #[test]
    fn test_list_users_newest_first() {
        let store = create_test_store();
        store.create_user(&new_user("first", UserRole::User)).unwrap();
        store.create_user(&new_user("second", UserRole::User)).unwrap();
        store.create_user(&new_user("third", UserRole::Admin)).unwrap();

        let users = store.list_users().unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_delete_user() {
        let store = create_test_store();
        let user = store.create_user(&new_user("tempuser", UserRole::User)).unwrap();
        store.record_login(&user.id, Some("10.0.0.1")).unwrap();

        assert!(store.delete_user(&user.id).unwrap());
        assert!(store.get_user_by_username("tempuser").unwrap().is_none());
        assert!(store.activity_log(&user.id).unwrap().is_empty());

        assert!(!store.delete_user(&user.id).unwrap());
    }

    #[test]
    fn test_update_profile_is_partial() {
        let store = create_test_store();
        let user = store.create_user(&new_user("weaver", UserRole::User)).unwrap();

        let update = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            profile_photo: Some("/uploads/profile-1.png".to_string()),
            receive_notifications: Some(false),
            ..Default::default()
        };
        let updated = store.update_profile(&user.id, &update).unwrap().unwrap();
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.last_name, "Last");
        assert_eq!(updated.profile_photo.as_deref(), Some("/uploads/profile-1.png"));
        assert!(!updated.receive_notifications);

        let reloaded = store.get_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(reloaded.first_name, "Ada");
        assert!(!reloaded.receive_notifications);

        assert!(store
            .update_profile(&Uuid::new_v4(), &update)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_role_password_and_block_changes() {
        let store = create_test_store();
        let user = store.create_user(&new_user("promote", UserRole::User)).unwrap();

        assert!(store.set_role(&user.id, UserRole::Manufacturer).unwrap());
        assert_eq!(
            store.get_user_by_id(&user.id).unwrap().unwrap().role,
            UserRole::Manufacturer
        );

        assert!(store.set_password(&user.id, "new-password-1").unwrap());
        assert!(store.verify_password("promote@example.com", "new-password-1").unwrap());
        assert!(!store.verify_password("promote@example.com", "password123").unwrap());

        assert_eq!(store.toggle_blocked(&user.id).unwrap(), Some(true));
        assert_eq!(store.toggle_blocked(&user.id).unwrap(), Some(false));
        assert_eq!(store.toggle_blocked(&Uuid::new_v4()).unwrap(), None);
        assert!(!store.set_role(&Uuid::new_v4(), UserRole::Admin).unwrap());
    }

    #[test]
    fn test_record_login_and_recent_logins() {
        let store = create_test_store();
        let a = store.create_user(&new_user("alpha", UserRole::User)).unwrap();
        let b = store.create_user(&new_user("bravo", UserRole::Manufacturer)).unwrap();
        store.create_user(&new_user("never", UserRole::User)).unwrap();

        store.record_login(&a.id, Some("127.0.0.1")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.record_login(&b.id, None).unwrap();

        let recent = store.recent_logins(5).unwrap();
        let names: Vec<&str> = recent.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["bravo", "alpha"]);

        let alpha = store.get_user_by_id(&a.id).unwrap().unwrap();
        assert_eq!(alpha.last_ip.as_deref(), Some("127.0.0.1"));
        assert!(alpha.last_login.is_some());

        let log = store.activity_log(&a.id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, "Login");

        assert_eq!(store.recent_logins(1).unwrap().len(), 1);
    }

    #[test]
    fn test_count_by_role() {
        let store = create_test_store();
        store.create_user(&new_user("admin1", UserRole::Admin)).unwrap();
        store.create_user(&new_user("mill1", UserRole::Manufacturer)).unwrap();
        store.create_user(&new_user("mill2", UserRole::Manufacturer)).unwrap();
        store.create_user(&new_user("buyer", UserRole::User)).unwrap();

        let counts = store.count_by_role().unwrap();
        assert_eq!(
            counts,
            RoleCounts {
                total_users: 4,
                total_admins: 1,
                total_manufacturers: 2,
                total_regular_users: 1,
            }
        );
    }

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = db::open(temp_file.path().to_str().unwrap()).unwrap();
        let store = UserStore::with_hash_cost(conn, 4 /* bcrypt minimum cost */).unwrap();

        assert!(store.ensure_admin("Root@Example.com", "bootstrap-pw").unwrap());
        assert!(!store.ensure_admin("root@example.com", "bootstrap-pw").unwrap());

        let admin = store.get_user_by_email("root@example.com").unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.username, "root");
        assert!(store.verify_password("root@example.com", "bootstrap-pw").unwrap());
    }
}
