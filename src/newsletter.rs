//! Newsletter Subscriptions
//! Mission: Keep the list of addresses that asked for platform updates

use crate::db::{timestamp_now, SharedConnection};
use anyhow::{Context, Result};
use rusqlite::params;
use tracing::info;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS newsletter_subscribers (
    email TEXT PRIMARY KEY,
    subscribed_at TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Created,
    AlreadySubscribed,
}

pub struct NewsletterStore {
    conn: SharedConnection,
}

impl NewsletterStore {
    pub fn new(conn: SharedConnection) -> Result<Self> {
        conn.lock()
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize newsletter schema")?;
        Ok(Self { conn })
    }

    /// Subscribe `email` (stored trimmed and lowercased)
    pub fn subscribe(&self, email: &str) -> Result<Subscription> {
        let email = email.trim().to_lowercase();
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO newsletter_subscribers (email, subscribed_at) VALUES (?1, ?2)",
                params![email, timestamp_now()],
            )
            .context("Failed to save subscription")?;

        if rows == 0 {
            return Ok(Subscription::AlreadySubscribed);
        }
        info!("📰 New newsletter subscriber");
        Ok(Subscription::Created)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let n = conn.query_row("SELECT COUNT(*) FROM newsletter_subscribers", [], |row| {
            row.get(0)
        })?;
        Ok(n)
    }
}
