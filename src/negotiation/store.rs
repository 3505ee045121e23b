//! Negotiation History Storage
//! Mission: Keep the recommended offer of every completed negotiation

use crate::db::{timestamp_now, SharedConnection};
use crate::negotiation::models::{NegotiationRecord, OfferTerms, OptimizedOffer, Recommendation};
use anyhow::{Context, Result};
use rusqlite::{params, Row};
use std::collections::HashMap;
use tracing::debug;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS negotiations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    date TEXT NOT NULL,
    manufacturer_id INTEGER NOT NULL,
    offer_price REAL NOT NULL,
    offer_delivery INTEGER NOT NULL,
    offer_quality TEXT NOT NULL,
    fitness REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_negotiations_date ON negotiations(date);
CREATE INDEX IF NOT EXISTS idx_negotiations_manufacturer ON negotiations(manufacturer_id);
"#;

const SELECT_COLUMNS: &str = "SELECT id, username, date, manufacturer_id, offer_price, \
                              offer_delivery, offer_quality, fitness FROM negotiations";

pub struct NegotiationStore {
    conn: SharedConnection,
}

impl NegotiationStore {
    pub fn new(conn: SharedConnection) -> Result<Self> {
        conn.lock()
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize negotiation schema")?;
        Ok(Self { conn })
    }

    /// Record the recommended offer of a negotiation run by `username`
    pub fn insert(&self, username: &str, recommended: &OptimizedOffer) -> Result<NegotiationRecord> {
        let date = timestamp_now();
        let offer = &recommended.optimized_offer;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO negotiations (username, date, manufacturer_id, offer_price,
                                       offer_delivery, offer_quality, fitness)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                username,
                date,
                recommended.manufacturer_id,
                offer.price,
                offer.delivery,
                offer.quality,
                recommended.fitness,
            ],
        )
        .context("Failed to save negotiation")?;
        let id = conn.last_insert_rowid();

        debug!(
            id,
            username,
            manufacturer_id = recommended.manufacturer_id,
            fitness = recommended.fitness,
            "Negotiation recorded"
        );

        Ok(NegotiationRecord {
            id,
            username: username.to_string(),
            date,
            recommended: Recommendation {
                optimized_offer: offer.clone(),
                fitness: recommended.fitness,
                manufacturer_id: recommended.manufacturer_id,
            },
        })
    }

    /// Full history, newest first
    pub fn list(&self) -> Result<Vec<NegotiationRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{} ORDER BY date DESC, id DESC", SELECT_COLUMNS))?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load negotiations")?;
        Ok(records)
    }

    /// Negotiations with `start <= date < end`, oldest first.
    ///
    /// Bounds are timestamps in the same fixed-width format the store writes.
    pub fn list_between(&self, start: &str, end: &str) -> Result<Vec<NegotiationRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE date >= ?1 AND date < ?2 ORDER BY date, id",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![start, end], record_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load negotiations")?;
        Ok(records)
    }

    /// How often each manufacturer id was recommended
    pub fn recommendation_counts(&self) -> Result<HashMap<i64, i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT manufacturer_id, COUNT(*) FROM negotiations GROUP BY manufacturer_id",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<NegotiationRecord> {
    Ok(NegotiationRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        date: row.get(2)?,
        recommended: Recommendation {
            manufacturer_id: row.get(3)?,
            optimized_offer: OfferTerms {
                price: row.get(4)?,
                delivery: row.get(5)?,
                quality: row.get(6)?,
            },
            fitness: row.get(7)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::Value;

    fn store() -> NegotiationStore {
        NegotiationStore::new(db::open_in_memory().unwrap()).unwrap()
    }

    fn offer(manufacturer_id: i64, fitness: f64) -> OptimizedOffer {
        OptimizedOffer {
            manufacturer_id,
            optimized_offer: OfferTerms {
                price: 9.5,
                delivery: 14,
                quality: "Premium".to_string(),
            },
            fitness,
            round_history: Value::Null,
        }
    }

    #[test]
    fn test_insert_and_list_newest_first() {
        let store = store();
        let first = store.insert("alice", &offer(1, 0.7)).unwrap();
        let second = store.insert("bob", &offer(2, 0.9)).unwrap();
        assert!(second.id > first.id);

        let history = store.list().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].username, "bob");
        assert_eq!(history[1], first);
        assert_eq!(history[0].recommended.optimized_offer.quality, "Premium");
    }

    #[test]
    fn test_list_between_bounds() {
        let store = store();
        let before = timestamp_now();
        store.insert("alice", &offer(1, 0.5)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let after = timestamp_now();

        assert_eq!(store.list_between(&before, &after).unwrap().len(), 1);
        // End bound is exclusive
        assert!(store.list_between(&before, &before).unwrap().is_empty());
        assert!(store
            .list_between("2000-01-01T00:00:00.000000Z", "2000-01-02T00:00:00.000000Z")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_recommendation_counts() {
        let store = store();
        assert!(store.recommendation_counts().unwrap().is_empty());

        store.insert("a", &offer(1, 0.5)).unwrap();
        store.insert("b", &offer(3, 0.5)).unwrap();
        store.insert("c", &offer(1, 0.5)).unwrap();

        let counts = store.recommendation_counts().unwrap();
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&3), Some(&1));
        assert_eq!(counts.get(&2), None);
    }
}
