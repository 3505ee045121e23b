//! Catalog Storage
//! Mission: Persist manufacturer profiles and their product listings

use crate::catalog::models::{
    InitialOffer, Manufacturer, Product, ProductListing, Quality, DEFAULT_MANUFACTURER_NAME,
};
use crate::db::{timestamp_now, SharedConnection};
use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS manufacturers (
    id TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL,
    manufacturer_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    manufacturer_id TEXT NOT NULL,
    fabric_type TEXT NOT NULL,
    qualities_json TEXT NOT NULL,
    min_price REAL NOT NULL CHECK (min_price >= 0),
    min_delivery INTEGER NOT NULL CHECK (min_delivery >= 1),
    offer_price REAL NOT NULL CHECK (offer_price >= 0),
    offer_delivery INTEGER NOT NULL CHECK (offer_delivery >= 1),
    offer_quality TEXT NOT NULL,
    FOREIGN KEY (manufacturer_id) REFERENCES manufacturers(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_products_manufacturer ON products(manufacturer_id, id);
"#;

/// Result of adding a product
#[derive(Debug, Clone)]
pub struct AddedProduct {
    pub manufacturer_name: String,
    pub total_products: usize,
}

/// Manufacturer/product storage with SQLite backend
pub struct CatalogStore {
    conn: SharedConnection,
}

impl CatalogStore {
    pub fn new(conn: SharedConnection) -> Result<Self> {
        conn.lock()
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize catalog schema")?;
        Ok(Self { conn })
    }

    /// Append a product to the manufacturer owned by `user_id`, creating the
    /// manufacturer on its first product. A supplied name replaces the
    /// current one.
    pub fn add_product(
        &self,
        user_id: &Uuid,
        manufacturer_name: Option<&str>,
        product: &Product,
    ) -> Result<AddedProduct> {
        let qualities_json = serde_json::to_string(&product.qualities)?;
        let now = timestamp_now();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<(String, String)> = tx
            .query_row(
                "SELECT id, manufacturer_name FROM manufacturers WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (manufacturer_id, name) = match existing {
            Some((id, current_name)) => {
                let name = manufacturer_name
                    .map(str::to_string)
                    .unwrap_or(current_name);
                tx.execute(
                    "UPDATE manufacturers SET manufacturer_name = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id, name, now],
                )?;
                (id, name)
            }
            None => {
                let id = Uuid::new_v4().to_string();
                let name = manufacturer_name
                    .unwrap_or(DEFAULT_MANUFACTURER_NAME)
                    .to_string();
                tx.execute(
                    "INSERT INTO manufacturers (id, user_id, manufacturer_name, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![id, user_id.to_string(), name, now],
                )?;
                info!("🏭 Manufacturer profile created: {}", name);
                (id, name)
            }
        };

        tx.execute(
            "INSERT INTO products (manufacturer_id, fabric_type, qualities_json, min_price,
                                   min_delivery, offer_price, offer_delivery, offer_quality)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                manufacturer_id,
                product.fabric_type,
                qualities_json,
                product.min_price,
                product.min_delivery,
                product.initial_offer.price,
                product.initial_offer.delivery,
                product.initial_offer.quality.as_str(),
            ],
        )
        .context("Failed to insert product")?;

        let total: i64 = tx.query_row(
            "SELECT COUNT(*) FROM products WHERE manufacturer_id = ?1",
            params![manufacturer_id],
            |row| row.get(0),
        )?;

        tx.commit().context("Failed to save product")?;

        debug!("Product {} added for {}", product.fabric_type, user_id);

        Ok(AddedProduct {
            manufacturer_name: name,
            total_products: total as usize,
        })
    }

    /// Manufacturer profile (with products) owned by `user_id`
    pub fn get_for_user(&self, user_id: &Uuid) -> Result<Option<Manufacturer>> {
        let conn = self.conn.lock();
        let manufacturer = conn
            .query_row(
                "SELECT id, user_id, manufacturer_name, created_at, updated_at
                 FROM manufacturers WHERE user_id = ?1",
                params![user_id.to_string()],
                manufacturer_from_row,
            )
            .optional()?;

        match manufacturer {
            Some(mut m) => {
                m.products = products_of(&conn, &m.id)?;
                Ok(Some(m))
            }
            None => Ok(None),
        }
    }

    /// All manufacturers in creation order, each with its products
    pub fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, manufacturer_name, created_at, updated_at
             FROM manufacturers ORDER BY created_at, rowid",
        )?;
        let mut manufacturers = stmt
            .query_map([], manufacturer_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for m in &mut manufacturers {
            m.products = products_of(&conn, &m.id)?;
        }
        Ok(manufacturers)
    }

    /// Every product, flattened in manufacturer order then insertion order.
    ///
    /// Position in this list (1-based) is the manufacturer id clients send to
    /// the optimizer.
    pub fn list_products(&self) -> Result<Vec<ProductListing>> {
        Ok(self
            .list_manufacturers()?
            .into_iter()
            .flat_map(|m| {
                let name = m.manufacturer_name;
                m.products.into_iter().map(move |product| ProductListing {
                    manufacturer_name: name.clone(),
                    product,
                })
            })
            .collect())
    }

    /// Remove the manufacturer profile of a deleted account
    pub fn delete_for_user(&self, user_id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM manufacturers WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
        Ok(rows > 0)
    }
}

fn parse_uuid(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn manufacturer_from_row(row: &Row<'_>) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        user_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        manufacturer_name: row.get(2)?,
        products: Vec::new(),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn products_of(conn: &Connection, manufacturer_id: &Uuid) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare_cached(
        "SELECT fabric_type, qualities_json, min_price, min_delivery,
                offer_price, offer_delivery, offer_quality
         FROM products WHERE manufacturer_id = ?1 ORDER BY id",
    )?;

    let products = stmt
        .query_map(params![manufacturer_id.to_string()], product_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load products")?;
    Ok(products)
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let qualities_json: String = row.get(1)?;
    let qualities: Vec<Quality> = serde_json::from_str(&qualities_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let offer_quality: String = row.get(6)?;

    Ok(Product {
        fabric_type: row.get(0)?,
        qualities,
        min_price: row.get(2)?,
        min_delivery: row.get(3)?,
        initial_offer: InitialOffer {
            price: row.get(4)?,
            delivery: row.get(5)?,
            quality: Quality::parse(&offer_quality).unwrap_or(Quality::Standard),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn store() -> CatalogStore {
        CatalogStore::new(db::open_in_memory().unwrap()).unwrap()
    }

    fn product(fabric: &str, price: f64) -> Product {
        Product {
            fabric_type: fabric.to_string(),
            qualities: vec![Quality::Economy, Quality::Standard],
            min_price: price / 2.0,
            min_delivery: 5,
            initial_offer: InitialOffer {
                price,
                delivery: 12,
                quality: Quality::Standard,
            },
        }
    }

    #[test]
    fn test_first_product_creates_manufacturer() {
        let store = store();
        let owner = Uuid::new_v4();

        let added = store.add_product(&owner, None, &product("Cotton", 8.0)).unwrap();
        assert_eq!(added.manufacturer_name, DEFAULT_MANUFACTURER_NAME);
        assert_eq!(added.total_products, 1);

        let added = store
            .add_product(&owner, Some("Indigo Mills"), &product("Denim", 12.0))
            .unwrap();
        assert_eq!(added.manufacturer_name, "Indigo Mills");
        assert_eq!(added.total_products, 2);

        // Omitting the name keeps the current one
        let added = store.add_product(&owner, None, &product("Linen", 9.5)).unwrap();
        assert_eq!(added.manufacturer_name, "Indigo Mills");

        let m = store.get_for_user(&owner).unwrap().unwrap();
        assert_eq!(m.user_id, owner);
        let fabrics: Vec<&str> = m.products.iter().map(|p| p.fabric_type.as_str()).collect();
        assert_eq!(fabrics, vec!["Cotton", "Denim", "Linen"]);
        assert_eq!(m.products[1], product("Denim", 12.0));
    }

    #[test]
    fn test_flattened_listing_order() {
        let store = store();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.add_product(&first, Some("Alpha"), &product("Silk", 20.0)).unwrap();
        store.add_product(&second, Some("Beta"), &product("Wool", 15.0)).unwrap();
        store.add_product(&first, None, &product("Satin", 18.0)).unwrap();

        let listing = store.list_products().unwrap();
        let rows: Vec<(&str, &str)> = listing
            .iter()
            .map(|l| (l.manufacturer_name.as_str(), l.product.fabric_type.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![("Alpha", "Silk"), ("Alpha", "Satin"), ("Beta", "Wool")]
        );
    }

    #[test]
    fn test_unknown_owner_and_delete() {
        let store = store();
        let owner = Uuid::new_v4();
        assert!(store.get_for_user(&owner).unwrap().is_none());

        store.add_product(&owner, None, &product("Jute", 3.0)).unwrap();
        assert!(store.delete_for_user(&owner).unwrap());
        assert!(store.get_for_user(&owner).unwrap().is_none());
        assert!(store.list_products().unwrap().is_empty());
        assert!(!store.delete_for_user(&owner).unwrap());
    }
}
