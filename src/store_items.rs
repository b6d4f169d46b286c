use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::PriceError;

/// One store's URL mapping to a canonical pack. Identity is
/// (store_id, canonical_item_id); re-tracking overwrites url and scraper.
#[derive(Clone, Debug, Default)]
pub struct StoreItem {
    store_item_id: i64,
    url: String,
    scraper: String,
}

impl StoreItem {
    pub fn upsert_mapping(
        db: &Database,
        store_id: i64,
        canonical_item_id: i64,
        url: &str,
        scraper: &str,
    ) -> Result<Self, PriceError> {
        let url = url.trim();
        let scraper = scraper.trim().to_ascii_lowercase();

        if url.is_empty() {
            return Err(PriceError::Validation("url cannot be empty".to_string()));
        }
        if scraper.is_empty() {
            return Err(PriceError::Validation(
                "scraper cannot be empty".to_string(),
            ));
        }

        let conn = db.conn();

        conn.execute(
            "INSERT INTO store_items (store_id, canonical_item_id, url, scraper)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (store_id, canonical_item_id) DO UPDATE SET
               url = excluded.url,
               scraper = excluded.scraper",
            params![store_id, canonical_item_id, url, scraper],
        )?;

        let store_item_id: i64 = conn
            .query_row(
                "SELECT store_item_id FROM store_items
                 WHERE store_id = ? AND canonical_item_id = ?",
                params![store_id, canonical_item_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                PriceError::Error("failed to fetch store item after upsert".to_string())
            })?;

        Ok(StoreItem {
            store_item_id,
            url: url.to_owned(),
            scraper,
        })
    }

    pub fn store_item_id(&self) -> i64 {
        self.store_item_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scraper(&self) -> &str {
        &self.scraper
    }
}

/// A tracked store item joined with its store and canonical pack,
/// as fed to a scrape run.
#[derive(Clone, Debug)]
pub struct TrackedItem {
    store_item_id: i64,
    url: String,
    scraper: String,
    store_name: String,
    family_key: String,
    label: String,
    size: f64,
    unit: String,
}

impl TrackedItem {
    pub fn list_all(db: &Database) -> Result<Vec<TrackedItem>, PriceError> {
        let mut stmt = db.conn().prepare(
            "SELECT
               si.store_item_id,
               si.url,
               si.scraper,
               s.name,
               ci.family_key,
               ci.label,
               ci.size,
               ci.unit
             FROM store_items si
             JOIN stores s ON s.store_id = si.store_id
             JOIN canonical_items ci ON ci.canonical_item_id = si.canonical_item_id
             ORDER BY s.name ASC, ci.family_key ASC, ci.unit ASC, ci.size ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(TrackedItem {
                store_item_id: row.get::<_, i64>(0)?,
                url: row.get::<_, String>(1)?,
                scraper: row.get::<_, String>(2)?,
                store_name: row.get::<_, String>(3)?,
                family_key: row.get::<_, String>(4)?,
                label: row.get::<_, String>(5)?,
                size: row.get::<_, f64>(6)?,
                unit: row.get::<_, String>(7)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }

        Ok(items)
    }

    pub fn store_item_id(&self) -> i64 {
        self.store_item_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scraper(&self) -> &str {
        &self.scraper
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn family_key(&self) -> &str {
        &self.family_key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Short "milk 1l" style tag used in scrape run output.
    pub fn pack_tag(&self) -> String {
        format!("{} {}{}", self.family_key, self.size, self.unit)
    }
}
