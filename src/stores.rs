use rusqlite::OptionalExtension;

use crate::database::Database;
use crate::error::PriceError;

/// A retailer. Identity is the trimmed name; names are immutable once created.
#[derive(Clone, Debug, Default)]
pub struct Store {
    store_id: i64,
    name: String,
}

impl Store {
    pub fn get_or_create(db: &Database, name: &str) -> Result<Self, PriceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PriceError::Validation(
                "store name cannot be empty".to_string(),
            ));
        }

        let conn = db.conn();
        conn.execute("INSERT OR IGNORE INTO stores (name) VALUES (?)", [name])?;

        let store_id: i64 = conn
            .query_row("SELECT store_id FROM stores WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| PriceError::Error("failed to fetch store after insert".to_string()))?;

        Ok(Store {
            store_id,
            name: name.to_owned(),
        })
    }

    pub fn store_id(&self) -> i64 {
        self.store_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stores_as_vec(db: &Database) -> Result<Vec<Store>, PriceError> {
        let mut stmt = db
            .conn()
            .prepare("SELECT store_id, name FROM stores ORDER BY name ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(Store {
                store_id: row.get::<_, i64>(0)?,
                name: row.get::<_, String>(1)?,
            })
        })?;

        let mut stores = Vec::new();
        for row in rows {
            stores.push(row?);
        }

        Ok(stores)
    }
}
