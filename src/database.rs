use std::fs;
use std::path::Path;

use log::info;
use rusqlite::{Connection, OptionalExtension};

use crate::error::PriceError;
use crate::schema::CREATE_SCHEMA_SQL;

const SCHEMA_VERSION: &str = "1";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, PriceError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        info!("Database opened at: {}", db_path.display());

        let db = Database { conn };
        db.ensure_schema()?;

        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, PriceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Database { conn };
        db.ensure_schema()?;

        Ok(db)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    fn ensure_schema(&self) -> Result<(), PriceError> {
        let table_exists: bool = self
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false);

        if !table_exists {
            self.conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(PriceError::Error(format!(
                "Schema version mismatch: expected {SCHEMA_VERSION}, found {other}"
            ))),
            None => Err(PriceError::Error("Schema version missing".to_string())),
        }
    }
}
