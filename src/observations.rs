use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::PriceError;

pub struct PriceObservation;

impl PriceObservation {
    /// Idempotent daily insert: at most one observation per tracked item per
    /// calendar day. Returns true when a row was newly created, false when an
    /// observation for (store_item_id, observed_on) already existed. Existing
    /// rows are never modified.
    pub fn insert_daily(
        db: &Database,
        store_item_id: i64,
        observed_on: &str,
        price_cents: i64,
        title_raw: Option<&str>,
    ) -> Result<bool, PriceError> {
        Self::insert_daily_on(db.conn(), store_item_id, observed_on, price_cents, title_raw)
    }

    /// Variant taking a bare connection so the ingestion pipeline can run the
    /// insert inside its own per-item transaction.
    pub fn insert_daily_on(
        conn: &Connection,
        store_item_id: i64,
        observed_on: &str,
        price_cents: i64,
        title_raw: Option<&str>,
    ) -> Result<bool, PriceError> {
        let observed_on = observed_on.trim();
        if observed_on.is_empty() {
            return Err(PriceError::Validation(
                "observed_on cannot be empty (expected YYYY-MM-DD)".to_string(),
            ));
        }
        if price_cents < 0 {
            return Err(PriceError::Validation(
                "price_cents must be >= 0".to_string(),
            ));
        }

        let changed = conn.execute(
            "INSERT OR IGNORE INTO price_observations
               (store_item_id, observed_on, price_cents, title_raw)
             VALUES (?, ?, ?, ?)",
            params![store_item_id, observed_on, price_cents, title_raw],
        )?;

        Ok(changed == 1)
    }
}

/// One row of a family's full observation history.
#[derive(Clone, Debug)]
pub struct PricePoint {
    pub observed_on: String,
    pub price_cents: i64,
    pub store_name: String,
    pub label: String,
    pub size: f64,
    pub unit: String,
    pub title_raw: Option<String>,
}

impl PricePoint {
    pub fn history_for_family(db: &Database, family_key: &str) -> Result<Vec<Self>, PriceError> {
        let family_key = family_key.trim();
        if family_key.is_empty() {
            return Err(PriceError::Validation(
                "family_key cannot be empty".to_string(),
            ));
        }

        let mut stmt = db.conn().prepare(
            "SELECT
               po.observed_on,
               po.price_cents,
               s.name,
               ci.label,
               ci.size,
               ci.unit,
               po.title_raw
             FROM price_observations po
             JOIN store_items si ON si.store_item_id = po.store_item_id
             JOIN stores s ON s.store_id = si.store_id
             JOIN canonical_items ci ON ci.canonical_item_id = si.canonical_item_id
             WHERE ci.family_key = ?
             ORDER BY po.observed_on ASC, s.name ASC",
        )?;

        let rows = stmt.query_map([family_key], |row| {
            Ok(PricePoint {
                observed_on: row.get::<_, String>(0)?,
                price_cents: row.get::<_, i64>(1)?,
                store_name: row.get::<_, String>(2)?,
                label: row.get::<_, String>(3)?,
                size: row.get::<_, f64>(4)?,
                unit: row.get::<_, String>(5)?,
                title_raw: row.get::<_, Option<String>>(6)?,
            })
        })?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row?);
        }

        Ok(points)
    }
}

/// The latest observation (or lack of one) for each tracked store item in a
/// family. This is the one shared read path the cheapest and shopping-list
/// features are built on: latest-per-store-item semantics live here only.
#[derive(Clone, Debug)]
pub struct LatestOption {
    pub store_name: String,
    pub label: String,
    pub size: f64,
    pub unit: String,
    pub url: String,
    pub observed_on: Option<String>,
    pub price_cents: Option<i64>,
    pub title_raw: Option<String>,
}

impl LatestOption {
    pub fn for_family(db: &Database, family_key: &str) -> Result<Vec<Self>, PriceError> {
        let family_key = family_key.trim();
        if family_key.is_empty() {
            return Err(PriceError::Validation(
                "family_key cannot be empty".to_string(),
            ));
        }

        let mut stmt = db.conn().prepare(
            "SELECT
               s.name,
               ci.label,
               ci.size,
               ci.unit,
               si.url,
               po.observed_on,
               po.price_cents,
               po.title_raw
             FROM store_items si
             JOIN stores s ON s.store_id = si.store_id
             JOIN canonical_items ci ON ci.canonical_item_id = si.canonical_item_id
             LEFT JOIN price_observations po
               ON po.store_item_id = si.store_item_id
              AND po.observed_on = (
                    SELECT MAX(observed_on)
                    FROM price_observations
                    WHERE store_item_id = si.store_item_id
              )
             WHERE ci.family_key = ?
             ORDER BY s.name ASC, ci.unit ASC, ci.size ASC",
        )?;

        let rows = stmt.query_map([family_key], |row| {
            Ok(LatestOption {
                store_name: row.get::<_, String>(0)?,
                label: row.get::<_, String>(1)?,
                size: row.get::<_, f64>(2)?,
                unit: row.get::<_, String>(3)?,
                url: row.get::<_, String>(4)?,
                observed_on: row.get::<_, Option<String>>(5)?,
                price_cents: row.get::<_, Option<i64>>(6)?,
                title_raw: row.get::<_, Option<String>>(7)?,
            })
        })?;

        let mut options = Vec::new();
        for row in rows {
            options.push(row?);
        }

        Ok(options)
    }

    /// Short "Hofer 1l" style tag used when reporting missing observations.
    pub fn pack_tag(&self) -> String {
        format!("{} {}{}", self.store_name, self.size, self.unit)
    }
}

/// Observation series for one (store, pack) group, newest first, capped at
/// the two most recent points.
#[derive(Clone, Debug)]
pub struct PackSeries {
    pub store_name: String,
    pub label: String,
    pub size: f64,
    pub unit: String,
    pub points: Vec<(String, i64)>,
}

impl PackSeries {
    pub fn latest_two_for_family(db: &Database, family_key: &str) -> Result<Vec<Self>, PriceError> {
        let family_key = family_key.trim();
        if family_key.is_empty() {
            return Err(PriceError::Validation(
                "family_key cannot be empty".to_string(),
            ));
        }

        let mut stmt = db.conn().prepare(
            "SELECT
               s.name,
               ci.label,
               ci.size,
               ci.unit,
               po.observed_on,
               po.price_cents
             FROM price_observations po
             JOIN store_items si ON si.store_item_id = po.store_item_id
             JOIN stores s ON s.store_id = si.store_id
             JOIN canonical_items ci ON ci.canonical_item_id = si.canonical_item_id
             WHERE ci.family_key = ?
             ORDER BY s.name ASC, ci.unit ASC, ci.size ASC, po.observed_on DESC",
        )?;

        let rows = stmt.query_map([family_key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut series: Vec<PackSeries> = Vec::new();
        for row in rows {
            let (store_name, label, size, unit, observed_on, price_cents) = row?;

            let group = series.iter_mut().find(|g| {
                g.store_name == store_name && g.label == label && g.size == size && g.unit == unit
            });

            match group {
                Some(group) => {
                    if group.points.len() < 2 {
                        group.points.push((observed_on, price_cents));
                    }
                }
                None => series.push(PackSeries {
                    store_name,
                    label,
                    size,
                    unit,
                    points: vec![(observed_on, price_cents)],
                }),
            }
        }

        Ok(series)
    }
}
