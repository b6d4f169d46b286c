use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::PriceError;

/// One specific (family_key, size, unit) pack - the unit of price comparison.
/// The label is mutable descriptive text; identity never changes.
#[derive(Clone, Debug, Default)]
pub struct CanonicalItem {
    canonical_item_id: i64,
    family_key: String,
    label: String,
    size: f64,
    unit: String,
}

impl CanonicalItem {
    /// Upsert keyed on (family_key, size, unit). An existing pack keeps its id
    /// and gets its label overwritten.
    pub fn upsert(
        db: &Database,
        family_key: &str,
        label: &str,
        size: f64,
        unit: &str,
    ) -> Result<Self, PriceError> {
        let family_key = family_key.trim();
        let label = label.trim();
        let unit = unit.trim();

        if family_key.is_empty() {
            return Err(PriceError::Validation(
                "family_key cannot be empty".to_string(),
            ));
        }
        if label.is_empty() {
            return Err(PriceError::Validation(
                "canonical label cannot be empty".to_string(),
            ));
        }
        if !(size > 0.0) {
            return Err(PriceError::Validation(
                "canonical size must be > 0".to_string(),
            ));
        }
        if unit.is_empty() {
            return Err(PriceError::Validation(
                "canonical unit cannot be empty".to_string(),
            ));
        }

        let conn = db.conn();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT canonical_item_id FROM canonical_items
                 WHERE family_key = ? AND size = ? AND unit = ?",
                params![family_key, size, unit],
                |row| row.get(0),
            )
            .optional()?;

        let canonical_item_id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE canonical_items SET label = ?, size = ?, unit = ?
                     WHERE canonical_item_id = ?",
                    params![label, size, unit, id],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO canonical_items (family_key, label, size, unit)
                     VALUES (?, ?, ?, ?)",
                    params![family_key, label, size, unit],
                )?;

                conn.query_row(
                    "SELECT canonical_item_id FROM canonical_items
                     WHERE family_key = ? AND size = ? AND unit = ?",
                    params![family_key, size, unit],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| {
                    PriceError::Error("failed to fetch canonical item after insert".to_string())
                })?
            }
        };

        Ok(CanonicalItem {
            canonical_item_id,
            family_key: family_key.to_owned(),
            label: label.to_owned(),
            size,
            unit: unit.to_owned(),
        })
    }

    #[cfg(test)]
    pub fn get_by_identity(
        db: &Database,
        family_key: &str,
        size: f64,
        unit: &str,
    ) -> Result<Option<Self>, PriceError> {
        let family_key = family_key.trim();
        let unit = unit.trim();
        if family_key.is_empty() || unit.is_empty() || !(size > 0.0) {
            return Ok(None);
        }

        db.conn()
            .query_row(
                "SELECT canonical_item_id, family_key, label, size, unit
                 FROM canonical_items
                 WHERE family_key = ? AND size = ? AND unit = ?",
                params![family_key, size, unit],
                |row| {
                    Ok(CanonicalItem {
                        canonical_item_id: row.get(0)?,
                        family_key: row.get(1)?,
                        label: row.get(2)?,
                        size: row.get(3)?,
                        unit: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(PriceError::Database)
    }

    pub fn packs_for_family(db: &Database, family_key: &str) -> Result<Vec<Self>, PriceError> {
        let family_key = family_key.trim();
        if family_key.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = db.conn().prepare(
            "SELECT canonical_item_id, family_key, label, size, unit
             FROM canonical_items
             WHERE family_key = ?
             ORDER BY unit ASC, size ASC",
        )?;

        let rows = stmt.query_map([family_key], |row| {
            Ok(CanonicalItem {
                canonical_item_id: row.get(0)?,
                family_key: row.get(1)?,
                label: row.get(2)?,
                size: row.get(3)?,
                unit: row.get(4)?,
            })
        })?;

        let mut packs = Vec::new();
        for row in rows {
            packs.push(row?);
        }

        Ok(packs)
    }

    pub fn canonical_item_id(&self) -> i64 {
        self.canonical_item_id
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_same_identity_returns_same_id_and_updates_label() {
        let db = Database::open_in_memory().unwrap();

        let first = CanonicalItem::upsert(&db, "milk", "Mleko 3.5% 1L", 1.0, "l").unwrap();
        let second = CanonicalItem::upsert(&db, "milk", "Alpsko mleko 1L", 1.0, "l").unwrap();

        assert_eq!(first.canonical_item_id(), second.canonical_item_id());

        let stored = CanonicalItem::get_by_identity(&db, "milk", 1.0, "l")
            .unwrap()
            .unwrap();
        assert_eq!(stored.label(), "Alpsko mleko 1L");

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM canonical_items WHERE family_key = 'milk'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_different_pack_size_is_distinct_identity() {
        let db = Database::open_in_memory().unwrap();

        let litre = CanonicalItem::upsert(&db, "milk", "Mleko 1L", 1.0, "l").unwrap();
        let half = CanonicalItem::upsert(&db, "milk", "Mleko 0.5L", 0.5, "l").unwrap();

        assert_ne!(litre.canonical_item_id(), half.canonical_item_id());
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let db = Database::open_in_memory().unwrap();

        assert!(matches!(
            CanonicalItem::upsert(&db, "  ", "Label", 1.0, "l"),
            Err(PriceError::Validation(_))
        ));
        assert!(matches!(
            CanonicalItem::upsert(&db, "milk", "  ", 1.0, "l"),
            Err(PriceError::Validation(_))
        ));
        assert!(matches!(
            CanonicalItem::upsert(&db, "milk", "Label", 0.0, "l"),
            Err(PriceError::Validation(_))
        ));
        assert!(matches!(
            CanonicalItem::upsert(&db, "milk", "Label", -1.0, "l"),
            Err(PriceError::Validation(_))
        ));
        assert!(matches!(
            CanonicalItem::upsert(&db, "milk", "Label", 1.0, ""),
            Err(PriceError::Validation(_))
        ));
    }

    #[test]
    fn test_packs_for_family_ordered_by_unit_then_size() {
        let db = Database::open_in_memory().unwrap();

        CanonicalItem::upsert(&db, "milk", "Mleko 1L", 1.0, "l").unwrap();
        CanonicalItem::upsert(&db, "milk", "Mleko v prahu 500g", 500.0, "g").unwrap();
        CanonicalItem::upsert(&db, "milk", "Mleko 0.5L", 0.5, "l").unwrap();

        let packs = CanonicalItem::packs_for_family(&db, "milk").unwrap();
        let identities: Vec<(String, String)> = packs
            .iter()
            .map(|p| (p.unit().to_owned(), format!("{}", p.size())))
            .collect();

        assert_eq!(
            identities,
            vec![
                ("g".to_owned(), "500".to_owned()),
                ("l".to_owned(), "0.5".to_owned()),
                ("l".to_owned(), "1".to_owned()),
            ]
        );
    }
}
