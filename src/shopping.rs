use std::fs;
use std::path::Path;

use log::warn;
use serde_json::Value;

use crate::database::Database;
use crate::error::PriceError;
use crate::observations::LatestOption;
use crate::stores::Store;
use crate::units::{comparison_value, ComparisonValue};

/// One requested family with a purchase quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct ShoppingEntry {
    pub family_key: String,
    pub quantity: i64,
}

/// An ordered list of (family_key, quantity) pairs.
#[derive(Clone, Debug, Default)]
pub struct ShoppingList {
    entries: Vec<ShoppingEntry>,
}

impl ShoppingList {
    /// Load a list from a JSON file: an array of objects with `family_key`
    /// and an optional `quantity`.
    pub fn load(path: &Path) -> Result<Self, PriceError> {
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;

        let items = value.as_array().ok_or_else(|| {
            PriceError::Validation(format!(
                "shopping list {} must be a JSON array",
                path.display()
            ))
        })?;

        Ok(Self::from_values(items))
    }

    /// Normalize raw entries. Quantity defaults to 1; entries with an empty
    /// family key or a non-positive or unparseable quantity are dropped,
    /// not treated as errors.
    fn from_values(items: &[Value]) -> Self {
        let mut entries = Vec::new();

        for item in items {
            let obj = match item.as_object() {
                Some(obj) => obj,
                None => {
                    warn!("Shopping list entry is not an object, dropping: {item}");
                    continue;
                }
            };

            let family_key = obj
                .get("family_key")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            if family_key.is_empty() {
                warn!("Shopping list entry has no family_key, dropping: {item}");
                continue;
            }

            // A fractional quantity is unparseable, not rounded
            let quantity = match obj.get("quantity") {
                None | Some(Value::Null) => Some(1),
                Some(Value::Number(n)) => n.as_i64().or_else(|| {
                    n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)
                }),
                Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
                Some(_) => None,
            };

            match quantity {
                Some(quantity) if quantity > 0 => entries.push(ShoppingEntry {
                    family_key: family_key.to_owned(),
                    quantity,
                }),
                _ => warn!("Shopping list entry for '{family_key}' has an invalid quantity, dropping"),
            }
        }

        ShoppingList { entries }
    }

    pub fn entries(&self) -> &[ShoppingEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One store's line for one requested family: its cheapest-by-unit-price
/// pack, priced at the raw pack price times the quantity.
#[derive(Clone, Debug)]
pub struct LineItem {
    pub family_key: String,
    pub label: String,
    pub size: f64,
    pub unit: String,
    pub quantity: i64,
    pub pack_price_cents: i64,
    pub line_total_cents: i64,
    pub comparison: ComparisonValue,
}

/// A store's totals for the whole list, with missing-family accounting.
#[derive(Clone, Debug)]
pub struct StoreComparison {
    pub store_name: String,
    pub lines: Vec<LineItem>,
    pub missing: Vec<String>,
    pub total_cents: i64,
}

impl StoreComparison {
    /// Compare the whole list across all known stores. Ranking is ascending
    /// by (missing-family count, total cost): fewer gaps always wins,
    /// price breaks ties.
    pub fn compare(db: &Database, list: &ShoppingList) -> Result<Vec<Self>, PriceError> {
        let mut comparisons: Vec<StoreComparison> = Store::stores_as_vec(db)?
            .into_iter()
            .map(|store| StoreComparison {
                store_name: store.name().to_owned(),
                lines: Vec::new(),
                missing: Vec::new(),
                total_cents: 0,
            })
            .collect();

        for entry in list.entries() {
            let options = LatestOption::for_family(db, &entry.family_key)?;

            for comparison in &mut comparisons {
                match Self::store_local_cheapest(&options, &comparison.store_name) {
                    Some((opt, price_cents, cv)) => {
                        let line_total_cents =
                            price_cents.checked_mul(entry.quantity).ok_or_else(|| {
                                PriceError::Validation(format!(
                                    "quantity {} for '{}' overflows the line total",
                                    entry.quantity, entry.family_key
                                ))
                            })?;
                        comparison.total_cents = comparison
                            .total_cents
                            .checked_add(line_total_cents)
                            .ok_or_else(|| {
                                PriceError::Validation(
                                    "shopping list total overflows".to_string(),
                                )
                            })?;
                        comparison.lines.push(LineItem {
                            family_key: entry.family_key.clone(),
                            label: opt.label.clone(),
                            size: opt.size,
                            unit: opt.unit.clone(),
                            quantity: entry.quantity,
                            pack_price_cents: price_cents,
                            line_total_cents,
                            comparison: cv,
                        });
                    }
                    None => comparison.missing.push(entry.family_key.clone()),
                }
            }
        }

        comparisons.sort_by(|a, b| {
            (a.missing.len(), a.total_cents).cmp(&(b.missing.len(), b.total_cents))
        });

        Ok(comparisons)
    }

    /// A store may carry several pack sizes of a family; pick the one with
    /// the lowest normalized unit price, same rules as the cheapest report.
    fn store_local_cheapest<'a>(
        options: &'a [LatestOption],
        store_name: &str,
    ) -> Option<(&'a LatestOption, i64, ComparisonValue)> {
        options
            .iter()
            .filter(|opt| opt.store_name == store_name)
            .filter_map(|opt| {
                let price_cents = opt.price_cents?;
                let cv = comparison_value(price_cents, opt.size, &opt.unit);
                Some((opt, price_cents, cv))
            })
            .min_by(|a, b| a.2.value_eur.total_cmp(&b.2.value_eur))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CanonicalItem;
    use crate::observations::PriceObservation;
    use crate::store_items::StoreItem;
    use pretty_assertions::assert_eq;

    fn entry(family_key: &str, quantity: i64) -> ShoppingEntry {
        ShoppingEntry {
            family_key: family_key.to_owned(),
            quantity,
        }
    }

    fn list_of(entries: Vec<ShoppingEntry>) -> ShoppingList {
        ShoppingList { entries }
    }

    fn track_priced(db: &Database, store: &str, family: &str, size: f64, unit: &str, cents: i64) {
        let store = Store::get_or_create(db, store).unwrap();
        let label = format!("{family} {size}{unit}");
        let item = CanonicalItem::upsert(db, family, &label, size, unit).unwrap();
        let url = format!(
            "https://example.com/{}/{}",
            store.name(),
            item.canonical_item_id()
        );
        let si =
            StoreItem::upsert_mapping(db, store.store_id(), item.canonical_item_id(), &url, "spar")
                .unwrap();
        PriceObservation::insert_daily(db, si.store_item_id(), "2025-06-01", cents, None).unwrap();
    }

    #[test]
    fn test_from_values_defaults_and_drops() {
        let raw: Value = serde_json::json!([
            {"family_key": "milk"},
            {"family_key": "eggs", "quantity": 2},
            {"family_key": "flour", "quantity": "3"},
            {"family_key": "rice", "quantity": 4.0},
            {"family_key": "bad", "quantity": 0},
            {"family_key": "worse", "quantity": "lots"},
            {"family_key": "  "},
            "not-an-object"
        ]);

        let list = ShoppingList::from_values(raw.as_array().unwrap());
        assert_eq!(
            list.entries(),
            &[
                entry("milk", 1),
                entry("eggs", 2),
                entry("flour", 3),
                entry("rice", 4),
            ]
        );
    }

    #[test]
    fn test_fractional_quantity_is_dropped_not_truncated() {
        let raw: Value = serde_json::json!([
            {"family_key": "milk", "quantity": 2.7}
        ]);

        let list = ShoppingList::from_values(raw.as_array().unwrap());
        assert!(list.is_empty());
    }

    #[test]
    fn test_line_total_uses_raw_pack_price_times_quantity() {
        let db = Database::open_in_memory().unwrap();
        track_priced(&db, "Hofer", "milk", 1.0, "l", 119);

        let comps = StoreComparison::compare(&db, &list_of(vec![entry("milk", 3)])).unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].lines[0].line_total_cents, 357);
        assert_eq!(comps[0].total_cents, 357);
    }

    #[test]
    fn test_huge_quantity_is_an_overflow_error_not_wraparound() {
        let db = Database::open_in_memory().unwrap();
        track_priced(&db, "Hofer", "milk", 1.0, "l", 199);

        let result =
            StoreComparison::compare(&db, &list_of(vec![entry("milk", i64::MAX / 2)]));
        assert!(matches!(result, Err(PriceError::Validation(_))));
    }

    #[test]
    fn test_store_local_cheapest_picks_best_pack_by_unit_price() {
        let db = Database::open_in_memory().unwrap();

        // Same store, two pack sizes: 1 L at 1.99 (1.99/l) vs 0.5 L at 1.09 (2.18/l)
        track_priced(&db, "Hofer", "milk", 1.0, "l", 199);
        track_priced(&db, "Hofer", "milk", 0.5, "l", 109);

        let comps = StoreComparison::compare(&db, &list_of(vec![entry("milk", 1)])).unwrap();
        let line = &comps[0].lines[0];
        assert_eq!(line.size, 1.0);
        assert_eq!(line.pack_price_cents, 199);
    }

    #[test]
    fn test_missing_family_ranks_store_below_complete_store() {
        let db = Database::open_in_memory().unwrap();

        // Expensive store carries everything; cheap store misses eggs.
        track_priced(&db, "Expensive", "milk", 1.0, "l", 199);
        track_priced(&db, "Expensive", "eggs", 10.0, "pcs", 349);
        track_priced(&db, "Cheap", "milk", 1.0, "l", 99);

        let comps = StoreComparison::compare(
            &db,
            &list_of(vec![entry("milk", 1), entry("eggs", 1)]),
        )
        .unwrap();

        assert_eq!(comps[0].store_name, "Expensive");
        assert!(comps[0].missing.is_empty());
        assert_eq!(comps[1].store_name, "Cheap");
        assert_eq!(comps[1].missing, vec!["eggs"]);
    }

    #[test]
    fn test_equal_missing_counts_rank_by_total() {
        let db = Database::open_in_memory().unwrap();

        track_priced(&db, "StoreA", "milk", 1.0, "l", 150);
        track_priced(&db, "StoreB", "milk", 1.0, "l", 120);

        let comps = StoreComparison::compare(&db, &list_of(vec![entry("milk", 1)])).unwrap();
        assert_eq!(comps[0].store_name, "StoreB");
        assert_eq!(comps[1].store_name, "StoreA");
    }

    #[test]
    fn test_store_with_no_options_is_all_missing_not_error() {
        let db = Database::open_in_memory().unwrap();

        track_priced(&db, "StoreA", "milk", 1.0, "l", 150);
        Store::get_or_create(&db, "Empty").unwrap();

        let comps = StoreComparison::compare(&db, &list_of(vec![entry("milk", 1)])).unwrap();
        assert_eq!(comps.len(), 2);

        let empty = comps.iter().find(|c| c.store_name == "Empty").unwrap();
        assert_eq!(empty.missing, vec!["milk"]);
        assert_eq!(empty.total_cents, 0);
    }

    #[test]
    fn test_tracked_but_unobserved_pack_counts_as_missing() {
        let db = Database::open_in_memory().unwrap();

        track_priced(&db, "StoreA", "milk", 1.0, "l", 150);

        // StoreB tracks milk but has no observation yet
        let store = Store::get_or_create(&db, "StoreB").unwrap();
        let item = CanonicalItem::upsert(&db, "milk", "Mleko 1L", 1.0, "l").unwrap();
        StoreItem::upsert_mapping(
            &db,
            store.store_id(),
            item.canonical_item_id(),
            "https://example.com/b/milk",
            "spar",
        )
        .unwrap();

        let comps = StoreComparison::compare(&db, &list_of(vec![entry("milk", 1)])).unwrap();
        let store_b = comps.iter().find(|c| c.store_name == "StoreB").unwrap();
        assert_eq!(store_b.missing, vec!["milk"]);
    }
}
