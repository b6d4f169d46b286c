/// Logical schema:
/// - a store is identified by its trimmed name
/// - a canonical item is one specific (family_key, size, unit) pack
/// - a store item maps one store to one canonical pack via a product URL
/// - a price observation is an append-only daily fact per store item
pub const CREATE_SCHEMA_SQL: &str = "
BEGIN;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stores (
    store_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS canonical_items (
    canonical_item_id INTEGER PRIMARY KEY,
    family_key TEXT NOT NULL,
    label TEXT NOT NULL,
    size REAL NOT NULL CHECK (size > 0),
    unit TEXT NOT NULL,
    UNIQUE (family_key, size, unit)
);

CREATE TABLE IF NOT EXISTS store_items (
    store_item_id INTEGER PRIMARY KEY,
    store_id INTEGER NOT NULL REFERENCES stores(store_id),
    canonical_item_id INTEGER NOT NULL REFERENCES canonical_items(canonical_item_id),
    url TEXT NOT NULL,
    scraper TEXT NOT NULL,
    UNIQUE (store_id, canonical_item_id)
);

CREATE TABLE IF NOT EXISTS price_observations (
    store_item_id INTEGER NOT NULL REFERENCES store_items(store_item_id),
    observed_on TEXT NOT NULL,
    price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
    title_raw TEXT,
    PRIMARY KEY (store_item_id, observed_on)
);

CREATE INDEX IF NOT EXISTS idx_canonical_items_family
    ON canonical_items (family_key);

CREATE INDEX IF NOT EXISTS idx_price_observations_latest
    ON price_observations (store_item_id, observed_on DESC);

INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '1');

COMMIT;
";
