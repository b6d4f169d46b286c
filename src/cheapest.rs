use crate::database::Database;
use crate::error::PriceError;
use crate::observations::LatestOption;
use crate::units::comparison_value;

/// One store's latest priced pack for a family, keyed for comparison by its
/// normalized unit price (or the raw pack price when the unit is
/// unsupported - a weaker comparison the report calls out).
#[derive(Clone, Debug)]
pub struct PriceChoice {
    pub store_name: String,
    pub label: String,
    pub size: f64,
    pub unit: String,
    pub url: String,
    pub observed_on: String,
    pub price_cents: i64,
    pub title_raw: Option<String>,
    pub sort_value_eur: f64,
    pub sort_unit: String,
    pub normalized: bool,
}

/// Cheapest-option report for one family: every priced option sorted
/// ascending by normalized value, plus the tracked-but-unobserved packs.
#[derive(Clone, Debug)]
pub struct CheapestReport {
    pub options: Vec<PriceChoice>,
    pub missing: Vec<String>,
    pub mixed_units: bool,
}

impl CheapestReport {
    pub fn for_family(db: &Database, family_key: &str) -> Result<Self, PriceError> {
        let latest = LatestOption::for_family(db, family_key)?;

        let mut options = Vec::new();
        let mut missing = Vec::new();

        for opt in latest {
            let price_cents = match opt.price_cents {
                Some(price_cents) => price_cents,
                None => {
                    missing.push(opt.pack_tag());
                    continue;
                }
            };

            let cv = comparison_value(price_cents, opt.size, &opt.unit);

            options.push(PriceChoice {
                store_name: opt.store_name,
                label: opt.label,
                size: opt.size,
                unit: opt.unit,
                url: opt.url,
                observed_on: opt.observed_on.unwrap_or_default(),
                price_cents,
                title_raw: opt.title_raw,
                sort_value_eur: cv.value_eur,
                sort_unit: cv.unit_label,
                normalized: cv.supported,
            });
        }

        options.sort_by(|a, b| a.sort_value_eur.total_cmp(&b.sort_value_eur));

        missing.sort();
        missing.dedup();

        let mixed_units = options.iter().any(|o| o.normalized)
            && options.iter().any(|o| !o.normalized);

        Ok(CheapestReport {
            options,
            missing,
            mixed_units,
        })
    }

    pub fn best(&self) -> Option<&PriceChoice> {
        self.options.first()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.missing.is_empty()
    }
}
