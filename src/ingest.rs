use log::{debug, info};

use crate::database::Database;
use crate::error::PriceError;
use crate::observations::PriceObservation;
use crate::scrapers::{FetchOptions, Scraped, ScraperKey};
use crate::store_items::TrackedItem;

/// Per-item result of one scrape run step. Extraction failures are data for
/// the summary, not errors; only storage faults abort the run.
#[derive(Clone, Debug)]
pub enum ItemOutcome {
    Inserted { price_cents: i64 },
    Skipped,
    Failed { cause: String },
}

/// One recorded per-item failure, with enough context to retry by hand.
#[derive(Clone, Debug)]
pub struct ScrapeFailure {
    pub store_name: String,
    pub pack_tag: String,
    pub scraper: String,
    pub url: String,
    pub cause: String,
}

#[derive(Debug, Default)]
pub struct ScrapeSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<ScrapeFailure>,
}

impl ScrapeSummary {
    fn record(&mut self, item: &TrackedItem, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Inserted { .. } => self.inserted += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed { cause } => {
                self.failed += 1;
                self.failures.push(ScrapeFailure {
                    store_name: item.store_name().to_owned(),
                    pack_tag: item.pack_tag(),
                    scraper: item.scraper().to_owned(),
                    url: item.url().to_owned(),
                    cause: cause.clone(),
                });
            }
        }
    }
}

pub struct ScrapeRun;

impl ScrapeRun {
    /// Scrape every tracked item for the given date. Items are processed
    /// one at a time, each observation insert in its own transaction, and a
    /// failing item never aborts the rest. The summary reports what happened;
    /// escalating failures to a fatal exit is the caller's decision.
    pub fn execute<F>(
        db: &mut Database,
        observed_on: &str,
        fetch: &FetchOptions,
        on_item: F,
    ) -> Result<ScrapeSummary, PriceError>
    where
        F: FnMut(&TrackedItem, &ItemOutcome),
    {
        Self::execute_with(
            db,
            observed_on,
            |item| {
                let key: ScraperKey = item.scraper().parse()?;
                key.scrape(item.url(), fetch)
            },
            on_item,
        )
    }

    /// Pipeline core, generic over the extractor so tests can substitute a
    /// canned one for the scraper registry.
    pub fn execute_with<E, F>(
        db: &mut Database,
        observed_on: &str,
        mut extract: E,
        mut on_item: F,
    ) -> Result<ScrapeSummary, PriceError>
    where
        E: FnMut(&TrackedItem) -> Result<Scraped, PriceError>,
        F: FnMut(&TrackedItem, &ItemOutcome),
    {
        let items = TrackedItem::list_all(db)?;
        info!("Scrape run for {observed_on}: {} tracked items", items.len());

        let mut summary = ScrapeSummary::default();

        for item in &items {
            let outcome = match extract(item) {
                Ok(scraped) => Self::store_observation(db, item, observed_on, &scraped)?,
                Err(err) => ItemOutcome::Failed {
                    cause: err.to_string(),
                },
            };

            debug!(
                "{} {}: {:?}",
                item.store_name(),
                item.pack_tag(),
                outcome
            );

            summary.record(item, &outcome);
            on_item(item, &outcome);
        }

        Ok(summary)
    }

    fn store_observation(
        db: &mut Database,
        item: &TrackedItem,
        observed_on: &str,
        scraped: &Scraped,
    ) -> Result<ItemOutcome, PriceError> {
        let tx = db.conn_mut().transaction()?;
        let inserted = PriceObservation::insert_daily_on(
            &tx,
            item.store_item_id(),
            observed_on,
            scraped.price_cents,
            Some(&scraped.title),
        )?;
        tx.commit()?;

        Ok(if inserted {
            ItemOutcome::Inserted {
                price_cents: scraped.price_cents,
            }
        } else {
            ItemOutcome::Skipped
        })
    }
}
