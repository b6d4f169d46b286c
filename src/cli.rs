use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;

use crate::catalog::CanonicalItem;
use crate::cheapest::CheapestReport;
use crate::config::Config;
use crate::database::Database;
use crate::error::PriceError;
use crate::ingest::ScrapeRun;
use crate::observations::PricePoint;
use crate::reports::Reports;
use crate::scrapers::{FetchOptions, ScraperKey};
use crate::shopping::{ShoppingList, StoreComparison};
use crate::store_items::StoreItem;
use crate::stores::Store;
use crate::trend::PackTrend;

#[derive(Parser)]
#[command(
    name = "pricepulse",
    version,
    about = "Grocery price tracker: scrape retailer prices and compare per-unit costs across stores"
)]
pub struct Cli {
    /// Path to the sqlite database file
    #[arg(long = "db", global = true, default_value = "data/prices.sqlite")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize the database schema
    InitDb,

    /// Track a product URL and map it to a canonical pack
    Track {
        /// Store name, e.g. Hofer or Mercator
        #[arg(long)]
        store: String,

        /// Product page URL
        #[arg(long)]
        url: String,

        /// Scraper key: hofer | lidl | mercator | spar
        #[arg(long)]
        scraper: String,

        /// Family key, e.g. milk or olive_oil
        #[arg(long = "key")]
        family_key: String,

        /// Canonical label, e.g. "Mleko 3.5% 1L"
        #[arg(long)]
        label: String,

        /// Canonical pack size (number), e.g. 1 or 500
        #[arg(long)]
        size: f64,

        /// Canonical unit, e.g. l, ml, kg, g, pcs
        #[arg(long)]
        unit: String,
    },

    /// Scrape all tracked URLs and record daily price observations
    ScrapeAll {
        /// Override observed_on (YYYY-MM-DD). Default: today
        #[arg(long)]
        date: Option<String>,

        /// DEV ONLY: disable TLS certificate verification
        #[arg(long = "insecure-tls")]
        insecure_tls: bool,

        /// Treat any per-item failure as a fatal run failure
        #[arg(long)]
        strict: bool,
    },

    /// Show price history for a family key
    History {
        /// Family key, e.g. milk or olive_oil
        #[arg(long = "key")]
        family_key: String,

        /// Show normalized unit prices (€/l, €/kg, €/pcs)
        #[arg(long)]
        normalized: bool,

        /// Show trend vs the previous observation (per store+pack)
        #[arg(long)]
        trend: bool,

        /// Include the raw scraped title in output
        #[arg(long = "show-title")]
        show_title: bool,
    },

    /// Show the cheapest current option for a family key
    Cheapest {
        /// Family key, e.g. milk or olive_oil
        #[arg(long = "key")]
        family_key: String,

        /// Show the latest option per store too
        #[arg(long = "show-all")]
        show_all: bool,

        /// Print the URL of the cheapest entry
        #[arg(long = "show-url")]
        show_url: bool,

        /// Print the raw scraped title of the cheapest entry
        #[arg(long = "show-title")]
        show_title: bool,
    },

    /// Compare a shopping list across stores
    Compare {
        /// Path to a JSON shopping list: [{"family_key": "...", "quantity": N}]
        #[arg(long)]
        list: PathBuf,
    },
}

impl Cli {
    pub fn handle_command_line() -> Result<(), PriceError> {
        let args = Cli::parse();
        let mut db = Database::open(&args.db)?;

        match args.command {
            Command::InitDb => {
                println!("OK: initialized db at {}", args.db.display());
                Ok(())
            }
            Command::Track {
                store,
                url,
                scraper,
                family_key,
                label,
                size,
                unit,
            } => Self::track(&db, &store, &url, &scraper, &family_key, &label, size, &unit),
            Command::ScrapeAll {
                date,
                insecure_tls,
                strict,
            } => Self::scrape_all(&mut db, date.as_deref(), insecure_tls, strict),
            Command::History {
                family_key,
                normalized,
                trend,
                show_title,
            } => Self::history(&db, &family_key, normalized, trend, show_title),
            Command::Cheapest {
                family_key,
                show_all,
                show_url,
                show_title,
            } => Self::cheapest(&db, &family_key, show_all, show_url, show_title),
            Command::Compare { list } => Self::compare(&db, &list),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn track(
        db: &Database,
        store: &str,
        url: &str,
        scraper: &str,
        family_key: &str,
        label: &str,
        size: f64,
        unit: &str,
    ) -> Result<(), PriceError> {
        // Reject unknown scraper keys up front: a bad key is a configuration
        // error, not something to discover on the next scrape run
        let scraper_key: ScraperKey = scraper.parse()?;

        let store = Store::get_or_create(db, store)?;
        let item = CanonicalItem::upsert(db, family_key, label, size, unit)?;
        let mapping = StoreItem::upsert_mapping(
            db,
            store.store_id(),
            item.canonical_item_id(),
            url,
            scraper_key.as_str(),
        )?;

        println!(
            "OK: tracked store_item_id={} store={} family={} pack={}{} label={} scraper={} url={}",
            mapping.store_item_id(),
            store.name(),
            item.family_key(),
            item.size(),
            item.unit(),
            item.label(),
            mapping.scraper(),
            mapping.url()
        );

        Ok(())
    }

    fn scrape_all(
        db: &mut Database,
        date: Option<&str>,
        insecure_tls: bool,
        strict: bool,
    ) -> Result<(), PriceError> {
        let observed_on = match date {
            Some(date) => NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")?,
            None => Local::now().date_naive(),
        }
        .to_string();

        let config = Config::get();
        let fetch = FetchOptions {
            timeout: config.http.timeout(),
            verify_tls: config.http.verify_tls() && !insecure_tls,
        };

        let summary = ScrapeRun::execute(db, &observed_on, &fetch, |item, outcome| {
            Reports::print_scrape_line(&observed_on, item, outcome);
        })?;

        if summary.inserted == 0 && summary.skipped == 0 && summary.failed == 0 {
            println!("No tracked store items. Use track first.");
            return Ok(());
        }

        Reports::print_scrape_summary(&summary);
        info!(
            "Scrape run complete: inserted={} skipped={} failed={}",
            summary.inserted, summary.skipped, summary.failed
        );

        if strict && summary.failed > 0 {
            return Err(PriceError::Error(format!(
                "{} item(s) failed during scrape run",
                summary.failed
            )));
        }

        Ok(())
    }

    fn history(
        db: &Database,
        family_key: &str,
        normalized: bool,
        trend: bool,
        show_title: bool,
    ) -> Result<(), PriceError> {
        let points = PricePoint::history_for_family(db, family_key)?;
        if points.is_empty() {
            let packs = CanonicalItem::packs_for_family(db, family_key)?;
            if packs.is_empty() {
                println!("No history for family key={family_key}");
            } else {
                println!("No observations yet for family key={family_key}. Known packs:");
                for pack in &packs {
                    println!("  {} ({}{})", pack.label(), pack.size(), pack.unit());
                }
            }
            return Ok(());
        }

        if trend {
            let trends = PackTrend::for_family(db, family_key)?;
            Reports::print_trends(family_key, &trends, normalized);
        }

        Reports::print_history(family_key, &points, normalized, show_title);
        Ok(())
    }

    fn cheapest(
        db: &Database,
        family_key: &str,
        show_all: bool,
        show_url: bool,
        show_title: bool,
    ) -> Result<(), PriceError> {
        let report = CheapestReport::for_family(db, family_key)?;
        if report.is_empty() {
            println!("No tracked store items for family key={family_key} (use track).");
            return Ok(());
        }

        Reports::print_cheapest(family_key, &report, show_all, show_url, show_title);
        Ok(())
    }

    fn compare(db: &Database, list_path: &std::path::Path) -> Result<(), PriceError> {
        let list = ShoppingList::load(list_path)?;
        if list.is_empty() {
            println!(
                "Shopping list {} has no usable entries.",
                list_path.display()
            );
            return Ok(());
        }

        let comparisons = StoreComparison::compare(db, &list)?;
        if comparisons.is_empty() {
            println!("No stores in database. Use track first.");
            return Ok(());
        }

        Reports::print_comparison(&list, &comparisons);
        Ok(())
    }
}
