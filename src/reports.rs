use crate::cheapest::CheapestReport;
use crate::ingest::{ItemOutcome, ScrapeSummary};
use crate::observations::PricePoint;
use crate::shopping::{ShoppingList, StoreComparison};
use crate::store_items::TrackedItem;
use crate::trend::PackTrend;
use crate::units::normalize;

const RULE_WIDTH: usize = 110;

pub struct Reports {
    // No fields
}

impl Reports {
    fn rule() {
        println!("{}", "-".repeat(RULE_WIDTH));
    }

    fn eur(cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.abs();
        format!("{sign}{}.{:02}", cents / 100, cents % 100)
    }

    fn pack(size: f64, unit: &str) -> String {
        format!("{size}{unit}")
    }

    pub fn print_scrape_line(observed_on: &str, item: &TrackedItem, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Inserted { price_cents } => println!(
                "[INSERT] {observed_on} {} {}: {price_cents}c",
                item.store_name(),
                item.pack_tag()
            ),
            ItemOutcome::Skipped => println!(
                "[SKIP]   {observed_on} {} {}: already observed",
                item.store_name(),
                item.pack_tag()
            ),
            ItemOutcome::Failed { cause } => println!(
                "[FAIL]   {} {} ({}) {} :: {cause}",
                item.store_name(),
                item.pack_tag(),
                item.scraper(),
                item.url()
            ),
        }
    }

    pub fn print_scrape_summary(summary: &ScrapeSummary) {
        println!(
            "Done. inserted={} skipped={} failed={}",
            summary.inserted, summary.skipped, summary.failed
        );
    }

    pub fn print_history(family_key: &str, points: &[PricePoint], normalized: bool, show_title: bool) {
        println!("History for {family_key} (rows={})", points.len());
        Self::rule();

        for point in points {
            let mut line = format!(
                "{}  {:<10}  {:<6}  {:>7} €  {}",
                point.observed_on,
                point.store_name,
                Self::pack(point.size, &point.unit),
                Self::eur(point.price_cents),
                point.label
            );

            if normalized {
                if let Some(up) = normalize(point.price_cents, point.size, &point.unit) {
                    line.push_str(&format!("  ({:.2} €/{})", up.eur_per_unit, up.unit));
                }
            }
            if show_title {
                if let Some(title) = point.title_raw.as_deref() {
                    line.push_str(&format!("  |  {}", title.trim()));
                }
            }

            println!("{line}");
        }
    }

    pub fn print_trends(family_key: &str, trends: &[PackTrend], normalized: bool) {
        println!("Trend for {family_key} (two most recent observations per store+pack)");
        Self::rule();

        for pack in trends {
            let mut line = match &pack.movement {
                Some(movement) => {
                    let trend = &movement.trend;
                    let delta_sign = if trend.delta_cents > 0 { "+" } else { "" };
                    format!(
                        "{:<10} {:<6} {:<45}  {} {:>7} €  {delta_sign}{} €  ({:+.1}%)  [{}→{}]",
                        pack.store_name,
                        Self::pack(pack.size, &pack.unit),
                        pack.label,
                        trend.arrow.as_str(),
                        Self::eur(pack.latest_cents),
                        Self::eur(trend.delta_cents),
                        trend.pct,
                        movement.prev_on,
                        pack.latest_on
                    )
                }
                None => format!(
                    "{:<10} {:<6} {:<45}  n/a  last={:>7} €  [{}]",
                    pack.store_name,
                    Self::pack(pack.size, &pack.unit),
                    pack.label,
                    Self::eur(pack.latest_cents),
                    pack.latest_on
                ),
            };

            if normalized {
                if let Some(up) = pack.latest_normalized() {
                    line.push_str(&format!("  ({:.2} €/{})", up.eur_per_unit, up.unit));
                }
            }

            println!("{line}");
        }

        Self::rule();
    }

    pub fn print_cheapest(
        family_key: &str,
        report: &CheapestReport,
        show_all: bool,
        show_url: bool,
        show_title: bool,
    ) {
        let best = match report.best() {
            Some(best) => best,
            None => {
                println!("No observations yet for family key={family_key}.");
                if !report.missing.is_empty() {
                    println!("Missing: {}", report.missing.join(", "));
                }
                return;
            }
        };

        println!("Cheapest for {family_key} (by €/{})", best.sort_unit);
        if report.mixed_units {
            println!(
                "Note: family mixes supported and unsupported units; raw pack prices \
                 are compared for the unsupported ones."
            );
        }
        Self::rule();
        Self::print_choice_line(best);

        if show_url {
            println!("url: {}", best.url);
        }
        if show_title {
            if let Some(title) = best.title_raw.as_deref() {
                println!("title: {}", title.trim());
            }
        }

        if show_all {
            Self::rule();
            println!("Latest options:");
            for option in &report.options {
                Self::print_choice_line(option);
            }
        }

        if !report.missing.is_empty() {
            Self::rule();
            println!(
                "Missing (tracked but no observations yet): {}",
                report.missing.join(", ")
            );
        }
    }

    fn print_choice_line(choice: &crate::cheapest::PriceChoice) {
        let weaker = if choice.normalized { "" } else { " [raw price]" };
        println!(
            "{:<10}  {:<6}  {:>7} €  {:<45}  ({:.2} €/{}){weaker}  [{}]",
            choice.store_name,
            Self::pack(choice.size, &choice.unit),
            Self::eur(choice.price_cents),
            choice.label,
            choice.sort_value_eur,
            choice.sort_unit,
            choice.observed_on
        );
    }

    pub fn print_comparison(list: &ShoppingList, comparisons: &[StoreComparison]) {
        println!(
            "Shopping list comparison ({} items, ranked by missing count then total)",
            list.entries().len()
        );
        Self::rule();

        for (rank, store) in comparisons.iter().enumerate() {
            println!(
                "#{} {:<10}  total {:>8} €  (missing {} of {})",
                rank + 1,
                store.store_name,
                Self::eur(store.total_cents),
                store.missing.len(),
                list.entries().len()
            );

            for line in &store.lines {
                let norm = if line.comparison.supported {
                    format!("{:.2} €/{}", line.comparison.value_eur, line.comparison.unit_label)
                } else {
                    format!("raw €/{}", line.comparison.unit_label)
                };
                println!(
                    "    {:<14} {:<6} {:<40}  {} × {:>7} € = {:>8} €  ({norm})",
                    line.family_key,
                    Self::pack(line.size, &line.unit),
                    line.label,
                    line.quantity,
                    Self::eur(line.pack_price_cents),
                    Self::eur(line.line_total_cents)
                );
            }

            if !store.missing.is_empty() {
                println!("    missing: {}", store.missing.join(", "));
            }
        }

        Self::rule();
    }
}
