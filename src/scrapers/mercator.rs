use once_cell::sync::Lazy;
use regex::Regex;

use super::http::{self, FetchOptions};
use super::Scraped;
use crate::error::PriceError;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d{3})*,\d{2})\s*€").unwrap());

// The unit-price block sits close to the main price in the rendered page
const UNIT_PRICE_MARKER: &str = "Cena na enoto";
const SEARCH_WINDOW: usize = 2000;

pub fn scrape(url: &str, opts: &FetchOptions) -> Result<Scraped, PriceError> {
    let html = http::fetch_text(url, opts)?;
    let title = http::extract_title(&html);
    let price_cents = extract_price_cents(&html)?;

    Ok(Scraped { price_cents, title })
}

/// Collect every EUR amount in the window after the unit-price marker and
/// take the minimum: the main price is lower than the per-unit price shown
/// next to it.
fn extract_price_cents(html: &str) -> Result<i64, PriceError> {
    let idx = html.find(UNIT_PRICE_MARKER).ok_or_else(|| {
        PriceError::Extraction(
            "no unit-price block on page (layout probably changed)".to_string(),
        )
    })?;

    let mut end = (idx + SEARCH_WINDOW).min(html.len());
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    let tail = &html[idx..end];

    let mut prices = Vec::new();
    for captures in PRICE_RE.captures_iter(tail) {
        prices.push(http::parse_eur_cents(&captures[1])?);
    }

    prices.into_iter().min().ok_or_else(|| {
        PriceError::Extraction("no prices found in HTML (layout probably changed)".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takes_minimum_price_after_marker() {
        let html = "\
            <div>Cena na enoto</div>\
            <span>2,39 €/l</span>\
            <span>1,19 €</span>";
        assert_eq!(extract_price_cents(html).unwrap(), 119);
    }

    #[test]
    fn test_ignores_prices_before_marker() {
        let html = "\
            <span>0,99 €</span>\
            <div>Cena na enoto</div>\
            <span>2,39 €</span>";
        assert_eq!(extract_price_cents(html).unwrap(), 239);
    }

    #[test]
    fn test_thousands_separator() {
        let html = "Cena na enoto <b>1.299,00 €</b>";
        assert_eq!(extract_price_cents(html).unwrap(), 129900);
    }

    #[test]
    fn test_missing_marker_is_extraction_error() {
        let result = extract_price_cents("<html>3,49 €</html>");
        assert!(matches!(result, Err(PriceError::Extraction(_))));
    }

    #[test]
    fn test_marker_without_prices_is_extraction_error() {
        let result = extract_price_cents("Cena na enoto <span>n/a</span>");
        assert!(matches!(result, Err(PriceError::Extraction(_))));
    }
}
