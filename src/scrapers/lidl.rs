use once_cell::sync::Lazy;
use regex::Regex;

use super::http::{self, FetchOptions};
use super::Scraped;
use crate::error::PriceError;

// Matches "5.29€", "5.29 €", "5,29€", with an optional promo asterisk
static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,3}(?:[.,]\d{3})*[.,]\d{2})\s*€\*?").unwrap());

pub fn scrape(url: &str, opts: &FetchOptions) -> Result<Scraped, PriceError> {
    let html = http::fetch_text(url, opts)?;
    let title = http::extract_title(&html);
    let price_cents = extract_price_cents(&html)?;

    Ok(Scraped { price_cents, title })
}

/// Lidl pages often show the old (higher) and promo (lower) price side by
/// side; the minimum is the price you pay.
fn extract_price_cents(html: &str) -> Result<i64, PriceError> {
    let mut prices = Vec::new();
    for captures in PRICE_RE.captures_iter(html) {
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
    fn test_takes_minimum_of_old_and_promo_price() {
        let html = r#"<s>6,49 €</s> <strong>5,29 €*</strong>"#;
        assert_eq!(extract_price_cents(html).unwrap(), 529);
    }

    #[test]
    fn test_dot_decimal_form() {
        let html = "<span>5.29€</span>";
        assert_eq!(extract_price_cents(html).unwrap(), 529);
    }

    #[test]
    fn test_no_prices_is_extraction_error() {
        assert!(matches!(
            extract_price_cents("<html>sold out</html>"),
            Err(PriceError::Extraction(_))
        ));
    }
}
