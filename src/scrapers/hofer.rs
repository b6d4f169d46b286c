use once_cell::sync::Lazy;
use regex::Regex;

use super::http::{self, FetchOptions};
use super::Scraped;
use crate::error::PriceError;

// Matches "2,54 €" with regular or non-breaking whitespace before the sign
static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d{3})*,\d{2})\s*€").unwrap());

// Primary selector: the regular-price span in the product detail markup
static REGULAR_PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)class="base-price__regular"[^>]*>\s*<span>\s*([\d.,]+)\s*€\s*</span>"#)
        .unwrap()
});

pub fn scrape(url: &str, opts: &FetchOptions) -> Result<Scraped, PriceError> {
    let html = http::fetch_text(url, opts)?;
    let title = http::extract_title(&html);
    let price_cents = extract_price_cents(&html)?;

    Ok(Scraped { price_cents, title })
}

fn extract_price_cents(html: &str) -> Result<i64, PriceError> {
    if let Some(captures) = REGULAR_PRICE_RE.captures(html) {
        return http::parse_eur_cents(&captures[1]);
    }

    // Fallback: the last EUR amount on the page is usually the main price
    let last = PRICE_RE
        .captures_iter(html)
        .last()
        .ok_or_else(|| {
            PriceError::Extraction("no prices found in HTML (layout probably changed)".to_string())
        })?;

    http::parse_eur_cents(&last[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_selector_wins() {
        let html = r#"
            <span>9,99 €</span>
            <div class="base-price__regular" data-x="1"> <span> 2,54 € </span></div>
            <span>4,49 €</span>"#;
        assert_eq!(extract_price_cents(html).unwrap(), 254);
    }

    #[test]
    fn test_fallback_takes_last_price() {
        let html = "<span>9,99 €</span> <span>2,54 €</span>";
        assert_eq!(extract_price_cents(html).unwrap(), 254);
    }

    #[test]
    fn test_no_prices_is_extraction_error() {
        assert!(matches!(
            extract_price_cents("<html>no prices here</html>"),
            Err(PriceError::Extraction(_))
        ));
    }
}
