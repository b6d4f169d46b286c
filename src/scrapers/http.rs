use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PriceError;

const USER_AGENT: &str = "Mozilla/5.0 (pricepulse; educational project)";
const ACCEPT_LANGUAGE: &str = "sl-SI,sl;q=0.9,en;q=0.8";

/// Fetch behavior supplied by the caller: the pipeline owns no timeout
/// policy of its own.
#[derive(Clone, Copy, Debug)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            timeout: Duration::from_secs(20),
            verify_tls: true,
        }
    }
}

pub fn fetch_text(url: &str, opts: &FetchOptions) -> Result<String, PriceError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(opts.timeout)
        .danger_accept_invalid_certs(!opts.verify_tls)
        .user_agent(USER_AGENT)
        .build()?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
        .send()?
        .error_for_status()?;

    Ok(response.text()?)
}

// og:title attributes are not always in the same order
static OG_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property=["']og:title["'][^>]+content=["']([^"']+)["']"#).unwrap()
});
static OG_TITLE_REVERSED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+property=["']og:title["']"#).unwrap()
});
static TITLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title>\s*(.*?)\s*</title>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Product title from og:title, falling back to the <title> tag.
pub fn extract_title(html: &str) -> String {
    let og = OG_TITLE_RE
        .captures(html)
        .or_else(|| OG_TITLE_REVERSED_RE.captures(html));
    if let Some(captures) = og {
        return captures[1].trim().to_owned();
    }

    if let Some(captures) = TITLE_TAG_RE.captures(html) {
        return WHITESPACE_RE.replace_all(&captures[1], " ").trim().to_owned();
    }

    "(unknown title)".to_owned()
}

/// Parse a scraped EUR amount into cents with integer arithmetic.
///
/// Accepts the "1.234,56" and "5,29" comma-decimal forms as well as the
/// "5.29" dot-decimal form; separators other than the final two-digit
/// decimal group are treated as thousands separators.
pub fn parse_eur_cents(raw: &str) -> Result<i64, PriceError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.starts_with('-') {
        return Err(PriceError::Extraction("negative price parsed".to_string()));
    }

    let (int_digits, frac_digits) = match cleaned.rfind([',', '.']) {
        Some(pos) if cleaned.len() - pos - 1 == 2 => {
            (cleaned[..pos].to_owned(), cleaned[pos + 1..].to_owned())
        }
        _ => (cleaned.clone(), "00".to_owned()),
    };

    let int_digits: String = int_digits.chars().filter(|c| c.is_ascii_digit()).collect();

    if int_digits.is_empty() || !frac_digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PriceError::Extraction(format!(
            "cannot parse price amount '{raw}'"
        )));
    }

    let euros: i64 = int_digits
        .parse()
        .map_err(|_| PriceError::Extraction(format!("cannot parse price amount '{raw}'")))?;
    let cents: i64 = frac_digits
        .parse()
        .map_err(|_| PriceError::Extraction(format!("cannot parse price amount '{raw}'")))?;

    Ok(euros * 100 + cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_decimal() {
        assert_eq!(parse_eur_cents("5,29").unwrap(), 529);
        assert_eq!(parse_eur_cents("11,99").unwrap(), 1199);
    }

    #[test]
    fn test_parse_thousands_with_comma_decimal() {
        assert_eq!(parse_eur_cents("1.234,56").unwrap(), 123456);
    }

    #[test]
    fn test_parse_dot_decimal() {
        assert_eq!(parse_eur_cents("5.29").unwrap(), 529);
    }

    #[test]
    fn test_parse_whole_euros() {
        assert_eq!(parse_eur_cents("7").unwrap(), 700);
        // "1.234" has a three-digit group: thousands, not a decimal
        assert_eq!(parse_eur_cents("1.234").unwrap(), 123400);
    }

    #[test]
    fn test_parse_rejects_garbage_and_negatives() {
        assert!(parse_eur_cents("").is_err());
        assert!(parse_eur_cents("abc").is_err());
        assert!(parse_eur_cents("-5,29").is_err());
    }

    #[test]
    fn test_extract_title_from_og_meta() {
        let html = r#"<meta property="og:title" content="Mleko 3.5% 1L" />"#;
        assert_eq!(extract_title(html), "Mleko 3.5% 1L");
    }

    #[test]
    fn test_extract_title_from_og_meta_reversed_attributes() {
        let html = r#"<meta content="Mleko 3.5% 1L" property="og:title" />"#;
        assert_eq!(extract_title(html), "Mleko 3.5% 1L");
    }

    #[test]
    fn test_extract_title_falls_back_to_title_tag() {
        let html = "<html><head><title>\n  Jajca  10\n kos </title></head></html>";
        assert_eq!(extract_title(html), "Jajca 10 kos");
    }

    #[test]
    fn test_extract_title_unknown() {
        assert_eq!(extract_title("<html></html>"), "(unknown title)");
    }
}
