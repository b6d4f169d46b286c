use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::http::{self, FetchOptions};
use super::Scraped;
use crate::error::PriceError;

// SPAR search backend (JSON); far more stable than scraping the JS page
const SEARCH_ENDPOINT: &str =
    "https://search-spar.spar-ics.com/fact-finder/rest/v4/search/products_lmos_si";

// Product code is the digit tail of the URL's last path segment, "...-131036"
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\d+)$").unwrap());

pub fn scrape(url: &str, opts: &FetchOptions) -> Result<Scraped, PriceError> {
    let code = extract_code_from_url(url)?;
    let search_url = build_search_url(&code);

    let raw = http::fetch_text(&search_url, opts)?;
    let data: Value = serde_json::from_str(&raw)?;

    extract_from_hits(&data, &code, url)
}

fn extract_code_from_url(product_url: &str) -> Result<String, PriceError> {
    let parsed = reqwest::Url::parse(product_url)
        .map_err(|e| PriceError::Extraction(format!("invalid SPAR url: {e}")))?;

    let path = parsed.path().trim_end_matches('/');
    let last = path.rsplit('/').next().unwrap_or_default();

    CODE_RE
        .captures(last)
        .map(|captures| captures[1].to_owned())
        .ok_or_else(|| {
            PriceError::Extraction(
                "cannot extract product code from SPAR url (expected ...-<digits>)".to_string(),
            )
        })
}

fn build_search_url(code: &str) -> String {
    format!(
        "{SEARCH_ENDPOINT}?query={code}&q={code}&page=1&hitsPerPage=10\
         &substringFilter=pos-visible%3A81701"
    )
}

fn extract_from_hits(data: &Value, code: &str, product_url: &str) -> Result<Scraped, PriceError> {
    let hits = data
        .get("hits")
        .and_then(Value::as_array)
        .filter(|hits| !hits.is_empty())
        .ok_or_else(|| PriceError::Extraction("SPAR search API returned no hits".to_string()))?;

    let wanted_path = reqwest::Url::parse(product_url)
        .map(|u| u.path().trim_end_matches('/').to_owned())
        .unwrap_or_default();

    // Prefer the exact id match, then the hit whose url path matches,
    // then the first hit as a last resort
    let best_hit = hits
        .iter()
        .find(|hit| hit.get("id").map(value_as_code) == Some(code.to_owned()))
        .or_else(|| {
            hits.iter().find(|hit| {
                hit.get("masterValues")
                    .and_then(|mv| mv.get("url"))
                    .and_then(Value::as_str)
                    .map(|u| u.trim_end_matches('/') == wanted_path)
                    .unwrap_or(false)
            })
        })
        .unwrap_or(&hits[0]);

    let master_values = best_hit
        .get("masterValues")
        .and_then(Value::as_object)
        .ok_or_else(|| PriceError::Extraction("SPAR hit missing masterValues".to_string()))?;

    let price = master_values
        .get("best-price")
        .ok_or_else(|| {
            PriceError::Extraction("SPAR hit missing masterValues.best-price".to_string())
        })?;
    let price_cents = price_value_to_cents(price)?;

    let title = master_values
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("(unknown title)")
        .to_owned();

    Ok(Scraped { price_cents, title })
}

fn value_as_code(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn price_value_to_cents(price: &Value) -> Result<i64, PriceError> {
    match price {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i < 0 {
                    return Err(PriceError::Extraction("negative price parsed".to_string()));
                }
                Ok(i * 100)
            } else if let Some(f) = n.as_f64() {
                let cents = (f * 100.0).round() as i64;
                if cents < 0 {
                    return Err(PriceError::Extraction("negative price parsed".to_string()));
                }
                Ok(cents)
            } else {
                Err(PriceError::Extraction(format!(
                    "cannot parse price amount '{n}'"
                )))
            }
        }
        Value::String(s) => http::parse_eur_cents(s),
        other => Err(PriceError::Extraction(format!(
            "cannot parse price amount '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRODUCT_URL: &str = "https://www.spar.si/online/p/mleko-alpsko-3-5-131036";

    #[test]
    fn test_extract_code_from_url() {
        assert_eq!(extract_code_from_url(PRODUCT_URL).unwrap(), "131036");
        assert_eq!(
            extract_code_from_url("https://www.spar.si/online/p/jajca-10-kos-99001/").unwrap(),
            "99001"
        );
        assert!(extract_code_from_url("https://www.spar.si/online/p/no-code").is_err());
    }

    #[test]
    fn test_exact_id_match_wins() {
        let data = json!({
            "hits": [
                {"id": "999", "masterValues": {"best-price": 9.99, "title": "Wrong"}},
                {"id": "131036", "masterValues": {"best-price": 1.49, "title": "Alpsko mleko"}}
            ]
        });

        let scraped = extract_from_hits(&data, "131036", PRODUCT_URL).unwrap();
        assert_eq!(scraped.price_cents, 149);
        assert_eq!(scraped.title, "Alpsko mleko");
    }

    #[test]
    fn test_url_path_match_as_fallback() {
        let data = json!({
            "hits": [
                {"id": "999", "masterValues": {"best-price": 9.99, "title": "Wrong"}},
                {"id": "998", "masterValues": {
                    "best-price": "2,19",
                    "title": "Alpsko mleko",
                    "url": "/online/p/mleko-alpsko-3-5-131036"
                }}
            ]
        });

        let scraped = extract_from_hits(&data, "131036", PRODUCT_URL).unwrap();
        assert_eq!(scraped.price_cents, 219);
    }

    #[test]
    fn test_first_hit_as_last_resort() {
        let data = json!({
            "hits": [
                {"id": "999", "masterValues": {"best-price": 3, "title": "Only option"}}
            ]
        });

        let scraped = extract_from_hits(&data, "131036", PRODUCT_URL).unwrap();
        assert_eq!(scraped.price_cents, 300);
        assert_eq!(scraped.title, "Only option");
    }

    #[test]
    fn test_numeric_id_matches_code() {
        let data = json!({
            "hits": [
                {"id": "999", "masterValues": {"best-price": 9.99, "title": "Wrong"}},
                {"id": 131036, "masterValues": {"best-price": 1.49, "title": "Alpsko mleko"}}
            ]
        });

        let scraped = extract_from_hits(&data, "131036", PRODUCT_URL).unwrap();
        assert_eq!(scraped.price_cents, 149);
    }

    #[test]
    fn test_no_hits_is_extraction_error() {
        let data = json!({"hits": []});
        assert!(matches!(
            extract_from_hits(&data, "131036", PRODUCT_URL),
            Err(PriceError::Extraction(_))
        ));
    }

    #[test]
    fn test_missing_best_price_is_extraction_error() {
        let data = json!({
            "hits": [{"id": "131036", "masterValues": {"title": "No price"}}]
        });
        assert!(matches!(
            extract_from_hits(&data, "131036", PRODUCT_URL),
            Err(PriceError::Extraction(_))
        ));
    }
}
