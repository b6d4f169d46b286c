use std::fmt;
use std::str::FromStr;

use crate::error::PriceError;

pub mod hofer;
pub mod http;
pub mod lidl;
pub mod mercator;
pub mod spar;

pub use http::FetchOptions;

/// A successful extraction: the price in cents and the raw product title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scraped {
    pub price_cents: i64,
    pub title: String,
}

/// The closed set of supported retailers. Scraper keys stored on a tracked
/// item resolve to exactly one of these; anything else is a configuration
/// error, not a data error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScraperKey {
    Mercator,
    Hofer,
    Lidl,
    Spar,
}

impl ScraperKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScraperKey::Mercator => "mercator",
            ScraperKey::Hofer => "hofer",
            ScraperKey::Lidl => "lidl",
            ScraperKey::Spar => "spar",
        }
    }

    pub fn scrape(&self, url: &str, opts: &FetchOptions) -> Result<Scraped, PriceError> {
        match self {
            ScraperKey::Mercator => mercator::scrape(url, opts),
            ScraperKey::Hofer => hofer::scrape(url, opts),
            ScraperKey::Lidl => lidl::scrape(url, opts),
            ScraperKey::Spar => spar::scrape(url, opts),
        }
    }
}

impl fmt::Display for ScraperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScraperKey {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mercator" => Ok(ScraperKey::Mercator),
            "hofer" => Ok(ScraperKey::Hofer),
            "lidl" => Ok(ScraperKey::Lidl),
            "spar" => Ok(ScraperKey::Spar),
            other => Err(PriceError::Validation(format!(
                "unknown scraper '{other}'. Expected: hofer | lidl | mercator | spar"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraper_key_from_str() {
        assert_eq!("mercator".parse::<ScraperKey>().unwrap(), ScraperKey::Mercator);
        assert_eq!(" HOFER ".parse::<ScraperKey>().unwrap(), ScraperKey::Hofer);
        assert_eq!("lidl".parse::<ScraperKey>().unwrap(), ScraperKey::Lidl);
        assert_eq!("spar".parse::<ScraperKey>().unwrap(), ScraperKey::Spar);
        assert!("tus".parse::<ScraperKey>().is_err());
        assert!("".parse::<ScraperKey>().is_err());
    }

    #[test]
    fn test_scraper_key_round_trip() {
        for key in [
            ScraperKey::Mercator,
            ScraperKey::Hofer,
            ScraperKey::Lidl,
            ScraperKey::Spar,
        ] {
            assert_eq!(key.as_str().parse::<ScraperKey>().unwrap(), key);
        }
    }
}
