//! Price snapshot types

use crate::catalog::{self, Instrument};
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Istanbul;
use serde::Serialize;

/// Which catalog of the feed a quote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedCatalog {
    Metals,
    Currencies,
}

/// A single published price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub code: String,
    pub description: String,
    pub buy: f64,
    pub sell: f64,
    /// Raw update time as published by the feed
    pub last_updated: Option<String>,
    /// `last_updated` interpreted as Istanbul local time, when recognizable
    pub last_updated_utc: Option<DateTime<Utc>>,
}

impl PriceQuote {
    pub fn new(
        code: &str,
        description: &str,
        buy_text: &str,
        sell_text: &str,
        last_updated: Option<String>,
    ) -> Self {
        let last_updated_utc = last_updated.as_deref().and_then(parse_feed_timestamp);
        Self {
            code: code.trim().to_string(),
            description: description.trim().to_string(),
            buy: parse_price_text(buy_text),
            sell: parse_price_text(sell_text),
            last_updated,
            last_updated_utc,
        }
    }
}

/// Immutable result of one fetch: metals and currencies, kept apart
#[derive(Debug, Clone, Serialize)]
pub struct PriceSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub source: String,
    pub metals: Vec<PriceQuote>,
    pub currencies: Vec<PriceQuote>,
}

impl PriceSnapshot {
    pub fn new(source: &str, metals: Vec<PriceQuote>, currencies: Vec<PriceQuote>) -> Self {
        Self {
            fetched_at: Utc::now(),
            source: source.to_string(),
            metals,
            currencies,
        }
    }

    /// Find the quote for a code, metals first.
    ///
    /// A code published in both catalogs resolves to the metals entry.
    pub fn find_quote(&self, code: &str) -> Option<(FeedCatalog, &PriceQuote)> {
        let code = catalog::normalize_code(code);

        self.metals
            .iter()
            .find(|q| q.code.to_uppercase() == code)
            .map(|q| (FeedCatalog::Metals, q))
            .or_else(|| {
                self.currencies
                    .iter()
                    .find(|q| q.code.to_uppercase() == code)
                    .map(|q| (FeedCatalog::Currencies, q))
            })
    }

    /// Resolve the buy price for a code
    pub fn resolve_price(&self, code: &str) -> Result<f64> {
        self.find_quote(code)
            .map(|(_, quote)| quote.buy)
            .ok_or_else(|| AppError::CodeNotFound(code.trim().to_string()))
    }

    /// Every quote, metals then currencies
    pub fn all_quotes(&self) -> impl Iterator<Item = (FeedCatalog, &PriceQuote)> {
        self.metals
            .iter()
            .map(|q| (FeedCatalog::Metals, q))
            .chain(self.currencies.iter().map(|q| (FeedCatalog::Currencies, q)))
    }

    /// Catalog instruments the snapshot does not publish
    pub fn missing_instruments(&self) -> Vec<&'static Instrument> {
        catalog::CATALOG
            .iter()
            .filter(|i| self.find_quote(i.code).is_none())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.metals.len() + self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a published price.
///
/// Plain decimals (`4342.4900`) parse directly. Otherwise the text is read as
/// dot-grouped with a decimal comma (`4.342,49`). Anything else is 0, which
/// callers must read as "unknown".
pub fn parse_price_text(text: &str) -> f64 {
    let text = text.trim();

    let parsed = text.parse::<f64>().ok().or_else(|| {
        text.replace('.', "")
            .replace(',', ".")
            .parse::<f64>()
            .ok()
    });

    match parsed {
        Some(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

const FEED_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Interpret a feed timestamp as Istanbul local time
pub fn parse_feed_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.with_timezone(&Utc));
    }

    FEED_TIMESTAMP_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(text, format).ok()?;
        Istanbul
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(code: &str, buy: &str) -> PriceQuote {
        PriceQuote::new(code, code, buy, buy, None)
    }

    #[test]
    fn test_parse_price_text() {
        assert_eq!(parse_price_text("4342.4900"), 4342.49);
        assert_eq!(parse_price_text("4.342,49"), 4342.49);
        assert_eq!(parse_price_text(" 38,12 "), 38.12);
        assert_eq!(parse_price_text("abc"), 0.0);
        assert_eq!(parse_price_text(""), 0.0);
        assert_eq!(parse_price_text("NaN"), 0.0);
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_trimmed() {
        let snapshot = PriceSnapshot::new("test", vec![quote("GA", "2450.10")], vec![]);
        assert_eq!(snapshot.resolve_price("  ga ").unwrap(), 2450.10);
    }

    #[test]
    fn test_metals_win_over_currencies() {
        let snapshot = PriceSnapshot::new(
            "test",
            vec![quote("DUP", "100")],
            vec![quote("DUP", "200"), quote("USD", "32.5")],
        );

        assert_eq!(snapshot.resolve_price("DUP").unwrap(), 100.0);
        assert_eq!(snapshot.find_quote("DUP").unwrap().0, FeedCatalog::Metals);
        assert_eq!(snapshot.resolve_price("usd").unwrap(), 32.5);
    }

    #[test]
    fn test_unknown_code() {
        let snapshot = PriceSnapshot::new("test", vec![quote("GA", "1")], vec![]);
        assert!(matches!(
            snapshot.resolve_price("XAU"),
            Err(AppError::CodeNotFound(code)) if code == "XAU"
        ));
    }

    #[test]
    fn test_all_quotes_and_missing_instruments() {
        let snapshot = PriceSnapshot::new(
            "test",
            vec![quote("GA", "1"), quote("C", "2")],
            vec![quote("USD", "3")],
        );

        let codes: Vec<&str> = snapshot.all_quotes().map(|(_, q)| q.code.as_str()).collect();
        assert_eq!(codes, vec!["GA", "C", "USD"]);
        assert_eq!(snapshot.len(), 3);

        let missing: Vec<&str> = snapshot.missing_instruments().iter().map(|i| i.code).collect();
        assert!(missing.contains(&"EUR"));
        assert!(!missing.contains(&"GA"));
    }

    #[test]
    fn test_feed_timestamp_is_istanbul_time() {
        let parsed = parse_feed_timestamp("2024-05-10 14:30:00").unwrap();
        // Istanbul is UTC+3 all year
        assert_eq!(parsed.to_rfc3339(), "2024-05-10T11:30:00+00:00");

        assert!(parse_feed_timestamp("10.05.2024 14:30:00").is_some());
        assert!(parse_feed_timestamp("yesterday").is_none());
    }
}
