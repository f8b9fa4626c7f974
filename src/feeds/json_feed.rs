//! JSON REST price feed adapter
//!
//! Each catalog is a JSON array of records:
//! `{"Kod": "GA", "Aciklama": "...", "Alis": "2450.10", "Satis": "2460.30",
//!   "GuncellenmeZamani": "2024-05-10T14:30:00", ...}`

use crate::config::FeedConfig;
use crate::error::{AppError, Result};
use crate::feeds::http::FeedHttpClient;
use crate::feeds::types::{PriceQuote, PriceSnapshot};
use crate::feeds::PriceFeed;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// JSON feed implementation
pub struct JsonFeed {
    http: FeedHttpClient,
    metals_path: String,
    currencies_path: String,
}

impl JsonFeed {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            http: FeedHttpClient::new(config.base_url.clone(), config.timeout, "application/json")?,
            metals_path: config.metals_path.clone(),
            currencies_path: config.currencies_path.clone(),
        })
    }

    async fn fetch_catalog(&self, path: &str) -> Result<Vec<PriceQuote>> {
        let body = self.http.get_text(path).await?;
        let quotes = decode_quotes(&body)
            .map_err(|e| AppError::FeedParse(format!("{}: {}", path, e)))?;
        debug!("Fetched {} quotes from {}", quotes.len(), path);
        Ok(quotes)
    }
}

#[async_trait]
impl PriceFeed for JsonFeed {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn fetch_snapshot(&self) -> Result<PriceSnapshot> {
        let metals = self.fetch_catalog(&self.metals_path).await?;
        let currencies = self.fetch_catalog(&self.currencies_path).await?;
        Ok(PriceSnapshot::new(self.name(), metals, currencies))
    }
}

/// One record of the REST payload; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct RestPriceItem {
    #[serde(rename = "Kod")]
    code: String,
    #[serde(rename = "Aciklama", default)]
    description: Option<String>,
    #[serde(rename = "Alis", deserialize_with = "price_text")]
    buy: String,
    #[serde(rename = "Satis", deserialize_with = "price_text")]
    sell: String,
    #[serde(rename = "GuncellenmeZamani", default)]
    last_updated: Option<String>,
}

/// Prices arrive as strings, but tolerate bare numbers too
fn price_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}

/// Decode one catalog payload
pub fn decode_quotes(body: &str) -> std::result::Result<Vec<PriceQuote>, serde_json::Error> {
    let items: Vec<RestPriceItem> = serde_json::from_str(body)?;

    Ok(items
        .into_iter()
        .map(|item| {
            PriceQuote::new(
                &item.code,
                item.description.as_deref().unwrap_or_default(),
                &item.buy,
                &item.sell,
                item.last_updated,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedFormat;
    use crate::feeds::test_support::serve;
    use axum::http::StatusCode;
    use std::time::Duration;
    use url::Url;

    const GOLD: &str = r#"[
        {"Id": 1, "Kod": "GA", "Aciklama": "Gram Altin", "Alis": "2450.1000", "Satis": "2460.3000",
         "GuncellenmeZamani": "2024-05-10T14:30:00", "Main": true, "DataGroup": 1, "Change": null},
        {"Id": 2, "Kod": "C", "Aciklama": null, "Alis": "4.012,50", "Satis": "4.100,00"}
    ]"#;

    const CURRENCY: &str = r#"[
        {"Kod": "USD", "Aciklama": "Dolar", "Alis": 32.41, "Satis": 32.55}
    ]"#;

    fn config(base_url: &str) -> FeedConfig {
        FeedConfig {
            format: FeedFormat::Json,
            base_url: Url::parse(base_url).unwrap(),
            metals_path: "Gold.json".to_string(),
            currencies_path: "Currency.json".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_decode_string_and_numeric_prices() {
        let quotes = decode_quotes(GOLD).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].code, "GA");
        assert_eq!(quotes[0].buy, 2450.1);
        assert!(quotes[0].last_updated_utc.is_some());
        assert_eq!(quotes[1].buy, 4012.5);

        let quotes = decode_quotes(CURRENCY).unwrap();
        assert_eq!(quotes[0].sell, 32.55);
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        assert!(decode_quotes("<html>maintenance</html>").is_err());
        assert!(decode_quotes(r#"[{"Aciklama": "no code"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_fetch_snapshot_merges_catalogs() {
        let base = serve(vec![
            ("/Gold.json", StatusCode::OK, GOLD),
            ("/Currency.json", StatusCode::OK, CURRENCY),
        ])
        .await;

        let feed = JsonFeed::new(&config(&base)).unwrap();
        let snapshot = feed.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.source, "json");
        assert_eq!(snapshot.metals.len(), 2);
        assert_eq!(snapshot.currencies.len(), 1);
        assert_eq!(snapshot.resolve_price("usd").unwrap(), 32.41);
    }

    #[tokio::test]
    async fn test_failed_sub_fetch_fails_snapshot() {
        let base = serve(vec![
            ("/Gold.json", StatusCode::OK, GOLD),
            ("/Currency.json", StatusCode::SERVICE_UNAVAILABLE, "down"),
        ])
        .await;

        let feed = JsonFeed::new(&config(&base)).unwrap();
        let result = feed.fetch_snapshot().await;
        assert!(matches!(result, Err(AppError::FeedUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_parse_error() {
        let base = serve(vec![
            ("/Gold.json", StatusCode::OK, "{not json"),
            ("/Currency.json", StatusCode::OK, CURRENCY),
        ])
        .await;

        let feed = JsonFeed::new(&config(&base)).unwrap();
        let result = feed.fetch_snapshot().await;
        assert!(matches!(result, Err(AppError::FeedParse(_))));
    }
}
