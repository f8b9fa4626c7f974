//! XML price feed adapter
//!
//! Each catalog is a `<Kurlar>` document of `<Kur>` records carrying the same
//! fields as the JSON feed. Older endpoints wrap the document inside a SOAP
//! result element, sometimes entity-escaped; both are accepted.

use crate::config::FeedConfig;
use crate::error::{AppError, Result};
use crate::feeds::http::FeedHttpClient;
use crate::feeds::types::{PriceQuote, PriceSnapshot};
use crate::feeds::PriceFeed;
use async_trait::async_trait;
use serde::Deserialize;
use std::borrow::Cow;
use tracing::debug;

/// How the `<Kurlar>` element is spelled in a payload
struct TagForm {
    open: &'static str,
    close: &'static str,
    gt: &'static str,
    escaped: bool,
}

const TAG_FORMS: [TagForm; 2] = [
    TagForm {
        open: "<Kurlar",
        close: "</Kurlar>",
        gt: ">",
        escaped: false,
    },
    TagForm {
        open: "&lt;Kurlar",
        close: "&lt;/Kurlar&gt;",
        gt: "&gt;",
        escaped: true,
    },
];

/// XML feed implementation
pub struct XmlFeed {
    http: FeedHttpClient,
    metals_path: String,
    currencies_path: String,
}

impl XmlFeed {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            http: FeedHttpClient::new(
                config.base_url.clone(),
                config.timeout,
                "application/xml, text/xml",
            )?,
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
impl PriceFeed for XmlFeed {
    fn name(&self) -> &'static str {
        "xml"
    }

    async fn fetch_snapshot(&self) -> Result<PriceSnapshot> {
        let metals = self.fetch_catalog(&self.metals_path).await?;
        let currencies = self.fetch_catalog(&self.currencies_path).await?;
        Ok(PriceSnapshot::new(self.name(), metals, currencies))
    }
}

#[derive(Debug, Deserialize)]
struct RatesDocument {
    #[serde(rename = "Kur", default)]
    items: Vec<XmlPriceItem>,
}

#[derive(Debug, Deserialize)]
struct XmlPriceItem {
    #[serde(rename = "Kod")]
    code: String,
    #[serde(rename = "Aciklama", default)]
    description: String,
    #[serde(rename = "Alis", default)]
    buy: String,
    #[serde(rename = "Satis", default)]
    sell: String,
    #[serde(rename = "GuncellenmeZamani", default)]
    last_updated: Option<String>,
}

/// Cut the `<Kurlar>` element out of a payload, unescaping it if needed
fn extract_rates_document(payload: &str) -> std::result::Result<Cow<'_, str>, String> {
    for form in &TAG_FORMS {
        let Some(start) = find_open_tag(payload, form) else {
            continue;
        };
        let element = element_span(payload, start, form)?;

        if !form.escaped {
            return Ok(Cow::Borrowed(element));
        }
        let unescaped = quick_xml::escape::unescape(element)
            .map_err(|e| format!("invalid escaped document: {}", e))?;
        return Ok(Cow::Owned(unescaped.into_owned()));
    }

    Err("no <Kurlar> element in payload".to_string())
}

/// First `<Kurlar` whose name ends there, so `<KurlarListesi>` is passed over
fn find_open_tag(payload: &str, form: &TagForm) -> Option<usize> {
    payload.match_indices(form.open).map(|(i, _)| i).find(|&i| {
        let rest = &payload[i + form.open.len()..];
        rest.starts_with(form.gt) || rest.starts_with('/') || rest.starts_with(char::is_whitespace)
    })
}

fn element_span<'a>(
    payload: &'a str,
    start: usize,
    form: &TagForm,
) -> std::result::Result<&'a str, String> {
    let unterminated = || "unterminated <Kurlar> element".to_string();

    let open_end = payload[start..]
        .find(form.gt)
        .map(|i| start + i)
        .ok_or_else(unterminated)?;
    let tag_end = open_end + form.gt.len();

    // Self-closing element: no records
    if payload[start..open_end].trim_end().ends_with('/') {
        return Ok(&payload[start..tag_end]);
    }

    let end = payload
        .rfind(form.close)
        .filter(|end| *end >= tag_end)
        .ok_or_else(unterminated)?;
    Ok(&payload[start..end + form.close.len()])
}

/// Decode one catalog payload
pub fn decode_quotes(payload: &str) -> std::result::Result<Vec<PriceQuote>, String> {
    let document = extract_rates_document(payload)?;
    let rates: RatesDocument =
        quick_xml::de::from_str(&document).map_err(|e| format!("invalid XML: {}", e))?;

    Ok(rates
        .items
        .into_iter()
        .map(|item| {
            PriceQuote::new(
                &item.code,
                &item.description,
                &item.buy,
                &item.sell,
                item.last_updated,
            )
        })
        .collect())
}
