//! Price feed adapters module

pub mod types;
pub mod http;
pub mod json_feed;
pub mod xml_feed;

use crate::config::{FeedConfig, FeedFormat};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use types::PriceSnapshot;

/// Price feed trait that all feed implementations must implement
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Feed name recorded as the price source (e.g., "json", "xml")
    fn name(&self) -> &'static str;

    /// Fetch the metals and currencies catalogs as one snapshot.
    ///
    /// Either sub-fetch failing fails the whole snapshot.
    async fn fetch_snapshot(&self) -> Result<PriceSnapshot>;
}

/// Create the feed adapter selected by configuration
pub fn create_feed(config: &FeedConfig) -> Result<Arc<dyn PriceFeed>> {
    let feed: Arc<dyn PriceFeed> = match config.format {
        FeedFormat::Json => Arc::new(json_feed::JsonFeed::new(config)?),
        FeedFormat::Xml => Arc::new(xml_feed::XmlFeed::new(config)?),
    };

    tracing::info!("Price feed: {} at {}", feed.name(), config.base_url);
    Ok(feed)
}
