//! Application state management

use crate::config::AppConfig;
use crate::db::sqlite::SqliteDb;
use crate::db::InventoryStore;
use crate::error::Result;
use crate::feeds::{self, PriceFeed};
use std::sync::Arc;

/// Application state shared by every command and the refresh scheduler
pub struct AppState {
    /// Loaded configuration
    pub config: AppConfig,

    /// Holding store
    pub store: Arc<dyn InventoryStore>,

    /// Price feed adapter
    pub feed: Arc<dyn PriceFeed>,

    /// Never contact the price feed
    pub offline: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, offline: bool) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&config.data_dir)?;
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("Data directory: {:?}", config.data_dir);

        let store: Arc<dyn InventoryStore> = Arc::new(SqliteDb::new(&config.db_path)?);
        let feed = feeds::create_feed(&config.feed)?;

        Ok(Self::with_parts(config, store, feed, offline))
    }

    /// Assemble state from already-built parts
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn InventoryStore>,
        feed: Arc<dyn PriceFeed>,
        offline: bool,
    ) -> Self {
        Self {
            config,
            store,
            feed,
            offline,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::catalog::{self, Category, Unit};
    use crate::db::sqlite::models::Holding;
    use crate::error::AppError;
    use crate::feeds::types::{PriceQuote, PriceSnapshot};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process feed returning a scripted result
    pub struct StaticFeed {
        snapshot: Mutex<Option<PriceSnapshot>>,
        pub calls: AtomicUsize,
    }

    impl StaticFeed {
        pub fn with_prices(metals: &[(&str, &str)], currencies: &[(&str, &str)]) -> Self {
            let quotes = |items: &[(&str, &str)]| {
                items
                    .iter()
                    .map(|(code, buy)| PriceQuote::new(code, code, buy, buy, None))
                    .collect::<Vec<_>>()
            };
            Self {
                snapshot: Mutex::new(Some(PriceSnapshot::new(
                    "static",
                    quotes(metals),
                    quotes(currencies),
                ))),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                snapshot: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceFeed for StaticFeed {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_snapshot(&self) -> Result<PriceSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.snapshot
                .lock()
                .clone()
                .ok_or_else(|| AppError::FeedUnavailable("connection refused".to_string()))
        }
    }

    pub fn test_config() -> AppConfig {
        AppConfig::from_lookup(Some(Path::new("/tmp/bullion-desk-tests")), |_| None)
            .expect("default config")
    }

    pub fn test_state(feed: Arc<dyn PriceFeed>, offline: bool) -> AppState {
        let store: Arc<dyn InventoryStore> = Arc::new(SqliteDb::in_memory().expect("in-memory db"));
        AppState::with_parts(test_config(), store, feed, offline)
    }

    /// An unvalued holding of a catalog instrument
    pub fn holding(code: &str, quantity: f64, purchase_price: f64) -> Holding {
        let instrument = catalog::lookup(code);
        Holding {
            id: 0,
            category: instrument.map(|i| i.category).unwrap_or(Category::Metal),
            variant: instrument.map(|i| i.variant.to_string()).unwrap_or_default(),
            code: code.to_string(),
            quantity,
            unit: instrument.map(|i| i.default_unit).unwrap_or(Unit::Gram),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            purchase_price,
            total_purchase: quantity * purchase_price,
            current_price: None,
            current_value: 0.0,
            profit_loss: 0.0,
            profit_loss_pct: 0.0,
            price_source: None,
            priced_at: None,
            note: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}
