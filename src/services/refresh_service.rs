//! Refresh Service
//!
//! Applies one price snapshot across every live holding.

use crate::db::sqlite::models::HoldingOrder;
use crate::db::InventoryStore;
use crate::error::Result;
use crate::feeds::types::PriceSnapshot;
use crate::services::valuation_service::ValuationService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, warn};

/// Outcome of applying one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub run_id: String,
    pub snapshot_time: DateTime<Utc>,
    pub source: String,
    /// Holdings whose current-value fields were written
    pub updated: usize,
    /// Holdings whose code the snapshot does not publish
    pub skipped: usize,
    /// Holdings whose write failed
    pub failed: usize,
    /// The run stopped early because shutdown was requested
    pub interrupted: bool,
}

/// Refresh service for business logic
pub struct RefreshService;

impl RefreshService {
    /// Revalue every live holding against `snapshot`.
    ///
    /// Each holding is written on its own; one failing never aborts the rest.
    /// No write happens once `stop` is set.
    pub fn apply_snapshot(
        store: &dyn InventoryStore,
        snapshot: &PriceSnapshot,
        run_id: &str,
        stop: &AtomicBool,
    ) -> Result<RefreshReport> {
        let holdings = store.list(HoldingOrder::default())?;
        let priced_at = snapshot.fetched_at.to_rfc3339();

        let mut report = RefreshReport {
            run_id: run_id.to_string(),
            snapshot_time: snapshot.fetched_at,
            source: snapshot.source.clone(),
            updated: 0,
            skipped: 0,
            failed: 0,
            interrupted: false,
        };

        for holding in &holdings {
            if stop.load(Ordering::SeqCst) {
                warn!("Refresh {} interrupted by shutdown", run_id);
                report.interrupted = true;
                break;
            }

            let price = match snapshot.resolve_price(&holding.code) {
                Ok(price) => price,
                Err(e) => {
                    warn!("Skipping holding {}: {}", holding.id, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let mut valuation = ValuationService::apply_current_price(holding, price).valuation();
            valuation.price_source = Some(snapshot.source.clone());
            valuation.priced_at = Some(priced_at.clone());

            match store.update_valuation(holding.id, &valuation) {
                Ok(()) => {
                    debug!("Holding {} ({}) valued at {}", holding.id, holding.code, price);
                    report.updated += 1;
                }
                Err(e) => {
                    error!("Failed to store valuation for holding {}: {}", holding.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
