//! Price refresh scheduler
//!
//! Re-pulls prices and revalues every holding, on demand or on a fixed
//! interval. A refresh moves Idle -> Fetching -> Applying -> Idle; a trigger
//! that arrives while a refresh is in flight is dropped.
//!
//! Stopping sets a stop flag and signals the timer task. An in-flight fetch
//! is abandoned and no holding is written after the flag is observed.

use crate::db::InventoryStore;
use crate::error::AppError;
use crate::feeds::PriceFeed;
use crate::services::{RefreshReport, RefreshService};
use crate::state::AppState;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Instrument};

/// Where the refresh cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
    Applying,
}

/// Result of one trigger
#[derive(Debug)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// Another refresh was in flight
    Skipped,
    /// The fetch failed; holdings were left unchanged
    Failed(AppError),
    /// Shutdown was requested before anything was written
    Cancelled,
}

/// Broadcast to subscribers after every refresh that ran
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Completed(RefreshReport),
    Failed { run_id: String, message: String },
}

struct Inner {
    store: Arc<dyn InventoryStore>,
    feed: Arc<dyn PriceFeed>,
    phase: Mutex<RefreshPhase>,
    stop: AtomicBool,
    catalog_checked: AtomicBool,
    events: broadcast::Sender<RefreshEvent>,
}

/// Resets the phase to Idle however the run ends, including when its future is dropped
struct PhaseGuard {
    inner: Arc<Inner>,
}

impl PhaseGuard {
    fn set(&self, phase: RefreshPhase) {
        *self.inner.phase.lock() = phase;
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        *self.inner.phase.lock() = RefreshPhase::Idle;
    }
}

/// Refresh scheduler shared by manual refreshes and the timer task
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl RefreshScheduler {
    /// Create a new refresh scheduler
    pub fn new(store: Arc<dyn InventoryStore>, feed: Arc<dyn PriceFeed>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                store,
                feed,
                phase: Mutex::new(RefreshPhase::Idle),
                stop: AtomicBool::new(false),
                catalog_checked: AtomicBool::new(false),
                events,
            }),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.feed.clone())
    }

    pub fn phase(&self) -> RefreshPhase {
        *self.inner.phase.lock()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.inner.events.subscribe()
    }

    /// Run one refresh now, unless one is already in flight
    pub async fn trigger(&self) -> RefreshOutcome {
        let Some(guard) = self.try_begin() else {
            debug!("Refresh already in flight, trigger ignored");
            return RefreshOutcome::Skipped;
        };

        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("refresh", run_id = %run_id);
        self.run(guard, run_id).instrument(span).await
    }

    fn try_begin(&self) -> Option<PhaseGuard> {
        let mut phase = self.inner.phase.lock();
        if *phase != RefreshPhase::Idle {
            return None;
        }
        *phase = RefreshPhase::Fetching;

        Some(PhaseGuard {
            inner: self.inner.clone(),
        })
    }

    async fn run(&self, guard: PhaseGuard, run_id: String) -> RefreshOutcome {
        if self.is_stopping() {
            return RefreshOutcome::Cancelled;
        }

        info!("Fetching prices from {} feed", self.inner.feed.name());
        let snapshot = match self.inner.feed.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Price refresh failed, keeping previous values: {}", e);
                self.publish(RefreshEvent::Failed {
                    run_id,
                    message: e.to_string(),
                });
                return RefreshOutcome::Failed(e);
            }
        };

        if self.is_stopping() {
            return RefreshOutcome::Cancelled;
        }

        if snapshot.is_empty() {
            warn!("Price feed returned no quotes");
        }
        self.check_catalog_coverage(&snapshot);

        guard.set(RefreshPhase::Applying);
        match RefreshService::apply_snapshot(
            self.inner.store.as_ref(),
            &snapshot,
            &run_id,
            &self.inner.stop,
        ) {
            Ok(report) => {
                info!(
                    "Refresh complete: {} updated, {} skipped, {} failed",
                    report.updated, report.skipped, report.failed
                );
                self.publish(RefreshEvent::Completed(report.clone()));
                RefreshOutcome::Completed(report)
            }
            Err(e) => {
                warn!("Could not load holdings for refresh: {}", e);
                self.publish(RefreshEvent::Failed {
                    run_id,
                    message: e.to_string(),
                });
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Warn once about catalog instruments the feed does not publish
    fn check_catalog_coverage(&self, snapshot: &crate::feeds::types::PriceSnapshot) {
        if self.inner.catalog_checked.swap(true, Ordering::SeqCst) {
            return;
        }
        for instrument in snapshot.missing_instruments() {
            warn!(
                "Price feed does not publish {} ({}); holdings of it stay unvalued",
                instrument.code, instrument.variant
            );
        }
    }

    fn publish(&self, event: RefreshEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn is_stopping(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst)
    }

    /// Start the timer task. The first refresh runs immediately.
    pub fn start(&self, interval: Duration) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let scheduler = self.clone();

        let task = tokio::spawn(async move {
            info!("Refresh scheduler started, every {}s", interval.as_secs());

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = &mut shutdown_rx => {
                                info!("Abandoning in-flight refresh");
                                break;
                            }
                            outcome = scheduler.trigger() => {
                                debug!("Scheduled refresh finished: {:?}", outcome);
                            }
                        }
                    }
                }
            }

            info!("Refresh scheduler stopped");
        });

        SchedulerHandle {
            scheduler: self.clone(),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running timer task
pub struct SchedulerHandle {
    scheduler: RefreshScheduler,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop the timer task and wait for it to exit
    pub async fn shutdown(mut self) {
        self.scheduler.inner.stop.store(true, Ordering::SeqCst);

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Refresh scheduler task ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDb;
    use crate::error::Result;
    use crate::feeds::types::{PriceQuote, PriceSnapshot};
    use crate::state::test_support::{holding, StaticFeed};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Feed that blocks every fetch until released
    struct GatedFeed {
        release: Notify,
    }

    #[async_trait]
    impl PriceFeed for GatedFeed {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn fetch_snapshot(&self) -> Result<PriceSnapshot> {
            self.release.notified().await;
            Ok(PriceSnapshot::new(
                "gated",
                vec![PriceQuote::new("GA", "GA", "2200", "2210", None)],
                vec![],
            ))
        }
    }

    fn store_with_gold() -> (Arc<SqliteDb>, i64) {
        let db = Arc::new(SqliteDb::in_memory().unwrap());
        let id = db.create(&holding("GA", 10.0, 2000.0)).unwrap();
        (db, id)
    }

    async fn wait_for_phase(scheduler: &RefreshScheduler, phase: RefreshPhase) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while scheduler.phase() != phase {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("phase not reached");
    }

    #[tokio::test]
    async fn test_trigger_applies_prices() {
        let (db, id) = store_with_gold();
        let scheduler = RefreshScheduler::new(
            db.clone(),
            Arc::new(StaticFeed::with_prices(&[("GA", "2200")], &[])),
        );
        let mut events = scheduler.subscribe();

        let RefreshOutcome::Completed(report) = scheduler.trigger().await else {
            panic!("refresh should complete");
        };
        assert_eq!(report.updated, 1);
        assert_eq!(scheduler.phase(), RefreshPhase::Idle);

        let stored = db.get(id).unwrap().unwrap();
        assert_eq!(stored.current_value, 22000.0);
        assert!((stored.profit_loss_pct - 10.0).abs() < 1e-9);

        match events.recv().await.unwrap() {
            RefreshEvent::Completed(event) => assert_eq!(event.run_id, report.run_id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trigger_during_refresh_is_skipped() {
        let (db, id) = store_with_gold();
        let feed = Arc::new(GatedFeed {
            release: Notify::new(),
        });
        let scheduler = RefreshScheduler::new(db.clone(), feed.clone());

        let first = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.trigger().await }
        });
        wait_for_phase(&scheduler, RefreshPhase::Fetching).await;

        assert!(matches!(scheduler.trigger().await, RefreshOutcome::Skipped));

        feed.release.notify_one();
        assert!(matches!(first.await.unwrap(), RefreshOutcome::Completed(_)));
        assert_eq!(db.get(id).unwrap().unwrap().current_price, Some(2200.0));
        assert_eq!(scheduler.phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_holdings_unchanged() {
        let (db, id) = store_with_gold();
        let before = db.get(id).unwrap().unwrap();

        let scheduler = RefreshScheduler::new(db.clone(), Arc::new(StaticFeed::failing()));
        let mut events = scheduler.subscribe();

        let outcome = scheduler.trigger().await;
        assert!(matches!(outcome, RefreshOutcome::Failed(AppError::FeedUnavailable(_))));
        assert!(matches!(events.recv().await.unwrap(), RefreshEvent::Failed { .. }));

        let after = db.get(id).unwrap().unwrap();
        assert_eq!(after.valuation(), before.valuation());
        assert_eq!(scheduler.phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_timer_runs_until_shutdown() {
        let (db, id) = store_with_gold();
        let feed = Arc::new(StaticFeed::with_prices(&[("GA", "2300")], &[]));
        let scheduler = RefreshScheduler::new(db.clone(), feed.clone());
        let mut events = scheduler.subscribe();

        let handle = scheduler.start(Duration::from_millis(20));
        for _ in 0..2 {
            tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("refresh event")
                .unwrap();
        }
        handle.shutdown().await;

        assert!(feed.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(db.get(id).unwrap().unwrap().current_price, Some(2300.0));

        // Stopped: a manual trigger no longer writes
        assert!(matches!(scheduler.trigger().await, RefreshOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_shutdown_abandons_in_flight_fetch() {
        let (db, id) = store_with_gold();
        let feed = Arc::new(GatedFeed {
            release: Notify::new(),
        });
        let scheduler = RefreshScheduler::new(db.clone(), feed.clone());

        let handle = scheduler.start(Duration::from_secs(300));
        wait_for_phase(&scheduler, RefreshPhase::Fetching).await;

        handle.shutdown().await;
        feed.release.notify_one();

        assert_eq!(scheduler.phase(), RefreshPhase::Idle);
        assert_eq!(db.get(id).unwrap().unwrap().current_price, None);
    }
}
