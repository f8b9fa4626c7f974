//! Price refresh commands

use crate::commands::groups::DashboardView;
use crate::commands::render;
use crate::display;
use crate::error::{AppError, ErrorResponse, Result};
use crate::scheduler::{RefreshEvent, RefreshOutcome, RefreshScheduler};
use crate::state::AppState;
use std::future::Future;
use tokio::sync::broadcast::error::RecvError;

fn require_online(state: &AppState, command: &str) -> Result<()> {
    if state.offline {
        return Err(AppError::Validation(format!(
            "`{}` needs the price feed; run it without --offline",
            command
        )));
    }
    Ok(())
}

/// Run one manual refresh.
///
/// A feed failure is reported as a notice, not an error; stored values stay as they were.
pub async fn refresh_prices(state: &AppState, json: bool) -> Result<String> {
    require_online(state, "refresh")?;

    match RefreshScheduler::from_state(state).trigger().await {
        RefreshOutcome::Completed(report) => {
            let text = display::render_report(&report);
            render(json, &report, text)
        }
        RefreshOutcome::Failed(e) => {
            let text = format!("Prices could not be refreshed: {}. Stored values are unchanged.", e);
            render(json, &ErrorResponse::from(&e), text)
        }
        RefreshOutcome::Skipped | RefreshOutcome::Cancelled => Err(AppError::Internal(
            "refresh did not run".to_string(),
        )),
    }
}

/// Fetch a snapshot and list every quote
pub async fn show_prices(state: &AppState, json: bool) -> Result<String> {
    require_online(state, "prices")?;

    let snapshot = state.feed.fetch_snapshot().await?;
    let text = display::render_quotes(&snapshot);
    render(json, &snapshot, text)
}

/// Refresh on the configured interval and emit a fresh dashboard after each run,
/// until `shutdown` resolves.
pub async fn watch<F, W>(state: &AppState, json: bool, shutdown: F, mut emit: W) -> Result<()>
where
    F: Future<Output = ()>,
    W: FnMut(String),
{
    require_online(state, "watch")?;

    let scheduler = RefreshScheduler::from_state(state);
    let mut events = scheduler.subscribe();
    let handle = scheduler.start(state.config.refresh_interval);

    tokio::pin!(shutdown);
    let result = loop {
        tokio::select! {
            _ = &mut shutdown => break Ok(()),
            event = events.recv() => {
                let notice = match event {
                    Ok(RefreshEvent::Completed(report)) => display::render_report(&report),
                    Ok(RefreshEvent::Failed { message, .. }) => format!(
                        "Prices could not be refreshed ({}); showing last known values.",
                        message
                    ),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Watch display skipped {} refresh events", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break Ok(()),
                };

                match DashboardView::load(state, Some(notice)) {
                    Ok(view) => {
                        let text = view.render_text();
                        match render(json, &view, text) {
                            Ok(output) => emit(output),
                            Err(e) => break Err(e),
                        }
                    }
                    Err(e) => break Err(e),
                }
            }
        }
    };

    handle.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{holding, test_state, StaticFeed};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_refresh_reports_counts() {
        let state = test_state(Arc::new(StaticFeed::with_prices(&[("GA", "2200")], &[])), false);
        state.store.create(&holding("GA", 10.0, 2000.0)).unwrap();
        state.store.create(&holding("EUR", 50.0, 35.0)).unwrap();

        let output = refresh_prices(&state, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["updated"], 1);
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["failed"], 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_a_notice() {
        let state = test_state(Arc::new(StaticFeed::failing()), false);

        let output = refresh_prices(&state, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["code"], "FEED_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_feed_commands_refuse_offline() {
        let state = test_state(Arc::new(StaticFeed::failing()), true);

        assert!(matches!(refresh_prices(&state, false).await, Err(AppError::Validation(_))));
        assert!(matches!(show_prices(&state, false).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_show_prices() {
        let state = test_state(
            Arc::new(StaticFeed::with_prices(&[("GA", "2450.10")], &[("USD", "32.41")])),
            false,
        );

        let output = show_prices(&state, false).await.unwrap();
        assert!(output.contains("2.450,1"));
        assert!(output.contains("2 quotes from static feed"));
    }

    #[tokio::test]
    async fn test_watch_emits_until_shutdown() {
        let state = test_state(Arc::new(StaticFeed::with_prices(&[("GA", "2200")], &[])), false);
        state.store.create(&holding("GA", 10.0, 2000.0)).unwrap();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut stop_tx = Some(stop_tx);
        let mut frames = Vec::new();

        watch(
            &state,
            false,
            async {
                let _ = stop_rx.await;
            },
            |frame| {
                frames.push(frame);
                if let Some(tx) = stop_tx.take() {
                    let _ = tx.send(());
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].starts_with("Prices refreshed at"));
        assert!(frames[0].contains("Current value:  22.000 TL"));
    }
}
