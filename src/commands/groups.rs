//! Grouped summary commands

use crate::commands::render;
use crate::db::sqlite::models::{Holding, HoldingOrder};
use crate::display;
use crate::error::Result;
use crate::scheduler::{RefreshOutcome, RefreshScheduler};
use crate::services::{AggregationService, Group, InventoryService, PortfolioTotals};
use crate::state::AppState;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub holdings: Vec<Holding>,
    pub groups: Vec<Group>,
    pub totals: PortfolioTotals,
    /// Set when prices could not be refreshed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl DashboardView {
    pub fn load(state: &AppState, notice: Option<String>) -> Result<Self> {
        let holdings = InventoryService::list(state, HoldingOrder::CategoryThenPurchaseDate)?;
        let groups = AggregationService::sorted_groups(&AggregationService::group_by_code(&holdings));
        let totals = AggregationService::portfolio_totals(&holdings);

        Ok(Self {
            holdings,
            groups,
            totals,
            notice,
        })
    }

    pub fn render_text(&self) -> String {
        let mut sections = Vec::with_capacity(4);
        if let Some(notice) = &self.notice {
            sections.push(notice.clone());
        }
        sections.push(display::render_holdings(&self.holdings));
        sections.push(display::render_groups(&self.groups));
        sections.push(display::render_totals(&self.totals));
        sections.join("\n\n")
    }
}

/// Group table from the database only
pub fn show_groups(state: &AppState, json: bool) -> Result<String> {
    let holdings = InventoryService::list(state, HoldingOrder::CategoryThenVariant)?;
    let groups = AggregationService::sorted_groups(&AggregationService::group_by_code(&holdings));

    let text = display::render_groups(&groups);
    render(json, &groups, text)
}

/// Refresh prices unless offline, then show holdings, groups and totals
pub async fn show_dashboard(state: &AppState, json: bool) -> Result<String> {
    let notice = if state.offline {
        None
    } else {
        match RefreshScheduler::from_state(state).trigger().await {
            RefreshOutcome::Failed(e) => Some(format!(
                "Prices could not be refreshed ({}); showing last known values.",
                e
            )),
            _ => None,
        }
    };

    let view = DashboardView::load(state, notice)?;
    let text = view.render_text();
    render(json, &view, text)
}
