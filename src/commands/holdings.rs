//! Holding management commands

use crate::catalog::Unit;
use crate::commands::input::{parse_amount, parse_date, parse_optional_amount};
use crate::commands::render;
use crate::db::sqlite::models::{Holding, HoldingOrder};
use crate::display;
use crate::error::Result;
use crate::services::{
    AggregationService, HoldingUpdate, InventoryService, NewHolding, PortfolioTotals,
};
use crate::state::AppState;
use clap::Args;
use serde::Serialize;

#[derive(Debug, Clone, Args)]
pub struct AddHoldingRequest {
    /// Instrument code, e.g. GA, C, USD (see `catalog`)
    #[arg(long)]
    pub code: String,
    /// Amount held, e.g. 10 or 2,5
    #[arg(long)]
    pub quantity: String,
    /// Per-unit purchase price, e.g. 2.450,10
    #[arg(long)]
    pub price: String,
    /// gram, kilogram, ounce or piece; defaults to the instrument's unit
    #[arg(long)]
    pub unit: Option<String>,
    /// Purchase date, DD.MM.YYYY or YYYY-MM-DD; defaults to today
    #[arg(long)]
    pub date: Option<String>,
    /// Per-unit current price; fetched from the feed when omitted
    #[arg(long)]
    pub current_price: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EditHoldingRequest {
    /// Holding ID as shown by `list`
    pub id: i64,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub quantity: Option<String>,
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub current_price: Option<String>,
    /// New note; an empty value clears it
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
struct HoldingsView {
    holdings: Vec<Holding>,
    totals: PortfolioTotals,
}

fn parse_unit(unit: Option<&str>) -> Result<Option<Unit>> {
    unit.map(str::parse::<Unit>).transpose()
}

/// List holdings from the database only
pub fn list_holdings(state: &AppState, json: bool) -> Result<String> {
    let holdings = InventoryService::list(state, HoldingOrder::CategoryThenPurchaseDate)?;
    let totals = AggregationService::portfolio_totals(&holdings);

    let text = format!(
        "{}\n\n{}",
        display::render_holdings(&holdings),
        display::render_totals(&totals)
    );
    render(json, &HoldingsView { holdings, totals }, text)
}

/// Record a new holding
pub async fn add_holding(state: &AppState, request: AddHoldingRequest, json: bool) -> Result<String> {
    tracing::info!("Adding holding: {}", request.code);

    let input = NewHolding {
        code: request.code,
        quantity: parse_amount("Quantity", &request.quantity)?,
        unit: parse_unit(request.unit.as_deref())?,
        purchase_price: parse_amount("Purchase price", &request.price)?,
        purchase_date: parse_date(request.date.as_deref())?,
        current_price: parse_optional_amount("Current price", request.current_price.as_deref())?,
        note: request.note,
    };

    let holding = InventoryService::add(state, input).await?;
    let text = describe("Added", &holding);
    render(json, &holding, text)
}

/// Edit an existing holding
pub async fn edit_holding(state: &AppState, request: EditHoldingRequest, json: bool) -> Result<String> {
    tracing::info!("Editing holding: {}", request.id);

    let edit = HoldingUpdate {
        code: request.code,
        quantity: request
            .quantity
            .as_deref()
            .map(|q| parse_amount("Quantity", q))
            .transpose()?,
        unit: parse_unit(request.unit.as_deref())?,
        purchase_price: request
            .price
            .as_deref()
            .map(|p| parse_amount("Purchase price", p))
            .transpose()?,
        purchase_date: request
            .date
            .as_deref()
            .map(|d| parse_date(Some(d)))
            .transpose()?,
        current_price: parse_optional_amount("Current price", request.current_price.as_deref())?,
        note: request.note,
    };

    let holding = InventoryService::update(state, request.id, edit).await?;
    let text = describe("Updated", &holding);
    render(json, &holding, text)
}

/// Delete a holding
pub fn delete_holding(state: &AppState, id: i64, json: bool) -> Result<String> {
    InventoryService::delete(state, id)?;
    render(
        json,
        &serde_json::json!({ "deleted": id }),
        format!("Deleted holding {}", id),
    )
}

fn describe(action: &str, holding: &Holding) -> String {
    let valuation = match holding.current_price {
        Some(_) => format!(
            "value {} TL ({})",
            display::format::format_money(holding.current_value),
            display::format::format_pct(holding.profit_loss_pct)
        ),
        None => "not yet valued".to_string(),
    };

    format!(
        "{} holding {}: {} {} {}, cost {} TL, {}",
        action,
        holding.id,
        display::format::format_quantity(holding.quantity, holding.unit),
        holding.unit,
        holding.variant,
        display::format::format_money(holding.total_purchase),
        valuation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::state::test_support::{test_state, StaticFeed};
    use std::sync::Arc;

    fn add_request(code: &str, quantity: &str, price: &str) -> AddHoldingRequest {
        AddHoldingRequest {
            code: code.to_string(),
            quantity: quantity.to_string(),
            price: price.to_string(),
            unit: None,
            date: Some("15.01.2024".to_string()),
            current_price: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let state = test_state(Arc::new(StaticFeed::with_prices(&[("GA", "2.200,00")], &[])), false);

        let added = add_holding(&state, add_request("ga", "10", "2.000"), false)
            .await
            .unwrap();
        assert_eq!(
            added,
            "Added holding 1: 10 gram 24K Gram Gold, cost 20.000 TL, value 22.000 TL (+10,00%)"
        );

        let listed = list_holdings(&state, false).unwrap();
        assert!(listed.contains("15.01.2024"));
        assert!(listed.contains("Current value:  22.000 TL"));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_amount() {
        let state = test_state(Arc::new(StaticFeed::failing()), true);

        let result = add_holding(&state, add_request("GA", "ten", "2000"), false).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_edit_and_delete_json_output() {
        let state = test_state(Arc::new(StaticFeed::failing()), true);
        add_holding(&state, add_request("USD", "100", "30"), false)
            .await
            .unwrap();

        let request = EditHoldingRequest {
            id: 1,
            code: None,
            quantity: Some("150".to_string()),
            unit: None,
            price: None,
            date: None,
            current_price: Some("32,5".to_string()),
            note: None,
        };
        let output = edit_holding(&state, request, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["quantity"], 150.0);
        assert_eq!(value["current_value"], 4875.0);
        assert_eq!(value["price_source"], "manual");

        let output = delete_holding(&state, 1, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["deleted"], 1);
    }
}
