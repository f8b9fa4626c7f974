//! Aggregation Service
//!
//! Groups holdings by instrument code and totals the portfolio.

use crate::catalog::{Category, Unit};
use crate::db::sqlite::models::Holding;
use crate::services::valuation_service::profit_loss_pct;
use serde::Serialize;
use std::collections::BTreeMap;

/// Group key for holdings whose code is blank
pub const UNDEFINED_GROUP_KEY: &str = "undefined";

/// Aggregate over every holding sharing one code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub code: String,
    /// Classification of the first member
    pub category: Category,
    pub variant: String,
    pub unit: Unit,
    pub holding_count: usize,
    pub total_quantity: f64,
    pub total_purchase: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    /// Purchase-cost-weighted average per-unit price
    pub average_purchase_price: f64,
    pub profit_loss_pct: f64,
    pub average_profit_loss: f64,
}

impl Group {
    fn start(code: String, first: &Holding) -> Self {
        Self {
            code,
            category: first.category,
            variant: first.variant.clone(),
            unit: first.unit,
            holding_count: 0,
            total_quantity: 0.0,
            total_purchase: 0.0,
            current_value: 0.0,
            profit_loss: 0.0,
            average_purchase_price: 0.0,
            profit_loss_pct: 0.0,
            average_profit_loss: 0.0,
        }
    }

    fn add(&mut self, holding: &Holding) {
        self.holding_count += 1;
        self.total_quantity += holding.quantity;
        self.total_purchase += holding.total_purchase;
        self.current_value += holding.current_value;
        self.profit_loss += holding.profit_loss;
    }

    fn finish(&mut self) {
        self.average_purchase_price = if self.total_quantity > 0.0 {
            self.total_purchase / self.total_quantity
        } else {
            0.0
        };
        self.profit_loss_pct = profit_loss_pct(self.profit_loss, self.total_purchase);
        self.average_profit_loss = if self.holding_count > 0 {
            self.profit_loss / self.holding_count as f64
        } else {
            0.0
        };
    }
}

/// Portfolio-wide totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub holding_count: usize,
    pub total_purchase: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

/// Aggregation service for business logic
pub struct AggregationService;

impl AggregationService {
    /// Group holdings by trimmed code; blank codes share the `undefined` key
    pub fn group_by_code(holdings: &[Holding]) -> BTreeMap<String, Group> {
        let mut groups: BTreeMap<String, Group> = BTreeMap::new();

        for holding in holdings {
            let key = match holding.code.trim() {
                "" => UNDEFINED_GROUP_KEY.to_string(),
                code => code.to_string(),
            };

            groups
                .entry(key.clone())
                .or_insert_with(|| Group::start(key, holding))
                .add(holding);
        }

        for group in groups.values_mut() {
            group.finish();
        }

        groups
    }

    /// Sum purchase cost, current value and profit/loss over all holdings
    pub fn portfolio_totals(holdings: &[Holding]) -> PortfolioTotals {
        let mut totals = holdings.iter().fold(PortfolioTotals::default(), |mut acc, h| {
            acc.holding_count += 1;
            acc.total_purchase += h.total_purchase;
            acc.current_value += h.current_value;
            acc.profit_loss += h.profit_loss;
            acc
        });

        totals.profit_loss_pct = profit_loss_pct(totals.profit_loss, totals.total_purchase);
        totals
    }

    /// Display order: metals before currencies, then unit, then code
    pub fn sorted_groups(groups: &BTreeMap<String, Group>) -> Vec<Group> {
        let mut sorted: Vec<Group> = groups.values().cloned().collect();
        sorted.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.unit.cmp(&b.unit))
                .then_with(|| a.code.cmp(&b.code))
        });
        sorted
    }
}
