//! SQLite database models

use crate::catalog::{Category, Unit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Holding model: one purchased position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: i64,
    pub category: Category,
    pub variant: String,
    pub code: String,
    pub quantity: f64,
    pub unit: Unit,
    pub purchase_date: NaiveDate,
    /// Per-unit purchase price
    pub purchase_price: f64,
    pub total_purchase: f64,
    /// Per-unit current price; `None` until a price has been resolved
    pub current_price: Option<f64>,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub price_source: Option<String>,
    pub priced_at: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Holding {
    /// The current-value facts of this holding
    pub fn valuation(&self) -> Valuation {
        Valuation {
            current_price: self.current_price,
            current_value: self.current_value,
            profit_loss: self.profit_loss,
            profit_loss_pct: self.profit_loss_pct,
            price_source: self.price_source.clone(),
            priced_at: self.priced_at.clone(),
        }
    }
}

/// Current-value fields written by a price refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub current_price: Option<f64>,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub price_source: Option<String>,
    pub priced_at: Option<String>,
}

/// Row ordering for holding listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldingOrder {
    /// Listing order: category, then purchase date
    #[default]
    CategoryThenPurchaseDate,
    /// Grouping order: category, then variant
    CategoryThenVariant,
}
