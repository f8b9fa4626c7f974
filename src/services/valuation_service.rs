//! Valuation Service
//!
//! Pure arithmetic over a holding's purchase and current-value facts.

use crate::db::sqlite::models::Holding;

/// Valuation service for business logic
pub struct ValuationService;

impl ValuationService {
    /// Apply a per-unit current price and recompute the derived fields together.
    ///
    /// A zero price is valid input and values the holding at zero.
    pub fn apply_current_price(holding: &Holding, price: f64) -> Holding {
        let mut valued = holding.clone();
        let current_value = holding.quantity * price;
        let profit_loss = current_value - holding.total_purchase;

        valued.current_price = Some(price);
        valued.current_value = current_value;
        valued.profit_loss = profit_loss;
        valued.profit_loss_pct = profit_loss_pct(profit_loss, holding.total_purchase);
        valued
    }

    /// Recompute total purchase cost, then the current-value fields.
    ///
    /// A holding without a current price gets zeroed current-value fields.
    pub fn revalue(holding: &Holding) -> Holding {
        let mut priced = holding.clone();
        priced.total_purchase = holding.quantity * holding.purchase_price;

        match priced.current_price {
            Some(price) => Self::apply_current_price(&priced, price),
            None => {
                priced.current_value = 0.0;
                priced.profit_loss = 0.0;
                priced.profit_loss_pct = 0.0;
                priced
            }
        }
    }
}

/// Profit/loss as a percentage of purchase cost; zero without a cost basis
pub fn profit_loss_pct(profit_loss: f64, total_purchase: f64) -> f64 {
    if total_purchase > 0.0 {
        profit_loss / total_purchase * 100.0
    } else {
        0.0
    }
}
