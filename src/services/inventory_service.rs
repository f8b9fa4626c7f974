//! Inventory Service
//!
//! Create, edit, delete and list holdings. Every create and edit recomputes
//! the derived fields; a holding without a current price gets one from the
//! feed when the application is online.

use crate::catalog::{self, Unit};
use crate::db::sqlite::models::{Holding, HoldingOrder};
use crate::error::{AppError, Result};
use crate::services::valuation_service::ValuationService;
use crate::state::AppState;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Price source recorded for user-entered current prices
pub const MANUAL_PRICE_SOURCE: &str = "manual";

/// Input for a new holding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHolding {
    pub code: String,
    pub quantity: f64,
    /// Defaults to the instrument's unit
    pub unit: Option<Unit>,
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
    pub current_price: Option<f64>,
    pub note: Option<String>,
}

/// Partial edit of an existing holding; `None` keeps the stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingUpdate {
    pub code: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
    pub purchase_price: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
    pub current_price: Option<f64>,
    /// `Some("")` clears the note
    pub note: Option<String>,
}

/// Inventory service for business logic
pub struct InventoryService;

impl InventoryService {
    /// List live holdings
    pub fn list(state: &AppState, order: HoldingOrder) -> Result<Vec<Holding>> {
        state.store.list(order)
    }

    /// Get a holding or fail with `NotFound`
    pub fn get(state: &AppState, id: i64) -> Result<Holding> {
        state
            .store
            .get(id)?
            .ok_or_else(|| AppError::NotFound(format!("Holding not found: {}", id)))
    }

    /// Record a new holding
    pub async fn add(state: &AppState, input: NewHolding) -> Result<Holding> {
        let instrument = catalog::require(&input.code)?;
        let unit = input.unit.unwrap_or(instrument.default_unit);

        validate_quantity(input.quantity, unit)?;
        validate_price("Purchase price", input.purchase_price)?;
        if let Some(price) = input.current_price {
            validate_price("Current price", price)?;
        }

        let mut holding = Holding {
            id: 0,
            category: instrument.category,
            variant: instrument.variant.to_string(),
            code: instrument.code.to_string(),
            quantity: input.quantity,
            unit,
            purchase_date: input.purchase_date,
            purchase_price: input.purchase_price,
            total_purchase: 0.0,
            current_price: None,
            current_value: 0.0,
            profit_loss: 0.0,
            profit_loss_pct: 0.0,
            price_source: None,
            priced_at: None,
            note: clean_note(input.note),
            created_at: String::new(),
            updated_at: String::new(),
        };

        match input.current_price {
            Some(price) => set_manual_price(&mut holding, price),
            None => Self::price_from_feed(state, &mut holding).await,
        }

        let holding = ValuationService::revalue(&holding);
        let id = state.store.create(&holding)?;

        info!(
            "Added holding {}: {} {} {}",
            id, holding.quantity, holding.unit, holding.code
        );
        Self::get(state, id)
    }

    /// Apply a partial edit to a holding
    pub async fn update(state: &AppState, id: i64, edit: HoldingUpdate) -> Result<Holding> {
        let mut holding = Self::get(state, id)?;

        if let Some(code) = edit.code.as_deref() {
            let instrument = catalog::require(code)?;
            if instrument.code != holding.code {
                holding.category = instrument.category;
                holding.variant = instrument.variant.to_string();
                holding.code = instrument.code.to_string();
                if edit.unit.is_none() {
                    holding.unit = instrument.default_unit;
                }
                // The old price belongs to another instrument
                holding.current_price = None;
                holding.price_source = None;
                holding.priced_at = None;
            }
        }
        if let Some(unit) = edit.unit {
            holding.unit = unit;
        }
        if let Some(quantity) = edit.quantity {
            holding.quantity = quantity;
        }
        if let Some(price) = edit.purchase_price {
            validate_price("Purchase price", price)?;
            holding.purchase_price = price;
        }
        if let Some(date) = edit.purchase_date {
            holding.purchase_date = date;
        }
        if let Some(note) = edit.note {
            holding.note = clean_note(Some(note));
        }
        validate_quantity(holding.quantity, holding.unit)?;

        match edit.current_price {
            Some(price) => {
                validate_price("Current price", price)?;
                set_manual_price(&mut holding, price);
            }
            None if holding.current_price.is_none() => {
                Self::price_from_feed(state, &mut holding).await
            }
            None => {}
        }

        let holding = ValuationService::revalue(&holding);
        state.store.update(&holding)?;

        info!("Updated holding {}", id);
        Self::get(state, id)
    }

    /// Delete a holding
    pub fn delete(state: &AppState, id: i64) -> Result<()> {
        state.store.delete(id)?;
        info!("Deleted holding {}", id);
        Ok(())
    }

    /// Resolve the holding's current price from a fresh snapshot.
    ///
    /// Failures are logged and leave the holding unvalued until the next refresh.
    async fn price_from_feed(state: &AppState, holding: &mut Holding) {
        if state.offline {
            return;
        }

        let snapshot = match state.feed.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Could not price {} at entry: {}", holding.code, e);
                return;
            }
        };

        match snapshot.resolve_price(&holding.code) {
            Ok(price) => {
                holding.current_price = Some(price);
                holding.price_source = Some(snapshot.source.clone());
                holding.priced_at = Some(snapshot.fetched_at.to_rfc3339());
            }
            Err(e) => warn!("Could not price {} at entry: {}", holding.code, e),
        }
    }
}

fn set_manual_price(holding: &mut Holding, price: f64) {
    holding.current_price = Some(price);
    holding.price_source = Some(MANUAL_PRICE_SOURCE.to_string());
    holding.priced_at = Some(Utc::now().to_rfc3339());
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn validate_quantity(quantity: f64, unit: Unit) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(AppError::Validation(format!(
            "Quantity must be a positive number, got {}",
            quantity
        )));
    }
    if !unit.is_mass() && quantity.fract() != 0.0 {
        return Err(AppError::Validation(format!(
            "Quantity in {} must be a whole number, got {}",
            unit, quantity
        )));
    }
    Ok(())
}

fn validate_price(label: &str, price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(format!(
            "{} must be zero or positive, got {}",
            label, price
        )));
    }
    Ok(())
}
