//! Inventory storage

pub mod sqlite;

use crate::error::Result;
use sqlite::models::{Holding, HoldingOrder, Valuation};

/// Record store for holdings
///
/// Every call is an independent unit of work; no operation spans more than
/// one holding.
pub trait InventoryStore: Send + Sync {
    /// List live holdings
    fn list(&self, order: HoldingOrder) -> Result<Vec<Holding>>;

    /// Get a live holding by ID
    fn get(&self, id: i64) -> Result<Option<Holding>>;

    /// Insert a holding (its `id` is ignored) and return the assigned ID
    fn create(&self, holding: &Holding) -> Result<i64>;

    /// Overwrite a holding
    fn update(&self, holding: &Holding) -> Result<()>;

    /// Overwrite only the current-value fields of a holding
    fn update_valuation(&self, id: i64, valuation: &Valuation) -> Result<()>;

    /// Delete a holding
    fn delete(&self, id: i64) -> Result<()>;
}
