//! Services Layer
//!
//! Business logic shared by the CLI commands and the refresh scheduler.
//!
//! # Architecture
//!
//! ```text
//! CLI commands ──────┐
//!                    ├──> Services --> Store / Price feed
//! Refresh scheduler ─┘
//! ```
//!
//! # Services
//!
//! - `ValuationService` - Current value and profit/loss arithmetic
//! - `AggregationService` - Per-code groups and portfolio totals
//! - `InventoryService` - Add, edit, delete and list holdings
//! - `RefreshService` - Apply a price snapshot across all holdings

pub mod valuation_service;
pub mod aggregation_service;
pub mod inventory_service;
pub mod refresh_service;

// Re-export commonly used types and services
pub use valuation_service::ValuationService;
pub use aggregation_service::{AggregationService, Group, PortfolioTotals, UNDEFINED_GROUP_KEY};
pub use inventory_service::{HoldingUpdate, InventoryService, NewHolding};
pub use refresh_service::{RefreshReport, RefreshService};
