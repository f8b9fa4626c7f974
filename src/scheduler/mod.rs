//! Scheduler module for Bullion Desk
//!
//! Handles the recurring price refresh.

mod price_refresh;

pub use price_refresh::{
    RefreshEvent, RefreshOutcome, RefreshPhase, RefreshScheduler, SchedulerHandle,
};
