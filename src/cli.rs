//! Command-line definition

use crate::commands::holdings::{AddHoldingRequest, EditHoldingRequest};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bullion-desk", version)]
#[command(about = "Track precious-metal and foreign-currency holdings against live prices")]
pub struct Cli {
    /// Never contact the price feed
    #[arg(long, global = true)]
    pub offline: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show holdings and totals from the database
    List,
    /// Refresh prices, then show holdings, groups and totals
    Show,
    /// Show holdings grouped by instrument
    Groups,
    /// Record a purchase
    Add(AddHoldingRequest),
    /// Edit a holding
    Edit(EditHoldingRequest),
    /// Delete a holding
    Delete {
        /// Holding ID as shown by `list`
        id: i64,
    },
    /// Refresh prices once
    Refresh,
    /// Refresh prices periodically and redraw until Ctrl-C
    Watch,
    /// List every price the feed publishes
    Prices,
    /// List supported instruments
    Catalog,
}
