//! Terminal rendering of holdings, groups, totals and quotes

pub mod format;
pub mod table;

use crate::catalog::Instrument;
use crate::db::sqlite::models::Holding;
use crate::feeds::types::{FeedCatalog, PriceSnapshot};
use crate::services::{Group, PortfolioTotals, RefreshReport};
use format::{format_money, format_optional_money, format_pct, format_quantity};
use table::{Align, Table};

/// Holdings table, one row per purchase
pub fn render_holdings(holdings: &[Holding]) -> String {
    if holdings.is_empty() {
        return "No holdings recorded yet. Use `add` to record one.".to_string();
    }

    let mut table = Table::new(&[
        ("ID", Align::Right),
        ("TYPE", Align::Left),
        ("VARIANT", Align::Left),
        ("CODE", Align::Left),
        ("QTY", Align::Right),
        ("UNIT", Align::Left),
        ("BOUGHT", Align::Left),
        ("BUY PRICE", Align::Right),
        ("COST", Align::Right),
        ("PRICE", Align::Right),
        ("VALUE", Align::Right),
        ("P/L", Align::Right),
        ("P/L %", Align::Right),
    ]);

    for h in holdings {
        let valued = h.current_price.is_some();
        table.add_row(vec![
            h.id.to_string(),
            h.category.to_string(),
            h.variant.clone(),
            h.code.clone(),
            format_quantity(h.quantity, h.unit),
            h.unit.to_string(),
            h.purchase_date.format("%d.%m.%Y").to_string(),
            format_money(h.purchase_price),
            format_money(h.total_purchase),
            format_optional_money(h.current_price),
            if valued { format_money(h.current_value) } else { "-".to_string() },
            if valued { format_money(h.profit_loss) } else { "-".to_string() },
            if valued { format_pct(h.profit_loss_pct) } else { "-".to_string() },
        ]);
    }

    table.render()
}

/// Group table, one row per instrument code
pub fn render_groups(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups to show.".to_string();
    }

    let mut table = Table::new(&[
        ("CODE", Align::Left),
        ("TYPE", Align::Left),
        ("VARIANT", Align::Left),
        ("COUNT", Align::Right),
        ("QTY", Align::Right),
        ("UNIT", Align::Left),
        ("AVG PRICE", Align::Right),
        ("COST", Align::Right),
        ("VALUE", Align::Right),
        ("P/L", Align::Right),
        ("P/L %", Align::Right),
        ("AVG P/L", Align::Right),
    ]);

    for g in groups {
        table.add_row(vec![
            g.code.clone(),
            g.category.to_string(),
            g.variant.clone(),
            g.holding_count.to_string(),
            format_quantity(g.total_quantity, g.unit),
            g.unit.to_string(),
            format_money(g.average_purchase_price),
            format_money(g.total_purchase),
            format_money(g.current_value),
            format_money(g.profit_loss),
            format_pct(g.profit_loss_pct),
            format_money(g.average_profit_loss),
        ]);
    }

    table.render()
}

/// Portfolio summary lines
pub fn render_totals(totals: &PortfolioTotals) -> String {
    [
        format!("Holdings:       {}", totals.holding_count),
        format!("Total cost:     {} TL", format_money(totals.total_purchase)),
        format!("Current value:  {} TL", format_money(totals.current_value)),
        format!(
            "Profit/loss:    {} TL ({})",
            format_money(totals.profit_loss),
            format_pct(totals.profit_loss_pct)
        ),
    ]
    .join("\n")
}

/// Every quote of a snapshot
pub fn render_quotes(snapshot: &PriceSnapshot) -> String {
    let mut table = Table::new(&[
        ("CATALOG", Align::Left),
        ("CODE", Align::Left),
        ("DESCRIPTION", Align::Left),
        ("BUY", Align::Right),
        ("SELL", Align::Right),
        ("UPDATED", Align::Left),
    ]);

    for (catalog, quote) in snapshot.all_quotes() {
        table.add_row(vec![
            match catalog {
                FeedCatalog::Metals => "metals".to_string(),
                FeedCatalog::Currencies => "currencies".to_string(),
            },
            quote.code.clone(),
            quote.description.clone(),
            format_money(quote.buy),
            format_money(quote.sell),
            quote.last_updated.clone().unwrap_or_default(),
        ]);
    }

    format!(
        "{}\n\n{} quotes from {} feed at {}",
        table.render(),
        snapshot.len(),
        snapshot.source,
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Supported instruments
pub fn render_catalog(instruments: &[Instrument]) -> String {
    let mut table = Table::new(&[
        ("CODE", Align::Left),
        ("TYPE", Align::Left),
        ("VARIANT", Align::Left),
        ("UNIT", Align::Left),
    ]);

    for i in instruments {
        table.add_row(vec![
            i.code.to_string(),
            i.category.to_string(),
            i.variant.to_string(),
            i.default_unit.to_string(),
        ]);
    }

    table.render()
}

/// One line describing a finished refresh
pub fn render_report(report: &RefreshReport) -> String {
    let mut line = format!(
        "Prices refreshed at {}: {} updated, {} skipped, {} failed",
        report.snapshot_time.format("%Y-%m-%d %H:%M:%S UTC"),
        report.updated,
        report.skipped,
        report.failed
    );
    if report.interrupted {
        line.push_str(" (interrupted)");
    }
    line
}
