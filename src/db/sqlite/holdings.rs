//! Holding records

use crate::db::sqlite::models::{Holding, HoldingOrder, Valuation};
use crate::error::{AppError, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::str::FromStr;

const HOLDING_COLUMNS: &str = "id, category, variant, code, quantity, unit, purchase_date,
     purchase_price, total_purchase, current_price, current_value, profit_loss, profit_loss_pct,
     price_source, priced_at, note, created_at, updated_at";

fn parse_text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = AppError>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_holding(row: &Row<'_>) -> rusqlite::Result<Holding> {
    Ok(Holding {
        id: row.get(0)?,
        category: parse_text_column(row, 1)?,
        variant: row.get(2)?,
        code: row.get(3)?,
        quantity: row.get(4)?,
        unit: parse_text_column(row, 5)?,
        purchase_date: row.get(6)?,
        purchase_price: row.get(7)?,
        total_purchase: row.get(8)?,
        current_price: row.get(9)?,
        current_value: row.get(10)?,
        profit_loss: row.get(11)?,
        profit_loss_pct: row.get(12)?,
        price_source: row.get(13)?,
        priced_at: row.get(14)?,
        note: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

/// Get all live holdings in the requested order
pub fn get_holdings(conn: &Connection, order: HoldingOrder) -> Result<Vec<Holding>> {
    let order_by = match order {
        HoldingOrder::CategoryThenPurchaseDate => "purchase_date ASC, id ASC",
        HoldingOrder::CategoryThenVariant => "variant ASC, id ASC",
    };

    let sql = format!(
        "SELECT {} FROM holdings WHERE deleted_at IS NULL
         ORDER BY CASE category WHEN 'metal' THEN 0 ELSE 1 END, {}",
        HOLDING_COLUMNS, order_by
    );
    let mut stmt = conn.prepare(&sql)?;

    let holdings = stmt
        .query_map([], map_holding)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(holdings)
}

/// Get holding by ID
pub fn get_holding(conn: &Connection, id: i64) -> Result<Option<Holding>> {
    let sql = format!(
        "SELECT {} FROM holdings WHERE id = ? AND deleted_at IS NULL",
        HOLDING_COLUMNS
    );

    let holding = conn.query_row(&sql, [id], map_holding).optional()?;
    Ok(holding)
}

/// Create a new holding, returning its ID
pub fn create_holding(conn: &Connection, holding: &Holding) -> Result<i64> {
    conn.execute(
        "INSERT INTO holdings (category, variant, code, quantity, unit, purchase_date,
            purchase_price, total_purchase, current_price, current_value, profit_loss,
            profit_loss_pct, price_source, priced_at, note)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            holding.category.as_str(),
            holding.variant,
            holding.code,
            holding.quantity,
            holding.unit.as_str(),
            holding.purchase_date,
            holding.purchase_price,
            holding.total_purchase,
            holding.current_price,
            holding.current_value,
            holding.profit_loss,
            holding.profit_loss_pct,
            holding.price_source,
            holding.priced_at,
            holding.note,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Overwrite every user-editable and derived field of a holding
pub fn update_holding(conn: &Connection, holding: &Holding) -> Result<()> {
    let rows = conn.execute(
        "UPDATE holdings SET category = ?, variant = ?, code = ?, quantity = ?, unit = ?,
            purchase_date = ?, purchase_price = ?, total_purchase = ?, current_price = ?,
            current_value = ?, profit_loss = ?, profit_loss_pct = ?, price_source = ?,
            priced_at = ?, note = ?, updated_at = datetime('now')
         WHERE id = ? AND deleted_at IS NULL",
        rusqlite::params![
            holding.category.as_str(),
            holding.variant,
            holding.code,
            holding.quantity,
            holding.unit.as_str(),
            holding.purchase_date,
            holding.purchase_price,
            holding.total_purchase,
            holding.current_price,
            holding.current_value,
            holding.profit_loss,
            holding.profit_loss_pct,
            holding.price_source,
            holding.priced_at,
            holding.note,
            holding.id,
        ],
    )?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Holding not found: {}", holding.id)));
    }

    Ok(())
}

/// Write only the current-value fields of a holding
pub fn update_valuation(conn: &Connection, id: i64, valuation: &Valuation) -> Result<()> {
    let rows = conn.execute(
        "UPDATE holdings SET current_price = ?, current_value = ?, profit_loss = ?,
            profit_loss_pct = ?, price_source = ?, priced_at = ?, updated_at = datetime('now')
         WHERE id = ? AND deleted_at IS NULL",
        rusqlite::params![
            valuation.current_price,
            valuation.current_value,
            valuation.profit_loss,
            valuation.profit_loss_pct,
            valuation.price_source,
            valuation.priced_at,
            id,
        ],
    )?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Holding not found: {}", id)));
    }

    Ok(())
}

/// Soft-delete a holding
pub fn delete_holding(conn: &Connection, id: i64) -> Result<()> {
    let rows = conn.execute(
        "UPDATE holdings SET deleted_at = datetime('now') WHERE id = ? AND deleted_at IS NULL",
        [id],
    )?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Holding not found: {}", id)));
    }

    Ok(())
}
