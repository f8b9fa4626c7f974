//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_holdings", CREATE_HOLDINGS_TABLE)?;
    run_migration(conn, "002_holdings_indexes", CREATE_HOLDINGS_INDEXES)?;
    run_migration(conn, "003_holdings_price_provenance", ADD_PRICE_PROVENANCE)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_HOLDINGS_TABLE: &str = r#"
CREATE TABLE holdings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    variant TEXT NOT NULL,
    code TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit TEXT NOT NULL,
    purchase_date TEXT NOT NULL,
    purchase_price REAL NOT NULL,
    total_purchase REAL NOT NULL,
    current_price REAL,
    current_value REAL NOT NULL DEFAULT 0,
    profit_loss REAL NOT NULL DEFAULT 0,
    profit_loss_pct REAL NOT NULL DEFAULT 0,
    note TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    deleted_at TEXT
);
"#;

const CREATE_HOLDINGS_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_holdings_deleted_at ON holdings(deleted_at);
CREATE INDEX IF NOT EXISTS idx_holdings_code ON holdings(code);
"#;

const ADD_PRICE_PROVENANCE: &str = r#"
ALTER TABLE holdings ADD COLUMN price_source TEXT;
ALTER TABLE holdings ADD COLUMN priced_at TEXT;
"#;
