//! SQLite database module

pub mod models;
mod migrations;
mod holdings;

use crate::db::InventoryStore;
use crate::error::Result;
use models::*;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Create new SQLite database connection
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets display reads proceed while a refresh is writing
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn)
    }

    /// Create a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };

        // Run migrations
        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }
}

impl InventoryStore for SqliteDb {
    fn list(&self, order: HoldingOrder) -> Result<Vec<Holding>> {
        let conn = self.conn.lock();
        holdings::get_holdings(&conn, order)
    }

    fn get(&self, id: i64) -> Result<Option<Holding>> {
        let conn = self.conn.lock();
        holdings::get_holding(&conn, id)
    }

    fn create(&self, holding: &Holding) -> Result<i64> {
        let conn = self.conn.lock();
        holdings::create_holding(&conn, holding)
    }

    fn update(&self, holding: &Holding) -> Result<()> {
        let conn = self.conn.lock();
        holdings::update_holding(&conn, holding)
    }

    fn update_valuation(&self, id: i64, valuation: &Valuation) -> Result<()> {
        let conn = self.conn.lock();
        holdings::update_valuation(&conn, id, valuation)
    }

    fn delete(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        holdings::delete_holding(&conn, id)
    }
}
