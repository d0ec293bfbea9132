//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The runner and the shelf tools go through PreferenceStore or the
//! event log methods; they never execute SQL directly.

mod event_log;
mod preference;

use crate::error::RigResult;
use rusqlite::Connection;

pub struct RigStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl RigStore {
    pub fn open(path: &str) -> RigResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RigResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order. Safe to run on every start.
    pub fn migrate(&self) -> RigResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }
}
