//! SQLite persistence for simulation output.
//!
//! RULE: Only the store talks to the database.
//! Analyses receive loaded `Run` / `Frame` values and never execute SQL.

use crate::error::AnalysisResult;
use rusqlite::Connection;

mod frame;
mod run;

pub struct OutputStore {
    conn: Connection,
}

impl OutputStore {
    pub fn open(path: &str) -> AnalysisResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::info!("opened output store {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AnalysisResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AnalysisResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_outputs.sql"))?;
        Ok(())
    }
}
