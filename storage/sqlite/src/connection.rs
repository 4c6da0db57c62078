//! Opening SQLite connections

use std::path::PathBuf;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SqliteError;

/// Configuration for SQLite connections
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqliteConfig {
    /// File-based database
    File(PathBuf),
    /// In-memory database (for testing)
    Memory,
}

pub fn open(config: &SqliteConfig) -> Result<Connection, SqliteError> {
    let conn = match config {
        SqliteConfig::File(path) => Connection::open(path)?,
        SqliteConfig::Memory => Connection::open_in_memory()?,
    };
    debug!(?config, "opened sqlite connection");

    // Performance optimizations
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA cache_size=-64000;
         PRAGMA temp_store=MEMORY;",
    )?;

    Ok(conn)
}
