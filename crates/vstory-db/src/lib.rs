//! # vstory-db
//!
//! SQLite storage for the VStory coin ledger.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - All timestamps are Unix epoch seconds
//! - Coin amounts are `INTEGER` columns with `CHECK (... >= 0)`
//! - Schema version stored in `PRAGMA user_version`
//!
//! Query functions take a plain `&Connection` so they can run either on a
//! bare connection or inside a `rusqlite::Transaction` (which derefs to one).
//! Ledger invariants spanning several statements are enforced one layer up.

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// An amount or total does not fit the storage range.
    #[error("amount out of range: {0}")]
    Overflow(String),
}

impl DbError {
    /// True for SQLite uniqueness / primary-key / check violations.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DbError::Constraint(_) => true,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }

    /// True when the database was locked by another writer past the busy timeout.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::DatabaseBusy || e.code == ErrorCode::DatabaseLocked
        )
    }
}

impl From<vstory_types::ParseLabelError> for DbError {
    fn from(e: vstory_types::ParseLabelError) -> Self {
        DbError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open (creating if needed) the ledger database file and migrate it.
pub fn open(path: &Path) -> Result<Connection> {
    prepare(Connection::open(path)?)
}

/// A private in-memory ledger, used by unit tests.
pub fn open_memory() -> Result<Connection> {
    prepare(Connection::open_in_memory()?)
}

/// Connection pragmas every ledger connection runs with. The busy timeout
/// comes first so the remaining pragmas already wait on a locked file.
const PRAGMAS: &str = "PRAGMA busy_timeout = 5000;
     PRAGMA journal_mode = WAL;
     PRAGMA foreign_keys = ON;
     PRAGMA synchronous = NORMAL;";

fn prepare(conn: Connection) -> Result<Connection> {
    conn.execute_batch(PRAGMAS)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Convert a coin amount to its SQLite representation.
pub(crate) fn to_sql(amount: u64) -> Result<i64> {
    i64::try_from(amount)
        .map_err(|_| DbError::Overflow(format!("amount {amount} exceeds storage range")))
}

/// Read a non-negative integer column.
pub(crate) fn from_sql(value: i64) -> u64 {
    // CHECK constraints keep stored amounts non-negative
    value.max(0) as u64
}
