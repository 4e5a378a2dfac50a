//! Forward-only schema migrations.
//!
//! `PRAGMA user_version` holds the number of steps applied. Step `n` lives
//! at `STEPS[n - 1]` and is applied together with its version bump in one
//! transaction, so a crash mid-step leaves the previous version intact.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Migration scripts, oldest first.
const STEPS: &[&str] = &[schema::SCHEMA_V1];

/// Bring the database up to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let applied = user_version(conn)?;
    if applied > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "ledger database is at v{applied}, this build supports up to v{SCHEMA_VERSION}"
        )));
    }

    for version in (applied + 1)..=SCHEMA_VERSION {
        let script = usize::try_from(version - 1)
            .ok()
            .and_then(|i| STEPS.get(i))
            .ok_or_else(|| DbError::Migration(format!("no script for v{version}")))?;
        tracing::info!(version, "applying ledger schema migration");

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }
    Ok(())
}

/// The schema version recorded in the database file.
pub fn user_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
