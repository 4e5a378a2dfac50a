//! Database query functions organized by table.

pub mod accounts;
pub mod adjustments;
pub mod deposits;
pub mod earnings;
pub mod items;
pub mod purchases;
pub mod quests;
pub mod withdrawals;

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, Params, Row};
use vstory_types::ParseLabelError;

use crate::DbError;

/// Read a text column holding an enum label.
pub(crate) fn label<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseLabelError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a non-negative integer column as `u64`.
pub(crate) fn amount(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    Ok(crate::from_sql(row.get::<_, i64>(idx)?))
}

/// Read a nullable timestamp column.
pub(crate) fn opt_amount(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u64>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(crate::from_sql))
}

/// Add up the first column of every row `sql` returns.
///
/// The fold is checked, so a total past `u64::MAX` is reported as
/// [`DbError::Overflow`] instead of SQLite's integer-overflow failure.
pub(crate) fn checked_sum<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    what: &str,
) -> crate::Result<u64> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut total = 0u64;
    while let Some(row) = rows.next()? {
        total = total
            .checked_add(amount(row, 0)?)
            .ok_or_else(|| DbError::Overflow(format!("{what} exceeds {}", u64::MAX)))?;
    }
    Ok(total)
}
