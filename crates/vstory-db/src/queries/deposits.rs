//! Deposit request rows.

use rusqlite::{Connection, OptionalExtension};
use vstory_types::requests::{Deposit, DepositMethod, RequestStatus};

use crate::queries::{amount, checked_sum, label, opt_amount};
use crate::{to_sql, DbError, Result};

const COLUMNS: &str = "id, account_id, claimed_amount, coins_requested, method, reference_code,
     transfer_note, status, admin_id, admin_note, created_at, processed_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Deposit> {
    Ok(Deposit {
        id: row.get(0)?,
        account_id: row.get(1)?,
        claimed_amount: amount(row, 2)?,
        coins_requested: amount(row, 3)?,
        method: label(row, 4)?,
        reference_code: row.get(5)?,
        transfer_note: row.get(6)?,
        status: label(row, 7)?,
        admin_id: row.get(8)?,
        admin_note: row.get(9)?,
        created_at: amount(row, 10)?,
        processed_at: opt_amount(row, 11)?,
    })
}

/// Fields of a deposit at creation time.
#[derive(Debug, Clone)]
pub struct NewDeposit<'a> {
    pub account_id: &'a str,
    pub claimed_amount: u64,
    pub coins_requested: u64,
    pub method: DepositMethod,
    pub reference_code: &'a str,
    pub transfer_note: Option<&'a str>,
    pub created_at: u64,
}

/// Insert a pending deposit and return its id.
pub fn insert(conn: &Connection, deposit: &NewDeposit<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO deposits (account_id, claimed_amount, coins_requested, method,
                               reference_code, transfer_note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            deposit.account_id,
            to_sql(deposit.claimed_amount)?,
            to_sql(deposit.coins_requested)?,
            deposit.method.as_str(),
            deposit.reference_code,
            deposit.transfer_note,
            to_sql(deposit.created_at)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Whether a reference code is already taken.
pub fn reference_code_exists(conn: &Connection, code: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM deposits WHERE reference_code = ?1",
        [code],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Look up a deposit that must exist.
pub fn get(conn: &Connection, id: i64) -> Result<Deposit> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM deposits WHERE id = ?1"),
        [id],
        map_row,
    )
    .optional()?
    .ok_or_else(|| DbError::NotFound(format!("deposit {id}")))
}

/// Move a pending deposit to a terminal status.
///
/// Returns `false` if the deposit was no longer pending.
pub fn finish(
    conn: &Connection,
    id: i64,
    status: RequestStatus,
    admin_id: &str,
    admin_note: Option<&str>,
    processed_at: u64,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE deposits SET status = ?2, admin_id = ?3, admin_note = ?4, processed_at = ?5
         WHERE id = ?1 AND status = 'pending'",
        rusqlite::params![id, status.as_str(), admin_id, admin_note, to_sql(processed_at)?],
    )?;
    Ok(updated == 1)
}

/// List deposits, newest first, optionally filtered by account and status.
pub fn list(
    conn: &Connection,
    account_id: Option<&str>,
    status: Option<RequestStatus>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Deposit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM deposits
         WHERE (?1 IS NULL OR account_id = ?1) AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![account_id, status.map(|s| s.as_str()), limit, offset],
            map_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Number of deposits in a status.
pub fn count_with_status(conn: &Connection, status: RequestStatus) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM deposits WHERE status = ?1",
        [status.as_str()],
        |row| row.get(0),
    )?;
    Ok(crate::from_sql(n))
}

/// Sum of money claimed by approved deposits.
pub fn approved_money_total(conn: &Connection) -> Result<u64> {
    checked_sum(
        conn,
        "SELECT claimed_amount FROM deposits WHERE status = 'approved'",
        [],
        "approved deposit total",
    )
}
