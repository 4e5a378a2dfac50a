//! Withdrawal request rows.

use rusqlite::{Connection, OptionalExtension};
use vstory_types::requests::{BankDestination, RequestStatus, Withdrawal};

use crate::queries::{amount, checked_sum, label, opt_amount};
use crate::{to_sql, DbError, Result};

const COLUMNS: &str = "id, account_id, coins_reserved, payout_amount, bank_name, bank_account,
     bank_holder, status, admin_id, admin_note, created_at, processed_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Withdrawal> {
    Ok(Withdrawal {
        id: row.get(0)?,
        account_id: row.get(1)?,
        coins_reserved: amount(row, 2)?,
        payout_amount: amount(row, 3)?,
        destination: BankDestination {
            bank_name: row.get(4)?,
            bank_account: row.get(5)?,
            bank_holder: row.get(6)?,
        },
        status: label(row, 7)?,
        admin_id: row.get(8)?,
        admin_note: row.get(9)?,
        created_at: amount(row, 10)?,
        processed_at: opt_amount(row, 11)?,
    })
}

/// Insert a pending withdrawal and return its id.
pub fn insert(
    conn: &Connection,
    account_id: &str,
    coins_reserved: u64,
    payout_amount: u64,
    destination: &BankDestination,
    created_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO withdrawals (account_id, coins_reserved, payout_amount,
                                  bank_name, bank_account, bank_holder, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            account_id,
            to_sql(coins_reserved)?,
            to_sql(payout_amount)?,
            destination.bank_name,
            destination.bank_account,
            destination.bank_holder,
            to_sql(created_at)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Look up a withdrawal that must exist.
pub fn get(conn: &Connection, id: i64) -> Result<Withdrawal> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM withdrawals WHERE id = ?1"),
        [id],
        map_row,
    )
    .optional()?
    .ok_or_else(|| DbError::NotFound(format!("withdrawal {id}")))
}

/// Move a pending withdrawal to a terminal status.
///
/// Returns `false` if the withdrawal was no longer pending.
pub fn finish(
    conn: &Connection,
    id: i64,
    status: RequestStatus,
    admin_id: &str,
    admin_note: Option<&str>,
    processed_at: u64,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE withdrawals SET status = ?2, admin_id = ?3, admin_note = ?4, processed_at = ?5
         WHERE id = ?1 AND status = 'pending'",
        rusqlite::params![id, status.as_str(), admin_id, admin_note, to_sql(processed_at)?],
    )?;
    Ok(updated == 1)
}

/// List withdrawals, newest first, optionally filtered by account and status.
pub fn list(
    conn: &Connection,
    account_id: Option<&str>,
    status: Option<RequestStatus>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Withdrawal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM withdrawals
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

/// Number of withdrawals in a status.
pub fn count_with_status(conn: &Connection, status: RequestStatus) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM withdrawals WHERE status = ?1",
        [status.as_str()],
        |row| row.get(0),
    )?;
    Ok(crate::from_sql(n))
}

/// Coins currently reserved by an account's pending withdrawals.
pub fn pending_total(conn: &Connection, account_id: &str) -> Result<u64> {
    checked_sum(
        conn,
        "SELECT coins_reserved FROM withdrawals WHERE account_id = ?1 AND status = 'pending'",
        [account_id],
        "pending withdrawal total",
    )
}
