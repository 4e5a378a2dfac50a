//! Administrative balance corrections (insert-only).

use rusqlite::Connection;
use vstory_types::earning::BalanceAdjustment;

use crate::queries::amount;
use crate::{to_sql, Result};

/// Record a correction that has already been applied to the balance.
pub fn insert(
    conn: &Connection,
    account_id: &str,
    admin_id: &str,
    delta: i64,
    reason: &str,
    balance_after: u64,
    created_at: u64,
) -> Result<BalanceAdjustment> {
    conn.execute(
        "INSERT INTO balance_adjustments
             (account_id, admin_id, delta, reason, balance_after, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            account_id,
            admin_id,
            delta,
            reason,
            to_sql(balance_after)?,
            to_sql(created_at)?,
        ],
    )?;
    Ok(BalanceAdjustment {
        id: conn.last_insert_rowid(),
        account_id: account_id.to_string(),
        admin_id: admin_id.to_string(),
        delta,
        reason: reason.to_string(),
        balance_after,
        created_at,
    })
}

/// Corrections applied to an account, newest first.
pub fn for_account(
    conn: &Connection,
    account_id: &str,
    limit: u32,
) -> Result<Vec<BalanceAdjustment>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, admin_id, delta, reason, balance_after, created_at
         FROM balance_adjustments WHERE account_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![account_id, limit], |row| {
            Ok(BalanceAdjustment {
                id: row.get(0)?,
                account_id: row.get(1)?,
                admin_id: row.get(2)?,
                delta: row.get(3)?,
                reason: row.get(4)?,
                balance_after: amount(row, 5)?,
                created_at: amount(row, 6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
