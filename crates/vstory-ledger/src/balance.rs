//! The balance mutation primitive.
//!
//! Every path that changes `coin_balance` goes through here and runs inside
//! the caller's transaction. The guard is part of the `UPDATE` itself, so a
//! debit can never observe a stale balance.

use rusqlite::Connection;
use vstory_db::queries::accounts;

use crate::{LedgerError, Result};

/// Apply a signed change to an account's balance and return the new balance.
///
/// A debit fails with [`LedgerError::InsufficientBalance`] (and writes
/// nothing) when the balance would go negative. A credit fails with
/// [`LedgerError::Validation`] if it would overflow the stored range.
/// A zero delta is a read.
pub fn credit_or_debit(conn: &Connection, account_id: &str, delta: i64) -> Result<u64> {
    match delta {
        d if d < 0 => debit(conn, account_id, d.unsigned_abs()),
        d if d > 0 => credit(conn, account_id, d.unsigned_abs()),
        _ => Ok(accounts::balance(conn, account_id)?),
    }
}

/// Subtract `coins` from the balance, refusing to go below zero.
pub fn debit(conn: &Connection, account_id: &str, coins: u64) -> Result<u64> {
    if i64::try_from(coins).is_ok() && accounts::debit_if_sufficient(conn, account_id, coins)? {
        return Ok(accounts::balance(conn, account_id)?);
    }
    // Either the account is missing (NotFound) or the guard refused.
    let available = accounts::balance(conn, account_id)?;
    tracing::debug!(account_id, required = coins, available, "debit refused");
    Err(LedgerError::InsufficientBalance {
        required: coins,
        available,
    })
}

/// Add `coins` to the balance.
pub fn credit(conn: &Connection, account_id: &str, coins: u64) -> Result<u64> {
    if i64::try_from(coins).is_ok() && accounts::credit_within_range(conn, account_id, coins)? {
        return Ok(accounts::balance(conn, account_id)?);
    }
    let current = accounts::balance(conn, account_id)?;
    Err(LedgerError::Validation(format!(
        "credit of {coins} would overflow balance {current} of account '{account_id}'"
    )))
}
