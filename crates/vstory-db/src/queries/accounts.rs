//! Account rows and the primitive balance updates.
//!
//! The two balance updates below are single conditional statements: the
//! guard and the write happen in one step, so a stale earlier read can
//! never push a balance below zero.

use rusqlite::{Connection, OptionalExtension};
use vstory_types::account::{Account, Role};

use crate::queries::{amount, label};
use crate::{to_sql, DbError, Result};

const COLUMNS: &str = "id, display_name, role, coin_balance, referred_by, created_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        display_name: row.get(1)?,
        role: label(row, 2)?,
        coin_balance: amount(row, 3)?,
        referred_by: row.get(4)?,
        created_at: amount(row, 5)?,
    })
}

/// Insert a new account with zero balance.
pub fn insert(
    conn: &Connection,
    id: &str,
    display_name: &str,
    role: Role,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (id, display_name, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id, display_name, role.as_str(), to_sql(created_at)?],
    )?;
    Ok(())
}

/// Create the account as a reader if it does not exist yet, then return it.
pub fn ensure(conn: &Connection, id: &str, display_name: &str, created_at: u64) -> Result<Account> {
    conn.execute(
        "INSERT OR IGNORE INTO accounts (id, display_name, role, created_at)
         VALUES (?1, ?2, 'reader', ?3)",
        rusqlite::params![id, display_name, to_sql(created_at)?],
    )?;
    get(conn, id)
}

/// Look up an account.
pub fn find(conn: &Connection, id: &str) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM accounts WHERE id = ?1"),
            [id],
            map_row,
        )
        .optional()?;
    Ok(account)
}

/// Look up an account that must exist.
pub fn get(conn: &Connection, id: &str) -> Result<Account> {
    find(conn, id)?.ok_or_else(|| DbError::NotFound(format!("account '{id}'")))
}

/// Current balance of an account.
pub fn balance(conn: &Connection, id: &str) -> Result<u64> {
    conn.query_row(
        "SELECT coin_balance FROM accounts WHERE id = ?1",
        [id],
        |row| amount(row, 0),
    )
    .optional()?
    .ok_or_else(|| DbError::NotFound(format!("account '{id}'")))
}

/// Subtract `coins` if and only if the balance covers it.
///
/// Returns `false` when the guard failed (or the account does not exist);
/// nothing is written in that case.
pub fn debit_if_sufficient(conn: &Connection, id: &str, coins: u64) -> Result<bool> {
    let coins = to_sql(coins)?;
    let updated = conn.execute(
        "UPDATE accounts SET coin_balance = coin_balance - ?1
         WHERE id = ?2 AND coin_balance >= ?1",
        rusqlite::params![coins, id],
    )?;
    Ok(updated == 1)
}

/// Add `coins` unless the result would leave the `i64` storage range.
///
/// Returns `false` when the guard failed (or the account does not exist).
pub fn credit_within_range(conn: &Connection, id: &str, coins: u64) -> Result<bool> {
    let coins = to_sql(coins)?;
    let ceiling = i64::MAX - coins;
    let updated = conn.execute(
        "UPDATE accounts SET coin_balance = coin_balance + ?1
         WHERE id = ?2 AND coin_balance <= ?3",
        rusqlite::params![coins, id, ceiling],
    )?;
    Ok(updated == 1)
}

/// Change an account's role.
pub fn set_role(conn: &Connection, id: &str, role: Role) -> Result<()> {
    let updated = conn.execute(
        "UPDATE accounts SET role = ?1 WHERE id = ?2",
        rusqlite::params![role.as_str(), id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("account '{id}'")));
    }
    Ok(())
}

/// Record who referred `id`. Succeeds only the first time.
pub fn set_referrer_once(conn: &Connection, id: &str, referrer_id: &str) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE accounts SET referred_by = ?2 WHERE id = ?1 AND referred_by IS NULL",
        rusqlite::params![id, referrer_id],
    )?;
    Ok(updated == 1)
}

/// The account that referred `id`, if any.
pub fn referrer_of(conn: &Connection, id: &str) -> Result<Option<Account>> {
    let referrer = conn
        .query_row(
            "SELECT r.id, r.display_name, r.role, r.coin_balance, r.referred_by, r.created_at
             FROM accounts r
             JOIN accounts a ON a.referred_by = r.id
             WHERE a.id = ?1",
            [id],
            map_row,
        )
        .optional()?;
    Ok(referrer)
}

/// Count accounts (admin dashboard).
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
    Ok(crate::from_sql(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        insert(&conn, "u1", "Reader One", Role::Reader, 100).expect("insert");
        let account = get(&conn, "u1").expect("get");
        assert_eq!(account.role, Role::Reader);
        assert_eq!(account.coin_balance, 0);
        assert_eq!(account.referred_by, None);
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let conn = test_db();
        let first = ensure(&conn, "u1", "One", 100).expect("ensure");
        credit_within_range(&conn, "u1", 50).expect("credit");
        let second = ensure(&conn, "u1", "Renamed", 200).expect("ensure again");
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.display_name, "One");
        assert_eq!(second.coin_balance, 50);
    }

    #[test]
    fn test_missing_account() {
        let conn = test_db();
        assert!(matches!(get(&conn, "ghost"), Err(DbError::NotFound(_))));
        assert!(matches!(balance(&conn, "ghost"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_debit_guard() {
        let conn = test_db();
        insert(&conn, "u1", "One", Role::Reader, 100).expect("insert");
        credit_within_range(&conn, "u1", 100).expect("credit");

        assert!(debit_if_sufficient(&conn, "u1", 60).expect("debit"));
        assert!(!debit_if_sufficient(&conn, "u1", 60).expect("second debit"));
        assert_eq!(balance(&conn, "u1").expect("balance"), 40);
    }

    #[test]
    fn test_credit_overflow_guard() {
        let conn = test_db();
        insert(&conn, "u1", "One", Role::Reader, 100).expect("insert");
        assert!(credit_within_range(&conn, "u1", i64::MAX as u64).expect("credit"));
        assert!(!credit_within_range(&conn, "u1", 1).expect("overflowing credit"));
        assert_eq!(balance(&conn, "u1").expect("balance"), i64::MAX as u64);
    }

    #[test]
    fn test_referrer_set_once() {
        let conn = test_db();
        insert(&conn, "author", "Author", Role::Author, 100).expect("insert");
        insert(&conn, "other", "Other", Role::Author, 100).expect("insert");
        insert(&conn, "u1", "One", Role::Reader, 100).expect("insert");

        assert!(set_referrer_once(&conn, "u1", "author").expect("set"));
        assert!(!set_referrer_once(&conn, "u1", "other").expect("second set"));

        let referrer = referrer_of(&conn, "u1").expect("lookup").expect("has referrer");
        assert_eq!(referrer.id, "author");
        assert!(referrer_of(&conn, "author").expect("lookup").is_none());
    }

    #[test]
    fn test_negative_balance_rejected_by_schema() {
        let conn = test_db();
        insert(&conn, "u1", "One", Role::Reader, 100).expect("insert");
        let result = conn.execute("UPDATE accounts SET coin_balance = -1 WHERE id = 'u1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_role() {
        let conn = test_db();
        insert(&conn, "u1", "One", Role::Reader, 100).expect("insert");
        set_role(&conn, "u1", Role::Author).expect("set role");
        assert_eq!(get(&conn, "u1").expect("get").role, Role::Author);
        assert!(set_role(&conn, "ghost", Role::Author).is_err());
    }
}
