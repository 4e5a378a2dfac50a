//! Account provisioning, roles and administrative balance corrections.

use rusqlite::Connection;
use vstory_db::queries::{accounts, adjustments};
use vstory_types::account::{Account, Role};
use vstory_types::earning::BalanceAdjustment;
use vstory_types::events::EventType;

use crate::follow_up::{Committed, Notice};
use crate::{balance, begin, clock, require_admin, LedgerError, Result};

/// Longest accepted adjustment reason.
pub const MAX_REASON_CHARS: usize = 500;

/// Create the account on first access (reader, zero balance) and return it.
///
/// Idempotent: an existing account is returned unchanged.
pub fn ensure_account(conn: &mut Connection, id: &str, display_name: &str) -> Result<Account> {
    let id = id.trim();
    if id.is_empty() {
        return Err(LedgerError::Validation("account id is required".into()));
    }
    let display_name = match display_name.trim() {
        "" => id,
        name => name,
    };

    let tx = begin(conn)?;
    let existed = accounts::find(&tx, id)?.is_some();
    let account = accounts::ensure(&tx, id, display_name, clock::now_secs())?;
    tx.commit()?;

    if !existed {
        tracing::info!(account_id = id, "account created");
    }
    Ok(account)
}

/// Check that `admin_id` may use administrator-only reads.
pub fn authorize(conn: &Connection, admin_id: &str) -> Result<Account> {
    require_admin(conn, admin_id)
}

/// Check that `caller_id` may see `account_id`'s private views: it is the
/// account itself or an administrator. A missing account is `NotFound`.
pub fn require_self_or_admin(conn: &Connection, caller_id: &str, account_id: &str) -> Result<()> {
    if caller_id != account_id {
        require_admin(conn, caller_id)?;
    }
    accounts::get(conn, account_id)?;
    Ok(())
}

/// Change an account's role.
pub fn set_role(
    conn: &mut Connection,
    admin_id: &str,
    account_id: &str,
    role: Role,
) -> Result<Account> {
    let tx = begin(conn)?;
    require_admin(&tx, admin_id)?;
    accounts::set_role(&tx, account_id, role)?;
    let account = accounts::get(&tx, account_id)?;
    tx.commit()?;

    tracing::info!(account_id, admin_id, role = %role, "role changed");
    Ok(account)
}

/// Apply an administrative correction to a live balance.
///
/// Bypasses the revenue split and the earning ledger; the correction is
/// recorded in its own table. A negative `delta` larger than the balance
/// fails with [`LedgerError::InsufficientBalance`]. The returned row's
/// `balance_after` is the new balance.
pub fn adjust_balance(
    conn: &mut Connection,
    account_id: &str,
    delta: i64,
    reason: &str,
    admin_id: &str,
) -> Result<Committed<BalanceAdjustment>> {
    if delta == 0 {
        return Err(LedgerError::Validation("adjustment must be non-zero".into()));
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(LedgerError::Validation("adjustment reason is required".into()));
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(LedgerError::Validation(format!(
            "reason longer than {MAX_REASON_CHARS} characters"
        )));
    }

    let tx = begin(conn)?;
    require_admin(&tx, admin_id)?;
    let balance_after = balance::credit_or_debit(&tx, account_id, delta)?;
    let adjustment = adjustments::insert(
        &tx,
        account_id,
        admin_id,
        delta,
        reason,
        balance_after,
        clock::now_secs(),
    )?;
    tx.commit()?;

    tracing::info!(account_id, admin_id, delta, balance_after, "balance adjusted");
    let notice = Notice::to_account(EventType::BalanceAdjusted, account_id, &adjustment);
    Ok(Committed::new(adjustment).notify(notice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_ensure_account_is_idempotent() {
        let mut conn = testutil::conn();
        let first = ensure_account(&mut conn, "u1", "Reader One").expect("create");
        assert_eq!(first.role, Role::Reader);
        assert_eq!(first.coin_balance, 0);

        crate::balance::credit(&conn, "u1", 10).expect("credit");
        let again = ensure_account(&mut conn, "u1", "Renamed").expect("existing");
        assert_eq!(again.display_name, "Reader One");
        assert_eq!(again.coin_balance, 10);

        let unnamed = ensure_account(&mut conn, "u2", " ").expect("create");
        assert_eq!(unnamed.display_name, "u2");
        assert!(matches!(
            ensure_account(&mut conn, "  ", "x"),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_set_role_requires_admin() {
        let mut conn = testutil::conn();
        testutil::account(&conn, "admin", Role::Admin, 0);
        testutil::account(&conn, "u1", Role::Reader, 0);

        assert!(matches!(
            set_role(&mut conn, "u1", "u1", Role::Admin),
            Err(LedgerError::Forbidden(_))
        ));
        let promoted = set_role(&mut conn, "admin", "u1", Role::Author).expect("promote");
        assert_eq!(promoted.role, Role::Author);
        assert!(matches!(
            set_role(&mut conn, "admin", "ghost", Role::Author),
            Err(LedgerError::NotFound(_))
        ));
        assert!(authorize(&conn, "admin").is_ok());
        assert!(matches!(authorize(&conn, "u1"), Err(LedgerError::Forbidden(_))));
    }

    #[test]
    fn test_self_or_admin() {
        let conn = testutil::conn();
        testutil::account(&conn, "admin", Role::Admin, 0);
        testutil::account(&conn, "u1", Role::Reader, 0);
        testutil::account(&conn, "u2", Role::Author, 0);

        assert!(require_self_or_admin(&conn, "u1", "u1").is_ok());
        assert!(require_self_or_admin(&conn, "admin", "u2").is_ok());
        assert!(matches!(
            require_self_or_admin(&conn, "u1", "u2"),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            require_self_or_admin(&conn, "u2", "u1"),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            require_self_or_admin(&conn, "admin", "ghost"),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            require_self_or_admin(&conn, "ghost", "ghost"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_adjust_balance_both_directions() {
        let mut conn = testutil::conn();
        testutil::account(&conn, "admin", Role::Admin, 0);
        testutil::account(&conn, "u1", Role::Reader, 100);

        let up = adjust_balance(&mut conn, "u1", 400, "compensation", "admin")
            .expect("credit")
            .value;
        assert_eq!(up.balance_after, 500);
        let down = adjust_balance(&mut conn, "u1", -500, "chargeback", "admin")
            .expect("debit")
            .value;
        assert_eq!(down.balance_after, 0);

        let err = adjust_balance(&mut conn, "u1", -1, "overdraft", "admin").expect_err("overdraft");
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                required: 1,
                available: 0
            }
        ));
        assert_eq!(adjustments::for_account(&conn, "u1", 10).expect("list").len(), 2);
    }

    #[test]
    fn test_adjust_balance_validation() {
        let mut conn = testutil::conn();
        testutil::account(&conn, "admin", Role::Admin, 0);
        testutil::account(&conn, "u1", Role::Reader, 100);
        assert!(matches!(
            adjust_balance(&mut conn, "u1", 0, "noop", "admin"),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            adjust_balance(&mut conn, "u1", 5, "   ", "admin"),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            adjust_balance(&mut conn, "u1", 5, "bonus", "u1"),
            Err(LedgerError::Forbidden(_))
        ));
        assert_eq!(testutil::balance(&conn, "u1"), 100);
    }
}
