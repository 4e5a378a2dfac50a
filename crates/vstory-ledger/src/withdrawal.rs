//! Withdrawal workflow: coins are reserved when the request is filed.
//!
//! Approval finalizes the reservation and moves no coins. Rejection refunds
//! the reserved coins in the same transaction that flips the status.

use rusqlite::Connection;
use vstory_db::queries::{accounts, withdrawals};
use vstory_types::events::EventType;
use vstory_types::requests::{BankDestination, RequestStatus, Withdrawal};
use vstory_types::RequestId;

use crate::deposit::MAX_NOTE_CHARS;
use crate::follow_up::{Committed, Notice};
use crate::policy::LedgerPolicy;
use crate::{balance, begin, clean_note, clock, require_admin, LedgerError, Result};

/// Reserve `coins` for payout to `destination`.
pub fn request_withdrawal(
    conn: &mut Connection,
    policy: &LedgerPolicy,
    account_id: &str,
    coins: u64,
    destination: &BankDestination,
) -> Result<Committed<Withdrawal>> {
    if coins < policy.min_withdrawal {
        return Err(LedgerError::BelowMinimum {
            minimum: policy.min_withdrawal,
            requested: coins,
        });
    }
    if !destination.is_complete() {
        return Err(LedgerError::Validation(
            "bank name, account number and holder are required".into(),
        ));
    }
    let payout_amount = coins
        .checked_mul(policy.payout_per_coin)
        .filter(|payout| i64::try_from(*payout).is_ok())
        .ok_or_else(|| LedgerError::Validation("withdrawal amount out of range".into()))?;
    let destination = BankDestination {
        bank_name: destination.bank_name.trim().to_string(),
        bank_account: destination.bank_account.trim().to_string(),
        bank_holder: destination.bank_holder.trim().to_string(),
    };

    let tx = begin(conn)?;
    let account = accounts::get(&tx, account_id)?;
    if !account.role.is_earner() {
        return Err(LedgerError::Forbidden(format!(
            "role '{}' cannot request withdrawals",
            account.role
        )));
    }
    balance::debit(&tx, account_id, coins)?;
    let id = withdrawals::insert(
        &tx,
        account_id,
        coins,
        payout_amount,
        &destination,
        clock::now_secs(),
    )?;
    let withdrawal = withdrawals::get(&tx, id)?;
    tx.commit()?;

    tracing::info!(withdrawal_id = id, account_id, coins, payout_amount, "withdrawal requested");
    let notice = Notice::to_operators(EventType::WithdrawalRequested, &withdrawal);
    Ok(Committed::new(withdrawal).notify(notice))
}

/// Mark a pending withdrawal as paid out.
pub fn approve_withdrawal(
    conn: &mut Connection,
    withdrawal_id: RequestId,
    admin_id: &str,
    note: Option<&str>,
) -> Result<Committed<Withdrawal>> {
    let withdrawal = finish(conn, withdrawal_id, admin_id, note, RequestStatus::Approved)?;
    let notice = Notice::to_account(
        EventType::WithdrawalApproved,
        &withdrawal.account_id,
        &withdrawal,
    );
    Ok(Committed::new(withdrawal).notify(notice))
}

/// Reject a pending withdrawal and refund its reserved coins.
pub fn reject_withdrawal(
    conn: &mut Connection,
    withdrawal_id: RequestId,
    admin_id: &str,
    note: Option<&str>,
) -> Result<Committed<Withdrawal>> {
    let withdrawal = finish(conn, withdrawal_id, admin_id, note, RequestStatus::Rejected)?;
    let notice = Notice::to_account(
        EventType::WithdrawalRejected,
        &withdrawal.account_id,
        &withdrawal,
    );
    Ok(Committed::new(withdrawal).notify(notice))
}

fn finish(
    conn: &mut Connection,
    withdrawal_id: RequestId,
    admin_id: &str,
    note: Option<&str>,
    outcome: RequestStatus,
) -> Result<Withdrawal> {
    let note = clean_note(note, MAX_NOTE_CHARS)?;

    let tx = begin(conn)?;
    require_admin(&tx, admin_id)?;
    let withdrawal = withdrawals::get(&tx, withdrawal_id)?;
    if withdrawal.status != RequestStatus::Pending {
        return Err(LedgerError::AlreadyProcessed {
            status: withdrawal.status.to_string(),
        });
    }
    let now = clock::now_secs();
    if !withdrawals::finish(&tx, withdrawal_id, outcome, admin_id, note.as_deref(), now)? {
        let current = withdrawals::get(&tx, withdrawal_id)?;
        return Err(LedgerError::AlreadyProcessed {
            status: current.status.to_string(),
        });
    }
    if outcome == RequestStatus::Rejected {
        balance::credit(&tx, &withdrawal.account_id, withdrawal.coins_reserved)?;
    }
    let withdrawal = withdrawals::get(&tx, withdrawal_id)?;
    tx.commit()?;

    tracing::info!(
        withdrawal_id,
        account_id = %withdrawal.account_id,
        admin_id,
        coins = withdrawal.coins_reserved,
        status = %withdrawal.status,
        "withdrawal processed"
    );
    Ok(withdrawal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use vstory_types::account::Role;

    fn destination() -> BankDestination {
        BankDestination {
            bank_name: "Agribank".into(),
            bank_account: "1234567890".into(),
            bank_holder: "NGUYEN VAN A".into(),
        }
    }

    fn setup() -> Connection {
        let conn = testutil::conn();
        testutil::account(&conn, "author", Role::Author, 80_000);
        testutil::account(&conn, "reader", Role::Reader, 80_000);
        testutil::account(&conn, "admin", Role::Admin, 0);
        conn
    }

    fn request(conn: &mut Connection, coins: u64) -> Result<Committed<Withdrawal>> {
        request_withdrawal(conn, &LedgerPolicy::default(), "author", coins, &destination())
    }

    #[test]
    fn test_request_reserves_immediately() {
        let mut conn = setup();
        let withdrawal = request(&mut conn, 50_000).expect("request").value;
        assert_eq!(withdrawal.status, RequestStatus::Pending);
        assert_eq!(withdrawal.payout_amount, 50_000);
        assert_eq!(testutil::balance(&conn, "author"), 30_000);
        assert_eq!(
            withdrawals::pending_total(&conn, "author").expect("pending"),
            50_000
        );
    }

    #[test]
    fn test_reject_refunds_exactly() {
        let mut conn = setup();
        let withdrawal = request(&mut conn, 50_000).expect("request").value;
        let rejected = reject_withdrawal(&mut conn, withdrawal.id, "admin", Some("wrong account"))
            .expect("reject")
            .value;
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(testutil::balance(&conn, "author"), 80_000);

        let err = reject_withdrawal(&mut conn, withdrawal.id, "admin", None).expect_err("twice");
        assert!(matches!(err, LedgerError::AlreadyProcessed { .. }));
        assert_eq!(testutil::balance(&conn, "author"), 80_000);
    }

    #[test]
    fn test_approve_keeps_reservation() {
        let mut conn = setup();
        let withdrawal = request(&mut conn, 50_000).expect("request").value;
        let _ = approve_withdrawal(&mut conn, withdrawal.id, "admin", None).expect("approve");
        assert_eq!(testutil::balance(&conn, "author"), 30_000);
        let err = reject_withdrawal(&mut conn, withdrawal.id, "admin", None)
            .expect_err("refund after payout");
        assert!(matches!(
            err,
            LedgerError::AlreadyProcessed { ref status } if status == "approved"
        ));
        assert_eq!(testutil::balance(&conn, "author"), 30_000);
    }

    #[test]
    fn test_request_failures() {
        let mut conn = setup();
        let policy = LedgerPolicy::default();
        assert!(matches!(
            request(&mut conn, 49_999),
            Err(LedgerError::BelowMinimum {
                minimum: 50_000,
                requested: 49_999
            })
        ));
        assert!(matches!(
            request(&mut conn, 90_000),
            Err(LedgerError::InsufficientBalance {
                required: 90_000,
                available: 80_000
            })
        ));
        let mut incomplete = destination();
        incomplete.bank_holder = "  ".into();
        assert!(matches!(
            request_withdrawal(&mut conn, &policy, "author", 50_000, &incomplete),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            request_withdrawal(&mut conn, &policy, "reader", 50_000, &destination()),
            Err(LedgerError::Forbidden(_))
        ));
        assert_eq!(testutil::balance(&conn, "author"), 80_000);
        assert_eq!(testutil::balance(&conn, "reader"), 80_000);
    }
}
