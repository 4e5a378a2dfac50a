//! Deposit workflow: `pending -> approved | rejected`, exactly once.
//!
//! Approval is the only transition that credits coins, and it does so in
//! the same transaction that flips the status.

use rand::RngCore;
use rusqlite::Connection;
use vstory_db::queries::{accounts, deposits};
use vstory_db::DbError;
use vstory_types::earning::ReferralTriggerKind;
use vstory_types::events::EventType;
use vstory_types::requests::{Deposit, DepositMethod, RequestStatus};
use vstory_types::RequestId;

use crate::follow_up::{Committed, Notice, ReferralTrigger};
use crate::{balance, begin, clean_note, clock, require_admin, LedgerError, Result};

/// Attempts at drawing an unused reference code before giving up.
const REFERENCE_ATTEMPTS: usize = 8;

/// Longest accepted transfer or admin note.
pub const MAX_NOTE_CHARS: usize = 500;

/// Prefix of every deposit reference code.
pub const REFERENCE_PREFIX: &str = "VS";

/// File a deposit claim. Coins are credited only on approval.
pub fn request_deposit(
    conn: &mut Connection,
    account_id: &str,
    claimed_amount: u64,
    coins: u64,
    method: DepositMethod,
    note: Option<&str>,
) -> Result<Committed<Deposit>> {
    if claimed_amount == 0 || coins == 0 {
        return Err(LedgerError::Validation(
            "deposit amount and coins must be positive".into(),
        ));
    }
    if i64::try_from(claimed_amount).is_err() || i64::try_from(coins).is_err() {
        return Err(LedgerError::Validation("deposit amount out of range".into()));
    }
    let note = clean_note(note, MAX_NOTE_CHARS)?;

    let tx = begin(conn)?;
    accounts::get(&tx, account_id)?;
    let reference_code = unused_reference_code(&tx)?;
    let id = deposits::insert(
        &tx,
        &deposits::NewDeposit {
            account_id,
            claimed_amount,
            coins_requested: coins,
            method,
            reference_code: &reference_code,
            transfer_note: note.as_deref(),
            created_at: clock::now_secs(),
        },
    )?;
    let deposit = deposits::get(&tx, id)?;
    tx.commit()?;

    tracing::info!(
        deposit_id = id,
        account_id,
        claimed_amount,
        coins,
        method = method.as_str(),
        "deposit requested"
    );
    let notice = Notice::to_operators(EventType::DepositRequested, &deposit);
    Ok(Committed::new(deposit).notify(notice))
}

/// Approve a pending deposit and credit its coins.
pub fn approve_deposit(
    conn: &mut Connection,
    deposit_id: RequestId,
    admin_id: &str,
    note: Option<&str>,
) -> Result<Committed<Deposit>> {
    let deposit = finish(conn, deposit_id, admin_id, note, RequestStatus::Approved)?;
    let notice = Notice::to_account(EventType::DepositApproved, &deposit.account_id, &deposit);
    let trigger = ReferralTrigger {
        from_account_id: deposit.account_id.clone(),
        kind: ReferralTriggerKind::Deposit,
        base: deposit.coins_requested,
    };
    Ok(Committed::new(deposit).notify(notice).referral(trigger))
}

/// Reject a pending deposit. No coins move.
pub fn reject_deposit(
    conn: &mut Connection,
    deposit_id: RequestId,
    admin_id: &str,
    note: Option<&str>,
) -> Result<Committed<Deposit>> {
    let deposit = finish(conn, deposit_id, admin_id, note, RequestStatus::Rejected)?;
    let notice = Notice::to_account(EventType::DepositRejected, &deposit.account_id, &deposit);
    Ok(Committed::new(deposit).notify(notice))
}

fn finish(
    conn: &mut Connection,
    deposit_id: RequestId,
    admin_id: &str,
    note: Option<&str>,
    outcome: RequestStatus,
) -> Result<Deposit> {
    let note = clean_note(note, MAX_NOTE_CHARS)?;

    let tx = begin(conn)?;
    require_admin(&tx, admin_id)?;
    let deposit = deposits::get(&tx, deposit_id)?;
    if deposit.status != RequestStatus::Pending {
        return Err(LedgerError::AlreadyProcessed {
            status: deposit.status.to_string(),
        });
    }
    let now = clock::now_secs();
    if !deposits::finish(&tx, deposit_id, outcome, admin_id, note.as_deref(), now)? {
        let current = deposits::get(&tx, deposit_id)?;
        return Err(LedgerError::AlreadyProcessed {
            status: current.status.to_string(),
        });
    }
    if outcome == RequestStatus::Approved {
        balance::credit(&tx, &deposit.account_id, deposit.coins_requested)?;
    }
    let deposit = deposits::get(&tx, deposit_id)?;
    tx.commit()?;

    tracing::info!(
        deposit_id,
        account_id = %deposit.account_id,
        admin_id,
        coins = deposit.coins_requested,
        status = %deposit.status,
        "deposit processed"
    );
    Ok(deposit)
}

/// `VS` followed by eight uppercase hex digits.
fn reference_code() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{REFERENCE_PREFIX}{}", hex::encode_upper(bytes))
}

fn unused_reference_code(conn: &Connection) -> Result<String> {
    for _ in 0..REFERENCE_ATTEMPTS {
        let code = reference_code();
        if !deposits::reference_code_exists(conn, &code)? {
            return Ok(code);
        }
        tracing::debug!(code, "reference code collision");
    }
    Err(LedgerError::Storage(DbError::Constraint(
        "could not allocate a unique deposit reference code".into(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follow_up::FollowUp;
    use crate::testutil;
    use vstory_types::account::Role;

    fn bank() -> Connection {
        let conn = testutil::conn();
        testutil::account(&conn, "u1", Role::Reader, 0);
        testutil::account(&conn, "admin", Role::Admin, 0);
        conn
    }

    fn pending(conn: &mut Connection, coins: u64) -> Deposit {
        request_deposit(conn, "u1", coins, coins, DepositMethod::Zalopay, Some("  ck 123 "))
            .expect("request")
            .value
    }

    #[test]
    fn test_request_creates_pending_deposit() {
        let mut conn = bank();
        let committed =
            request_deposit(&mut conn, "u1", 20_000, 20_000, DepositMethod::BankTransfer, None)
                .expect("request");
        let deposit = &committed.value;
        assert_eq!(deposit.status, RequestStatus::Pending);
        assert_eq!(deposit.method, DepositMethod::BankTransfer);
        assert!(deposit.reference_code.starts_with(REFERENCE_PREFIX));
        assert_eq!(deposit.reference_code.len(), 10);
        assert_eq!(testutil::balance(&conn, "u1"), 0);
        assert!(matches!(
            &committed.follow_ups[..],
            [FollowUp::Notify(Notice { recipient: None, .. })]
        ));
    }

    #[test]
    fn test_request_validation() {
        let mut conn = bank();
        assert!(matches!(
            request_deposit(&mut conn, "u1", 0, 10, DepositMethod::Zalopay, None),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            request_deposit(&mut conn, "ghost", 10, 10, DepositMethod::Zalopay, None),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_approve_credits_once() {
        let mut conn = bank();
        let deposit = pending(&mut conn, 5_000);
        assert_eq!(deposit.transfer_note.as_deref(), Some("ck 123"));

        let committed =
            approve_deposit(&mut conn, deposit.id, "admin", Some("ok")).expect("approve");
        assert_eq!(committed.value.status, RequestStatus::Approved);
        assert_eq!(committed.value.admin_id.as_deref(), Some("admin"));
        assert!(committed.follow_ups.contains(&FollowUp::Referral(ReferralTrigger {
            from_account_id: "u1".into(),
            kind: ReferralTriggerKind::Deposit,
            base: 5_000,
        })));
        assert_eq!(testutil::balance(&conn, "u1"), 5_000);

        let err = approve_deposit(&mut conn, deposit.id, "admin", None).expect_err("twice");
        assert!(matches!(
            err,
            LedgerError::AlreadyProcessed { ref status } if status == "approved"
        ));
        let err = reject_deposit(&mut conn, deposit.id, "admin", None).expect_err("after approve");
        assert!(matches!(err, LedgerError::AlreadyProcessed { .. }));
        assert_eq!(testutil::balance(&conn, "u1"), 5_000);
    }

    #[test]
    fn test_reject_moves_no_coins() {
        let mut conn = bank();
        let deposit = pending(&mut conn, 5_000);
        let rejected = reject_deposit(&mut conn, deposit.id, "admin", Some("no transfer found"))
            .expect("reject")
            .value;
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.admin_note.as_deref(), Some("no transfer found"));
        assert_eq!(testutil::balance(&conn, "u1"), 0);
    }

    #[test]
    fn test_only_admin_processes() {
        let mut conn = bank();
        let deposit = pending(&mut conn, 100);
        assert!(matches!(
            approve_deposit(&mut conn, deposit.id, "u1", None),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            approve_deposit(&mut conn, 9_999, "admin", None),
            Err(LedgerError::NotFound(_))
        ));
        assert_eq!(testutil::balance(&conn, "u1"), 0);
    }

    #[test]
    fn test_reference_codes_are_distinct() {
        let mut conn = bank();
        let a = pending(&mut conn, 100);
        let b = pending(&mut conn, 100);
        assert_ne!(a.reference_code, b.reference_code);
    }
}
