//! Read-only aggregates over the earning ledger and request tables.
//!
//! Nothing here writes. Sums are computed from the append-only rows, so they
//! are an audit trail that is independent of the live balances.

use rusqlite::Connection;
use serde::Serialize;
use vstory_db::queries::earnings::{self, Window};
use vstory_db::queries::{accounts, deposits, purchases, withdrawals};
use vstory_types::account::Account;
use vstory_types::earning::{AuthorEarning, ReferralEarning};
use vstory_types::requests::{Deposit, RequestStatus, Withdrawal};
use vstory_types::transfer::{ChapterPurchase, TransferKind};

use crate::{LedgerError, Result};

/// Largest page any list query returns.
pub const MAX_PAGE: u32 = 200;

/// Sum of author earnings credited to `author_id` in `[since, until)`.
pub fn author_earned(conn: &Connection, author_id: &str, since: u64, until: u64) -> Result<u64> {
    Ok(earnings::author_total(conn, author_id, window(since, until)?)?)
}

/// Author earnings in `[since, until)` grouped by transfer kind.
pub fn author_earnings_by_kind(
    conn: &Connection,
    author_id: &str,
    since: u64,
    until: u64,
) -> Result<Vec<(TransferKind, u64)>> {
    Ok(earnings::author_totals_by_kind(
        conn,
        author_id,
        window(since, until)?,
    )?)
}

/// Platform `(retained, tax)` totals in `[since, until)`.
pub fn platform_totals(conn: &Connection, since: u64, until: u64) -> Result<(u64, u64)> {
    Ok(earnings::platform_totals(conn, window(since, until)?)?)
}

/// Total commission ever paid to a referrer.
pub fn referral_earned(conn: &Connection, referrer_id: &str) -> Result<u64> {
    Ok(earnings::referral_total(conn, referrer_id)?)
}

pub fn recent_author_earnings(
    conn: &Connection,
    author_id: &str,
    limit: u32,
) -> Result<Vec<AuthorEarning>> {
    Ok(earnings::recent_author(conn, author_id, limit.min(MAX_PAGE))?)
}

/// Coins held by an account's pending withdrawals.
pub fn pending_withdrawal_total(conn: &Connection, account_id: &str) -> Result<u64> {
    Ok(withdrawals::pending_total(conn, account_id)?)
}

/// Author dashboard for one time window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub author_id: String,
    pub since: u64,
    pub until: u64,
    pub total: u64,
    pub by_kind: Vec<KindTotal>,
    pub chapters_sold: u64,
    pub referral_total: u64,
    pub recent: Vec<AuthorEarning>,
    pub recent_referrals: Vec<ReferralEarning>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KindTotal {
    pub kind: TransferKind,
    pub amount: u64,
}

/// Everything the author revenue screen shows. Readers have no such screen.
pub fn revenue_summary(
    conn: &Connection,
    author_id: &str,
    since: u64,
    until: u64,
    recent_limit: u32,
) -> Result<RevenueSummary> {
    let author = accounts::get(conn, author_id)?;
    if !author.role.is_earner() {
        return Err(LedgerError::Forbidden(format!(
            "account '{author_id}' has no author revenue"
        )));
    }
    let window = window(since, until)?;
    let limit = recent_limit.min(MAX_PAGE);
    Ok(RevenueSummary {
        author_id: author_id.to_string(),
        since,
        until,
        total: earnings::author_total(conn, author_id, window)?,
        by_kind: earnings::author_totals_by_kind(conn, author_id, window)?
            .into_iter()
            .map(|(kind, amount)| KindTotal { kind, amount })
            .collect(),
        chapters_sold: purchases::sold_count_for_owner(conn, author_id)?,
        referral_total: earnings::referral_total(conn, author_id)?,
        recent: earnings::recent_author(conn, author_id, limit)?,
        recent_referrals: earnings::referrals_for(conn, author_id, limit)?,
    })
}

/// Admin dashboard counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub accounts: u64,
    pub pending_deposits: u64,
    pub pending_withdrawals: u64,
    /// Money claimed by approved deposits, in payment currency units.
    pub approved_deposit_money: u64,
    pub platform_retained: u64,
    pub platform_tax: u64,
}

pub fn ledger_stats(conn: &Connection) -> Result<LedgerStats> {
    let (platform_retained, platform_tax) = earnings::platform_totals(conn, Window::ALL)?;
    Ok(LedgerStats {
        accounts: accounts::count(conn)?,
        pending_deposits: deposits::count_with_status(conn, RequestStatus::Pending)?,
        pending_withdrawals: withdrawals::count_with_status(conn, RequestStatus::Pending)?,
        approved_deposit_money: deposits::approved_money_total(conn)?,
        platform_retained,
        platform_tax,
    })
}

/// Balance view for one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Wallet {
    pub account: Account,
    pub pending_withdrawals: u64,
    pub recent_purchases: Vec<ChapterPurchase>,
}

pub fn wallet(conn: &Connection, account_id: &str, recent_limit: u32) -> Result<Wallet> {
    Ok(Wallet {
        account: accounts::get(conn, account_id)?,
        pending_withdrawals: withdrawals::pending_total(conn, account_id)?,
        recent_purchases: purchases::recent_for_account(
            conn,
            account_id,
            recent_limit.min(MAX_PAGE),
        )?,
    })
}

/// Deposits, newest first, optionally filtered.
pub fn list_deposits(
    conn: &Connection,
    account_id: Option<&str>,
    status: Option<RequestStatus>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Deposit>> {
    Ok(deposits::list(conn, account_id, status, limit.min(MAX_PAGE), offset)?)
}

/// Withdrawals, newest first, optionally filtered.
pub fn list_withdrawals(
    conn: &Connection,
    account_id: Option<&str>,
    status: Option<RequestStatus>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Withdrawal>> {
    Ok(withdrawals::list(conn, account_id, status, limit.min(MAX_PAGE), offset)?)
}

fn window(since: u64, until: u64) -> Result<Window> {
    let until = until.min(Window::ALL.until);
    if since >= until {
        return Err(LedgerError::Validation(format!(
            "empty time window [{since}, {until})"
        )));
    }
    Ok(Window { since, until })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LedgerPolicy;
    use crate::testutil;
    use crate::{deposit, transfer};
    use vstory_types::account::Role;
    use vstory_types::requests::DepositMethod;

    fn trading_day() -> Connection {
        let mut conn = testutil::conn();
        testutil::account(&conn, "author", Role::Author, 0);
        testutil::account(&conn, "reader", Role::Reader, 10_000);
        testutil::account(&conn, "admin", Role::Admin, 0);
        testutil::chapter(&conn, "ch-1", "author", 100);
        testutil::chapter(&conn, "ch-2", "author", 300);
        let _ = transfer::purchase_item(&mut conn, "reader", "ch-1").expect("purchase");
        let _ = transfer::purchase_item(&mut conn, "reader", "ch-2").expect("purchase");
        let policy = LedgerPolicy::default();
        let _ = transfer::tip(&mut conn, &policy, "reader", "author", "ch-1", 1_000).expect("tip");
        conn
    }

    #[test]
    fn test_author_sums_match_balance() {
        let conn = trading_day();
        // 65 + 195 + 650
        let earned = author_earned(&conn, "author", 0, u64::MAX).expect("earned");
        assert_eq!(earned, 910);
        assert_eq!(testutil::balance(&conn, "author"), earned);

        let by_kind = author_earnings_by_kind(&conn, "author", 0, u64::MAX).expect("by kind");
        assert_eq!(
            by_kind,
            vec![(TransferKind::Purchase, 260), (TransferKind::Tip, 650)]
        );
    }

    #[test]
    fn test_conservation_across_ledger() {
        let conn = trading_day();
        let author = author_earned(&conn, "author", 0, u64::MAX).expect("earned");
        let (platform, tax) = platform_totals(&conn, 0, u64::MAX).expect("platform");
        let spent = 10_000 - testutil::balance(&conn, "reader");
        assert_eq!(author + platform + tax, spent);
    }

    #[test]
    fn test_revenue_summary() {
        let conn = trading_day();
        let summary = revenue_summary(&conn, "author", 0, u64::MAX, 2).expect("summary");
        assert_eq!(summary.total, 910);
        assert_eq!(summary.chapters_sold, 2);
        assert_eq!(summary.recent.len(), 2);
        assert_eq!(summary.by_kind.len(), 2);
        assert!(matches!(
            revenue_summary(&conn, "author", 10, 10, 2),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            revenue_summary(&conn, "reader", 0, u64::MAX, 2),
            Err(LedgerError::Forbidden(_))
        ));
    }

    #[test]
    fn test_ledger_stats() {
        let mut conn = trading_day();
        let method = DepositMethod::Zalopay;
        let d = deposit::request_deposit(&mut conn, "reader", 20_000, 20_000, method, None)
            .expect("deposit")
            .value;
        let _ = deposit::request_deposit(&mut conn, "reader", 5_000, 5_000, method, None)
            .expect("deposit");
        let _ = deposit::approve_deposit(&mut conn, d.id, "admin", None).expect("approve");

        let stats = ledger_stats(&conn).expect("stats");
        assert_eq!(stats.accounts, 3);
        assert_eq!(stats.pending_deposits, 1);
        assert_eq!(stats.pending_withdrawals, 0);
        assert_eq!(stats.approved_deposit_money, 20_000);
        assert_eq!(stats.platform_retained + stats.platform_tax, 1_400 - 910);

        let pending = list_deposits(&conn, Some("reader"), Some(RequestStatus::Pending), 10, 0)
            .expect("list");
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_wallet() {
        let conn = trading_day();
        let wallet = wallet(&conn, "reader", 10).expect("wallet");
        assert_eq!(wallet.account.coin_balance, 8_600);
        assert_eq!(wallet.recent_purchases.len(), 2);
        assert_eq!(wallet.pending_withdrawals, 0);
    }
}
