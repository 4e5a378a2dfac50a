//! Earning ledger: insert-only rows and the reporting sums over them.
//!
//! There are deliberately no update or delete functions here; the schema
//! rejects both with triggers.

use rusqlite::Connection;
use vstory_types::earning::{AuthorEarning, ReferralEarning, ReferralTriggerKind};
use vstory_types::transfer::TransferKind;

use crate::queries::{amount, checked_sum, label};
use crate::{to_sql, Result};

/// Inclusive-exclusive time window `[since, until)` in Unix seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub since: u64,
    pub until: u64,
}

impl Window {
    /// Every row ever written.
    pub const ALL: Window = Window {
        since: 0,
        until: i64::MAX as u64,
    };

    fn bounds(&self) -> Result<(i64, i64)> {
        Ok((to_sql(self.since)?, to_sql(self.until)?))
    }
}

/// Append an author earning.
#[allow(clippy::too_many_arguments)]
pub fn insert_author(
    conn: &Connection,
    author_id: &str,
    payer_id: &str,
    item_id: Option<&str>,
    kind: TransferKind,
    gross: u64,
    amount: u64,
    created_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO author_earnings (author_id, payer_id, item_id, kind, gross, amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            author_id,
            payer_id,
            item_id,
            kind.as_str(),
            to_sql(gross)?,
            to_sql(amount)?,
            to_sql(created_at)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append a platform earning (retained share plus tax).
#[allow(clippy::too_many_arguments)]
pub fn insert_platform(
    conn: &Connection,
    payer_id: &str,
    item_id: Option<&str>,
    kind: TransferKind,
    gross: u64,
    platform_amount: u64,
    tax_amount: u64,
    created_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO platform_earnings (payer_id, item_id, kind, gross, platform_amount,
                                        tax_amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            payer_id,
            item_id,
            kind.as_str(),
            to_sql(gross)?,
            to_sql(platform_amount)?,
            to_sql(tax_amount)?,
            to_sql(created_at)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append a referral earning and return the stored row.
#[allow(clippy::too_many_arguments)]
pub fn insert_referral(
    conn: &Connection,
    referrer_id: &str,
    from_account_id: &str,
    trigger: ReferralTriggerKind,
    source_amount: u64,
    rate_bps: u64,
    amount: u64,
    created_at: u64,
) -> Result<ReferralEarning> {
    conn.execute(
        "INSERT INTO referral_earnings (referrer_id, from_account_id, trigger_kind,
                                        source_amount, rate_bps, amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            referrer_id,
            from_account_id,
            trigger.as_str(),
            to_sql(source_amount)?,
            to_sql(rate_bps)?,
            to_sql(amount)?,
            to_sql(created_at)?,
        ],
    )?;
    Ok(ReferralEarning {
        id: conn.last_insert_rowid(),
        referrer_id: referrer_id.to_string(),
        from_account_id: from_account_id.to_string(),
        trigger,
        source_amount,
        rate_bps,
        amount,
        created_at,
    })
}

/// Total credited to an author within a window.
pub fn author_total(conn: &Connection, author_id: &str, window: Window) -> Result<u64> {
    let (since, until) = window.bounds()?;
    checked_sum(
        conn,
        "SELECT amount FROM author_earnings
         WHERE author_id = ?1 AND created_at >= ?2 AND created_at < ?3",
        rusqlite::params![author_id, since, until],
        "author earning total",
    )
}

/// Author totals grouped by transfer kind.
pub fn author_totals_by_kind(
    conn: &Connection,
    author_id: &str,
    window: Window,
) -> Result<Vec<(TransferKind, u64)>> {
    let (since, until) = window.bounds()?;
    let mut stmt = conn.prepare(
        "SELECT kind, SUM(amount) FROM author_earnings
         WHERE author_id = ?1 AND created_at >= ?2 AND created_at < ?3
         GROUP BY kind ORDER BY kind",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![author_id, since, until], |row| {
            Ok((label(row, 0)?, amount(row, 1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recent author earnings.
pub fn recent_author(conn: &Connection, author_id: &str, limit: u32) -> Result<Vec<AuthorEarning>> {
    let mut stmt = conn.prepare(
        "SELECT id, author_id, payer_id, item_id, kind, gross, amount, created_at
         FROM author_earnings WHERE author_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![author_id, limit], |row| {
            Ok(AuthorEarning {
                id: row.get(0)?,
                author_id: row.get(1)?,
                payer_id: row.get(2)?,
                item_id: row.get(3)?,
                kind: label(row, 4)?,
                gross: amount(row, 5)?,
                amount: amount(row, 6)?,
                created_at: amount(row, 7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Platform `(retained, tax)` totals within a window.
pub fn platform_totals(conn: &Connection, window: Window) -> Result<(u64, u64)> {
    let (since, until) = window.bounds()?;
    let totals = conn.query_row(
        "SELECT COALESCE(SUM(platform_amount), 0), COALESCE(SUM(tax_amount), 0)
         FROM platform_earnings WHERE created_at >= ?1 AND created_at < ?2",
        rusqlite::params![since, until],
        |row| Ok((amount(row, 0)?, amount(row, 1)?)),
    )?;
    Ok(totals)
}

/// Total referral commission paid to a referrer.
pub fn referral_total(conn: &Connection, referrer_id: &str) -> Result<u64> {
    checked_sum(
        conn,
        "SELECT amount FROM referral_earnings WHERE referrer_id = ?1",
        [referrer_id],
        "referral total",
    )
}

/// Referral earnings paid to a referrer, newest first.
pub fn referrals_for(
    conn: &Connection,
    referrer_id: &str,
    limit: u32,
) -> Result<Vec<ReferralEarning>> {
    let mut stmt = conn.prepare(
        "SELECT id, referrer_id, from_account_id, trigger_kind, source_amount, rate_bps,
                amount, created_at
         FROM referral_earnings WHERE referrer_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![referrer_id, limit], |row| {
            Ok(ReferralEarning {
                id: row.get(0)?,
                referrer_id: row.get(1)?,
                from_account_id: row.get(2)?,
                trigger: label(row, 3)?,
                source_amount: amount(row, 4)?,
                rate_bps: amount(row, 5)?,
                amount: amount(row, 6)?,
                created_at: amount(row, 7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
