//! Purchases, tips and gifts: the atomic payer-to-payee transfers.
//!
//! Each transfer debits the payer (except operator gifts), credits the
//! payee's share and appends the earning rows in one transaction. Split
//! transfers also record the platform's retained share and tax; those are
//! ledger rows only and never credited to any balance.

use rusqlite::Connection;
use vstory_db::queries::{accounts, earnings, items, purchases};
use vstory_revenue::split;
use vstory_types::account::Role;
use vstory_types::earning::ReferralTriggerKind;
use vstory_types::events::EventType;
use vstory_types::transfer::{Receipt, TransferKind};
use vstory_types::RevenueSplit;

use crate::follow_up::{Committed, Notice, ReferralTrigger};
use crate::policy::LedgerPolicy;
use crate::{balance, begin, clock, LedgerError, Result};

/// Unlock a priced item for `account_id`.
///
/// The price is read from the item row inside the transaction. A second
/// purchase of the same item fails with [`LedgerError::AlreadyPurchased`]
/// and debits nothing.
pub fn purchase_item(
    conn: &mut Connection,
    account_id: &str,
    item_id: &str,
) -> Result<Committed<Receipt>> {
    let tx = begin(conn)?;
    let item = items::get(&tx, item_id)?;
    if !item.is_locked || item.price == 0 {
        return Err(LedgerError::Validation(format!("item '{item_id}' is free")));
    }
    if item.owner_id == account_id {
        return Err(LedgerError::SelfTransferForbidden);
    }
    accounts::get(&tx, account_id)?;
    if purchases::exists(&tx, account_id, item_id)? {
        return Err(LedgerError::AlreadyPurchased {
            item_id: item_id.to_string(),
        });
    }

    let now = clock::now_secs();
    let receipt = settle(
        &tx,
        Transfer {
            kind: TransferKind::Purchase,
            payer_id: account_id,
            payee_id: &item.owner_id,
            item_id: Some(item_id),
            gross: item.price,
        },
        now,
    )?;
    purchases::insert(&tx, account_id, item_id, item.price, now).map_err(|e| {
        if e.is_constraint_violation() {
            LedgerError::AlreadyPurchased {
                item_id: item_id.to_string(),
            }
        } else {
            e.into()
        }
    })?;
    tx.commit()?;

    tracing::info!(
        account_id,
        item_id,
        amount = receipt.split.gross,
        author_share = receipt.split.author,
        "item purchased"
    );
    Ok(follow_ups(receipt, Some(&item.title)))
}

/// Tip the owner of an item.
///
/// When the tipper is an administrator the tip becomes an operator gift:
/// the payee receives the full amount, nothing is debited and no platform
/// share is recorded.
pub fn tip(
    conn: &mut Connection,
    policy: &LedgerPolicy,
    from: &str,
    to: &str,
    item_id: &str,
    amount: u64,
) -> Result<Committed<Receipt>> {
    if from == to {
        return Err(LedgerError::SelfTransferForbidden);
    }
    if amount < policy.tip_min || amount > policy.tip_max {
        return Err(LedgerError::Validation(format!(
            "tip must be between {} and {} coins",
            policy.tip_min, policy.tip_max
        )));
    }

    let tx = begin(conn)?;
    let item = items::get(&tx, item_id)?;
    if item.owner_id != to {
        return Err(LedgerError::Validation(format!(
            "item '{item_id}' does not belong to '{to}'"
        )));
    }
    let payer = accounts::get(&tx, from)?;
    accounts::get(&tx, to)?;

    let kind = if payer.role.is_admin() {
        TransferKind::AdminGift
    } else {
        TransferKind::Tip
    };
    let receipt = settle(
        &tx,
        Transfer {
            kind,
            payer_id: from,
            payee_id: to,
            item_id: Some(item_id),
            gross: amount,
        },
        clock::now_secs(),
    )?;
    tx.commit()?;

    tracing::info!(
        account_id = from,
        payee_id = to,
        item_id,
        amount,
        kind = kind.as_str(),
        "tip transferred"
    );
    Ok(follow_ups(receipt, Some(&item.title)))
}

/// Send coins directly to an author, outside any item. No split applies.
///
/// As with [`tip`], a gift from an administrator is an operator gift and
/// debits nothing.
pub fn gift_to_author(
    conn: &mut Connection,
    from: &str,
    to: &str,
    amount: u64,
) -> Result<Committed<Receipt>> {
    if from == to {
        return Err(LedgerError::SelfTransferForbidden);
    }
    if amount == 0 {
        return Err(LedgerError::Validation("gift amount must be positive".into()));
    }

    let tx = begin(conn)?;
    let payer = accounts::get(&tx, from)?;
    match accounts::find(&tx, to)? {
        Some(payee) if payee.role == Role::Author => {}
        _ => return Err(LedgerError::NotFound(format!("author '{to}'"))),
    }
    let kind = if payer.role.is_admin() {
        TransferKind::AdminGift
    } else {
        TransferKind::AuthorGift
    };
    let receipt = settle(
        &tx,
        Transfer {
            kind,
            payer_id: from,
            payee_id: to,
            item_id: None,
            gross: amount,
        },
        clock::now_secs(),
    )?;
    tx.commit()?;

    tracing::info!(
        account_id = from,
        payee_id = to,
        amount,
        kind = kind.as_str(),
        "author gift transferred"
    );
    Ok(follow_ups(receipt, None))
}

struct Transfer<'a> {
    kind: TransferKind,
    payer_id: &'a str,
    payee_id: &'a str,
    item_id: Option<&'a str>,
    gross: u64,
}

/// Move the coins and append the earning rows. Runs inside the caller's
/// transaction; any error leaves it to be rolled back.
fn settle(conn: &Connection, t: Transfer<'_>, now: u64) -> Result<Receipt> {
    let revenue = match t.kind {
        TransferKind::Purchase | TransferKind::Tip => split(t.gross),
        TransferKind::AdminGift | TransferKind::AuthorGift => RevenueSplit::unsplit(t.gross),
    };

    let (payer_debited, payer_balance) = if t.kind == TransferKind::AdminGift {
        (0, accounts::balance(conn, t.payer_id)?)
    } else {
        (t.gross, balance::debit(conn, t.payer_id, t.gross)?)
    };
    balance::credit(conn, t.payee_id, revenue.author)?;

    earnings::insert_author(
        conn,
        t.payee_id,
        t.payer_id,
        t.item_id,
        t.kind,
        revenue.gross,
        revenue.author,
        now,
    )?;
    if t.kind.is_split() {
        earnings::insert_platform(
            conn,
            t.payer_id,
            t.item_id,
            t.kind,
            revenue.gross,
            revenue.platform,
            revenue.tax,
            now,
        )?;
    }

    Ok(Receipt {
        kind: t.kind,
        payer_id: t.payer_id.to_string(),
        payee_id: t.payee_id.to_string(),
        item_id: t.item_id.map(str::to_string),
        split: revenue,
        payer_debited,
        payer_balance,
        created_at: now,
    })
}

/// Payee notification, plus a referral trigger on the author share of
/// split transfers.
fn follow_ups(receipt: Receipt, item_title: Option<&str>) -> Committed<Receipt> {
    let event = match receipt.kind {
        TransferKind::Purchase => EventType::ChapterSold,
        TransferKind::Tip => EventType::TipReceived,
        TransferKind::AdminGift | TransferKind::AuthorGift => EventType::GiftReceived,
    };
    let notice = Notice::to_account(
        event,
        &receipt.payee_id,
        serde_json::json!({
            "from": receipt.payer_id,
            "item_id": receipt.item_id,
            "item_title": item_title,
            "amount": receipt.payee_credited(),
        }),
    );
    let trigger = (receipt.kind.is_split() && receipt.split.author > 0).then(|| ReferralTrigger {
        from_account_id: receipt.payee_id.clone(),
        kind: ReferralTriggerKind::AuthorEarning,
        base: receipt.split.author,
    });

    let committed = Committed::new(receipt).notify(notice);
    match trigger {
        Some(trigger) => committed.referral(trigger),
        None => committed,
    }
}
