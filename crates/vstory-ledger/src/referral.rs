//! Referrer registration and the commission cascade.
//!
//! Commissions run after the triggering transaction has committed, each in
//! a transaction of its own; see [`crate::dispatch`].

use rusqlite::Connection;
use vstory_db::queries::{accounts, earnings};
use vstory_revenue::referral::{commission, rate_for};
use vstory_types::account::Account;
use vstory_types::earning::ReferralEarning;

use crate::follow_up::ReferralTrigger;
use crate::{balance, begin, clock, LedgerError, Result};

/// Record that `referrer_id` referred `account_id`. Allowed once per account.
pub fn set_referrer(conn: &mut Connection, account_id: &str, referrer_id: &str) -> Result<Account> {
    if account_id == referrer_id {
        return Err(LedgerError::Validation(
            "an account cannot refer itself".into(),
        ));
    }

    let tx = begin(conn)?;
    let account = accounts::get(&tx, account_id)?;
    if account.referred_by.is_some() {
        return Err(LedgerError::Validation("referrer already set".into()));
    }
    if accounts::find(&tx, referrer_id)?.is_none() {
        return Err(LedgerError::Validation(format!(
            "unknown referrer '{referrer_id}'"
        )));
    }
    if !accounts::set_referrer_once(&tx, account_id, referrer_id)? {
        return Err(LedgerError::Validation("referrer already set".into()));
    }
    let account = accounts::get(&tx, account_id)?;
    tx.commit()?;

    tracing::info!(account_id, referrer_id, "referrer recorded");
    Ok(account)
}

/// Pay the commission a trigger earns, if any.
///
/// Returns `None` when the account has no referrer, the referrer is not an
/// author or admin, or the commission floors to zero coins.
pub fn apply_commission(
    conn: &mut Connection,
    trigger: &ReferralTrigger,
) -> Result<Option<ReferralEarning>> {
    let rate_bps = rate_for(trigger.kind);
    let Some(amount) = commission(trigger.base, rate_bps) else {
        return Ok(None);
    };

    let tx = begin(conn)?;
    let Some(referrer) = accounts::referrer_of(&tx, &trigger.from_account_id)? else {
        return Ok(None);
    };
    if !referrer.role.is_earner() {
        tracing::debug!(
            referrer_id = %referrer.id,
            role = %referrer.role,
            "referrer not eligible for commission"
        );
        return Ok(None);
    }

    balance::credit(&tx, &referrer.id, amount)?;
    let earning = earnings::insert_referral(
        &tx,
        &referrer.id,
        &trigger.from_account_id,
        trigger.kind,
        trigger.base,
        rate_bps,
        amount,
        clock::now_secs(),
    )?;
    tx.commit()?;

    tracing::info!(
        referrer_id = %earning.referrer_id,
        account_id = %earning.from_account_id,
        trigger = earning.trigger.as_str(),
        amount,
        "referral commission paid"
    );
    Ok(Some(earning))
}
