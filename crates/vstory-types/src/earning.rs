//! Append-only earning records and administrative adjustments.
//!
//! Rows of these types are inserted once and never updated or deleted.
//! Corrections are new rows, not edits.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::transfer::TransferKind;
use crate::{AccountId, ItemId, ParseLabelError};

/// Coins credited to an author's balance by a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct AuthorEarning {
    pub id: i64,
    pub author_id: AccountId,
    pub payer_id: AccountId,
    pub item_id: Option<ItemId>,
    pub kind: TransferKind,
    pub gross: u64,
    pub amount: u64,
    pub created_at: u64,
}

/// The platform's retained and tax shares of a split transfer.
///
/// Not credited to any balance; tracked only as ledger rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PlatformEarning {
    pub id: i64,
    pub payer_id: AccountId,
    pub item_id: Option<ItemId>,
    pub kind: TransferKind,
    pub gross: u64,
    pub platform_amount: u64,
    pub tax_amount: u64,
    pub created_at: u64,
}

/// What caused a referral commission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReferralTriggerKind {
    /// An approved deposit by the referred account.
    Deposit,
    /// The referred account earned an author share.
    AuthorEarning,
}

impl ReferralTriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralTriggerKind::Deposit => "deposit",
            ReferralTriggerKind::AuthorEarning => "author_earning",
        }
    }
}

impl FromStr for ReferralTriggerKind {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(ReferralTriggerKind::Deposit),
            "author_earning" => Ok(ReferralTriggerKind::AuthorEarning),
            other => Err(ParseLabelError::new("referral trigger", other)),
        }
    }
}

/// Commission paid to the account that referred `from_account_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ReferralEarning {
    pub id: i64,
    pub referrer_id: AccountId,
    pub from_account_id: AccountId,
    pub trigger: ReferralTriggerKind,
    /// The triggering amount the rate was applied to.
    pub source_amount: u64,
    pub rate_bps: u64,
    pub amount: u64,
    pub created_at: u64,
}

/// An operator correction to a live balance, recorded beside the earnings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct BalanceAdjustment {
    pub id: i64,
    pub account_id: AccountId,
    pub admin_id: AccountId,
    pub delta: i64,
    pub reason: String,
    pub balance_after: u64,
    pub created_at: u64,
}
