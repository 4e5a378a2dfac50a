//! Purchase, tip and gift transfers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AccountId, ItemId, ParseLabelError};

/// The three-way division of a gross coin amount.
///
/// `author + platform + tax == gross` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct RevenueSplit {
    pub gross: u64,
    pub author: u64,
    pub platform: u64,
    pub tax: u64,
}

impl RevenueSplit {
    /// The all-zero split returned for invalid input.
    pub const ZERO: RevenueSplit = RevenueSplit {
        gross: 0,
        author: 0,
        platform: 0,
        tax: 0,
    };

    /// A split that hands the whole gross amount to the payee.
    pub fn unsplit(gross: u64) -> Self {
        Self {
            gross,
            author: gross,
            platform: 0,
            tax: 0,
        }
    }
}

/// What kind of value movement produced an author earning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Reader unlocked a chapter.
    Purchase,
    /// Reader tipped an author on a chapter.
    Tip,
    /// Operator-issued coins; no payer debit and no split.
    AdminGift,
    /// Direct support to an author outside any chapter; no split.
    AuthorGift,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Purchase => "purchase",
            TransferKind::Tip => "tip",
            TransferKind::AdminGift => "admin_gift",
            TransferKind::AuthorGift => "author_gift",
        }
    }

    /// Whether the gross amount goes through the revenue split.
    pub fn is_split(&self) -> bool {
        matches!(self, TransferKind::Purchase | TransferKind::Tip)
    }
}

impl FromStr for TransferKind {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(TransferKind::Purchase),
            "tip" => Ok(TransferKind::Tip),
            "admin_gift" => Ok(TransferKind::AdminGift),
            "author_gift" => Ok(TransferKind::AuthorGift),
            other => Err(ParseLabelError::new("transfer kind", other)),
        }
    }
}

/// Proof that a chapter was unlocked. Unique per (account, item).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ChapterPurchase {
    pub account_id: AccountId,
    pub item_id: ItemId,
    pub coins_spent: u64,
    pub created_at: u64,
}

/// Result of a committed purchase, tip or gift.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Receipt {
    pub kind: TransferKind,
    pub payer_id: AccountId,
    pub payee_id: AccountId,
    pub item_id: Option<ItemId>,
    pub split: RevenueSplit,
    /// Coins actually debited from the payer (0 for admin gifts).
    pub payer_debited: u64,
    /// Payer balance right after commit.
    pub payer_balance: u64,
    pub created_at: u64,
}

impl Receipt {
    /// Coins credited to the payee.
    pub fn payee_credited(&self) -> u64 {
        self.split.author
    }
}
