//! Priced catalog items (chapters).

use serde::{Deserialize, Serialize};

use crate::{AccountId, ItemId};

/// A catalog entry the ledger can sell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Item {
    pub id: ItemId,
    /// The author credited when the item is sold or tipped.
    pub owner_id: AccountId,
    pub title: String,
    /// Coins to unlock. Always 0 for unlocked items.
    pub price: u64,
    /// Locked items must be purchased before reading.
    pub is_locked: bool,
}
