//! # vstory-types
//!
//! Shared domain types for the VStory coin ledger: accounts and roles,
//! catalog items, deposit and withdrawal requests, transfer receipts, the append-only
//! earning rows, daily quest progress and the events pushed to subscribers.

pub mod account;
pub mod earning;
pub mod events;
pub mod item;
pub mod quest;
pub mod requests;
pub mod transfer;

pub use transfer::RevenueSplit;

/// Opaque account identifier, resolved by the authentication layer.
pub type AccountId = String;

/// Opaque priced-item (chapter) identifier.
pub type ItemId = String;

/// Deposit and withdrawal primary keys.
pub type RequestId = i64;

/// Basis-point denominator (100% = 10,000 bps).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Error raised when a stored or submitted enum label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseLabelError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected label.
    pub value: String,
}

impl ParseLabelError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
