//! # vstory-ledger
//!
//! Coin ledger operations over the `vstory-db` store.
//!
//! Every mutating operation opens its own `BEGIN IMMEDIATE` transaction on
//! the connection it is given, re-reads the rows it depends on, validates,
//! writes and commits. The precondition is therefore evaluated at commit
//! time; a balance or status the caller read earlier is advisory only.
//! There is no in-process lock: concurrent callers on separate connections
//! are serialized by SQLite's writer lock and `busy_timeout`.
//!
//! Side effects (notifications, referral commissions) are never performed
//! inside the transaction. Operations hand them back as [`FollowUp`]s in a
//! [`Committed`] value and the caller runs them with [`dispatch`].
//!
//! ## Modules
//!
//! - [`balance`]: the single debit/credit primitive
//! - [`catalog`]: item listing and pricing
//! - [`transfer`]: purchases, tips and gifts
//! - [`deposit`]: deposit request and approval state machine
//! - [`withdrawal`]: withdrawal reservation, payout and refund
//! - [`referral`]: referrer registration and the commission cascade
//! - [`admin`]: account provisioning, roles and balance corrections
//! - [`quests`]: daily engagement rewards
//! - [`reporting`]: read-only aggregates over the earning ledger

pub mod admin;
pub mod balance;
pub mod catalog;
pub mod clock;
pub mod deposit;
pub mod follow_up;
pub mod policy;
pub mod quests;
pub mod referral;
pub mod reporting;
pub mod transfer;
pub mod withdrawal;

pub use follow_up::{dispatch, Committed, FollowUp, Notice, Notifier, ReferralTrigger};
pub use policy::{LedgerPolicy, QuestPolicy};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use vstory_db::DbError;
use vstory_types::account::Account;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input; nothing was attempted.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The payer's balance does not cover the debit.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        /// Coins the operation needed.
        required: u64,
        /// Balance at the time the debit was refused.
        available: u64,
    },

    /// Amount below a fixed floor.
    #[error("amount {requested} is below minimum {minimum}")]
    BelowMinimum {
        /// The configured floor.
        minimum: u64,
        /// The amount provided.
        requested: u64,
    },

    /// A request or quest step has already reached a terminal state.
    #[error("already processed (status: {status})")]
    AlreadyProcessed {
        /// Current status of the record.
        status: String,
    },

    /// The payer already owns this item.
    #[error("item {item_id} already purchased")]
    AlreadyPurchased {
        /// The item that was purchased before.
        item_id: String,
    },

    /// Payer and payee are the same account.
    #[error("payer and payee are the same account")]
    SelfTransferForbidden,

    /// Unknown account, item, deposit or withdrawal.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An amount or stored total does not fit the coin range. Retrying
    /// the same request fails the same way.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The transaction could not be committed. Safe to retry.
    #[error("storage failure: {0}")]
    Storage(#[source] DbError),
}

impl LedgerError {
    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

impl From<DbError> for LedgerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => LedgerError::NotFound(what),
            DbError::Overflow(what) => LedgerError::OutOfRange(what),
            other => LedgerError::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Storage(DbError::Sqlite(e))
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Open the write transaction every mutating operation runs in.
///
/// `IMMEDIATE` takes the writer lock up front, so the reads that follow
/// see the state the writes will be applied to.
pub(crate) fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Load `admin_id` and fail with `Forbidden` unless it is an administrator.
pub(crate) fn require_admin(conn: &Connection, admin_id: &str) -> Result<Account> {
    let admin = vstory_db::queries::accounts::find(conn, admin_id)?
        .ok_or_else(|| LedgerError::Forbidden(format!("unknown administrator '{admin_id}'")))?;
    if !admin.role.is_admin() {
        return Err(LedgerError::Forbidden(format!(
            "account '{admin_id}' is not an administrator"
        )));
    }
    Ok(admin)
}

/// Trim an optional free-text note, dropping it when empty.
pub(crate) fn clean_note(note: Option<&str>, max_len: usize) -> Result<Option<String>> {
    match note.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > max_len => Err(LedgerError::Validation(format!(
            "note longer than {max_len} characters"
        ))),
        Some(text) => Ok(Some(text.to_string())),
    }
}
