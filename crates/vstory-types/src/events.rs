//! Event types pushed to in-app subscribers after a ledger commit.

use serde::{Deserialize, Serialize};

/// Envelope for all ledger events.
#[derive(Clone, Debug, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Event {
    pub event_type: EventType,
    /// Account the event is addressed to; `None` for operator broadcasts.
    pub recipient: Option<String>,
    pub timestamp: u64,
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,
}

/// All ledger event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Wallet
    ChapterSold,
    TipReceived,
    GiftReceived,
    BalanceAdjusted,

    // Requests
    DepositRequested,
    DepositApproved,
    DepositRejected,
    WithdrawalRequested,
    WithdrawalApproved,
    WithdrawalRejected,

    // Referral
    ReferralCommission,

    // Quests
    QuestRewarded,

    // System
    DaemonStatus,
}

impl EventType {
    /// Events operators want surfaced for review.
    pub fn is_operator_alert(&self) -> bool {
        matches!(
            self,
            EventType::DepositRequested | EventType::WithdrawalRequested
        )
    }
}
