//! Post-commit side effects.
//!
//! Ledger operations never notify anyone or pay referral commissions from
//! inside their transaction. They return the work as [`FollowUp`]s and the
//! caller hands them to [`dispatch`] once the primary write is durable.
//! Follow-ups are best-effort: a failure is logged and dropped.

use rusqlite::Connection;
use serde::Serialize;
use vstory_types::earning::ReferralTriggerKind;
use vstory_types::events::EventType;
use vstory_types::AccountId;

use crate::referral;

/// An operation result whose transaction has committed, plus the side
/// effects it asked for.
#[derive(Debug)]
#[must_use = "follow-ups must be dispatched"]
pub struct Committed<T> {
    pub value: T,
    pub follow_ups: Vec<FollowUp>,
}

impl<T> Committed<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            follow_ups: Vec::new(),
        }
    }

    pub(crate) fn notify(mut self, notice: Notice) -> Self {
        self.follow_ups.push(FollowUp::Notify(notice));
        self
    }

    pub(crate) fn referral(mut self, trigger: ReferralTrigger) -> Self {
        self.follow_ups.push(FollowUp::Referral(trigger));
        self
    }

    /// Split into the value and its follow-ups.
    pub fn into_parts(self) -> (T, Vec<FollowUp>) {
        (self.value, self.follow_ups)
    }
}

/// A side effect requested by a committed operation.
#[derive(Clone, Debug, PartialEq)]
pub enum FollowUp {
    Notify(Notice),
    Referral(ReferralTrigger),
}

/// An outbound notification.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: EventType,
    /// Addressed account; `None` goes to operators.
    pub recipient: Option<AccountId>,
    pub payload: serde_json::Value,
}

impl Notice {
    pub(crate) fn to_account(kind: EventType, recipient: &str, payload: impl Serialize) -> Self {
        Self {
            kind,
            recipient: Some(recipient.to_string()),
            payload: to_payload(payload),
        }
    }

    pub(crate) fn to_operators(kind: EventType, payload: impl Serialize) -> Self {
        Self {
            kind,
            recipient: None,
            payload: to_payload(payload),
        }
    }
}

fn to_payload(payload: impl Serialize) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "notice payload not serializable");
        serde_json::Value::Null
    })
}

/// A referral commission to evaluate after commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferralTrigger {
    /// Account whose referrer may be paid.
    pub from_account_id: AccountId,
    pub kind: ReferralTriggerKind,
    /// Amount the commission rate applies to.
    pub base: u64,
}

/// Best-effort outbound notifier (in-app inbox, operator alerts).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Run follow-ups in order. Each referral commits in its own transaction.
pub fn dispatch(conn: &mut Connection, notifier: &dyn Notifier, follow_ups: Vec<FollowUp>) {
    for follow_up in follow_ups {
        match follow_up {
            FollowUp::Notify(notice) => notifier.notify(notice),
            FollowUp::Referral(trigger) => match referral::apply_commission(conn, &trigger) {
                Ok(Some(earning)) => notifier.notify(Notice::to_account(
                    EventType::ReferralCommission,
                    &earning.referrer_id,
                    &earning,
                )),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    account_id = %trigger.from_account_id,
                    base = trigger.base,
                    error = %e,
                    "referral commission failed"
                ),
            },
        }
    }
}
