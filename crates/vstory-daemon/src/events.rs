//! Event emission.
//!
//! Committed ledger operations produce notices; the event bus turns them
//! into [`Event`]s and broadcasts them to every connection that subscribed.
//! Each subscriber filters on the account it speaks for, or on operator
//! alerts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use vstory_ledger::{Notice, Notifier};
use vstory_types::events::{Event, EventType};

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Receive events addressed to this account.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Receive operator broadcasts (new deposit and withdrawal requests).
    #[serde(default)]
    pub operator: bool,
    /// Restrict to these event types.
    #[serde(default)]
    pub event_types: Option<Vec<EventType>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl Notifier for EventBus {
    fn notify(&self, notice: Notice) {
        if notice.kind.is_operator_alert() {
            tracing::info!(event = ?notice.kind, "operator alert");
        }
        self.emit(Event {
            event_type: notice.kind,
            recipient: notice.recipient,
            timestamp: vstory_ledger::clock::now_secs(),
            payload: notice.payload,
        });
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }

        match (&event.recipient, &self.account_id) {
            (Some(recipient), Some(account_id)) => recipient == account_id,
            (Some(_), None) => false,
            (None, _) => self.operator || event.event_type == EventType::DaemonStatus,
        }
    }
}
