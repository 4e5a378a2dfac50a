//! Diagnostics command handlers.

use std::sync::Arc;

use crate::commands::Result;
use crate::DaemonState;

/// Daemon version, uptime and event counter.
pub fn get_daemon_status(state: &Arc<DaemonState>) -> Result {
    let now = vstory_ledger::clock::now_secs();
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at,
        "uptime_secs": now.saturating_sub(state.started_at),
        "events_emitted": state.event_bus.sequence(),
        "schema_version": vstory_db::SCHEMA_VERSION,
    }))
}
