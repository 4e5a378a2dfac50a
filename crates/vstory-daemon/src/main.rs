//! vstory-daemon: the VStory coin ledger service.
//!
//! Single OS process running a Tokio async runtime. The fronting HTTP layer
//! talks to the daemon via JSON-RPC over a Unix socket, passing the caller's
//! resolved `account_id` / `admin_id` with each call.

mod commands;
mod config;
mod events;
mod rpc;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vstory_ledger::{Committed, FollowUp};
use vstory_types::events::{Event, EventType};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::{RpcError, RpcServer};

/// Crates whose log level follows `advanced.log_level`.
const LOG_TARGETS: [&str; 4] = ["vstory_daemon", "vstory_ledger", "vstory_db", "vstory_revenue"];

/// How long shutdown waits for queued follow-ups.
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Ledger database file. Each request opens its own connection.
    pub db_path: PathBuf,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Queue feeding the follow-up worker.
    pub follow_ups: mpsc::Sender<Vec<FollowUp>>,
    /// Unix time the daemon started.
    pub started_at: u64,
}

impl DaemonState {
    /// Run a ledger call on the blocking pool with a fresh connection.
    pub async fn run<T, F>(&self, f: F) -> Result<T, RpcError>
    where
        F: FnOnce(&mut Connection) -> vstory_ledger::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = vstory_db::open(&path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RpcError::internal_error(&format!("ledger task failed: {e}")))?
        .map_err(RpcError::from)
    }

    /// Run a mutating ledger call and queue its follow-ups.
    pub async fn commit<T, F>(&self, f: F) -> Result<T, RpcError>
    where
        F: FnOnce(&mut Connection) -> vstory_ledger::Result<Committed<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (value, follow_ups) = self.run(f).await?.into_parts();
        if !follow_ups.is_empty() {
            if let Err(e) = self.follow_ups.send(follow_ups).await {
                warn!(dropped = e.0.len(), "follow-up worker unavailable");
            }
        }
        Ok(value)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}={}", config.advanced.log_level).parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("VStory ledger daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Open database once to apply migrations
    let db_path = data_dir.join("ledger.db");
    drop(vstory_db::open(&db_path)?);

    // 4. Event bus and follow-up worker
    let event_bus = EventBus::new(config.advanced.event_buffer);
    let (follow_ups, worker) = worker::spawn(db_path.clone(), event_bus.clone(), 1024);

    // 5. Build daemon state
    let started_at = vstory_ledger::clock::now_secs();
    let state = Arc::new(DaemonState {
        db_path,
        config,
        event_bus,
        follow_ups,
        started_at,
    });

    // 6. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.event_bus.emit(Event {
        event_type: EventType::DaemonStatus,
        recipient: None,
        timestamp: started_at,
        payload: serde_json::json!({
            "status": "started",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    });

    // 7. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");
    let _ = std::fs::remove_file(&socket_path);
    // Give queued referral commissions a moment to land. Open connections
    // still hold senders, so the worker may not finish on its own.
    drop(rpc_server);
    drop(state);
    if tokio::time::timeout(SHUTDOWN_GRACE, worker).await.is_err() {
        warn!("follow-up worker still busy at shutdown");
    }

    info!("Daemon stopped");
    Ok(())
}
