//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers. A
//! connection that calls `subscribe_events` also receives matching events
//! as `event` notifications, interleaved with its responses.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use vstory_ledger::LedgerError;
use vstory_types::events::Event;

use crate::commands;
use crate::events::EventFilter;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-to-client notification carrying one event.
#[derive(Debug, Serialize)]
struct RpcNotification<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: &'a Event,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcError {
    /// Stable numeric code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "PARSE_ERROR", None)
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "INVALID_REQUEST", None)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            -32601,
            "METHOD_NOT_FOUND",
            Some(serde_json::json!({"method": method})),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(
            -32602,
            "INVALID_PARAMS",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::new(
            -32603,
            "INTERNAL_ERROR",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    // Ledger errors

    /// Validation failed (-32020).
    pub fn validation_failed(detail: &str) -> Self {
        Self::new(
            -32020,
            "VALIDATION_FAILED",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Amount or total out of range (-32021). Not retryable.
    pub fn out_of_range(detail: &str) -> Self {
        Self::new(
            -32021,
            "OUT_OF_RANGE",
            Some(serde_json::json!({"detail": detail, "retryable": false})),
        )
    }

    /// Not found (-32030).
    pub fn not_found(detail: &str) -> Self {
        Self::new(-32030, "NOT_FOUND", Some(serde_json::json!({"detail": detail})))
    }

    /// Forbidden (-32031).
    pub fn forbidden(detail: &str) -> Self {
        Self::new(-32031, "FORBIDDEN", Some(serde_json::json!({"detail": detail})))
    }

    /// Insufficient balance (-32040).
    pub fn insufficient_balance(required: u64, available: u64) -> Self {
        Self::new(
            -32040,
            "INSUFFICIENT_BALANCE",
            Some(serde_json::json!({"required": required, "available": available})),
        )
    }

    /// Below minimum (-32041).
    pub fn below_minimum(minimum: u64, requested: u64) -> Self {
        Self::new(
            -32041,
            "BELOW_MINIMUM",
            Some(serde_json::json!({"minimum": minimum, "requested": requested})),
        )
    }

    /// Already processed (-32042).
    pub fn already_processed(status: &str) -> Self {
        Self::new(
            -32042,
            "ALREADY_PROCESSED",
            Some(serde_json::json!({"status": status})),
        )
    }

    /// Already purchased (-32043).
    pub fn already_purchased(item_id: &str) -> Self {
        Self::new(
            -32043,
            "ALREADY_PURCHASED",
            Some(serde_json::json!({"item_id": item_id})),
        )
    }

    /// Self transfer forbidden (-32044).
    pub fn self_transfer_forbidden() -> Self {
        Self::new(-32044, "SELF_TRANSFER_FORBIDDEN", None)
    }

    /// Storage unavailable (-32050). The caller may retry.
    pub fn storage_unavailable(detail: &str) -> Self {
        Self::new(
            -32050,
            "STORAGE_UNAVAILABLE",
            Some(serde_json::json!({"detail": detail, "retryable": true})),
        )
    }
}

impl From<LedgerError> for RpcError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(detail) => RpcError::validation_failed(&detail),
            LedgerError::InsufficientBalance {
                required,
                available,
            } => RpcError::insufficient_balance(required, available),
            LedgerError::BelowMinimum { minimum, requested } => {
                RpcError::below_minimum(minimum, requested)
            }
            LedgerError::AlreadyProcessed { status } => RpcError::already_processed(&status),
            LedgerError::AlreadyPurchased { item_id } => RpcError::already_purchased(&item_id),
            LedgerError::SelfTransferForbidden => RpcError::self_transfer_forbidden(),
            LedgerError::NotFound(detail) => RpcError::not_found(&detail),
            LedgerError::Forbidden(detail) => RpcError::forbidden(&detail),
            LedgerError::OutOfRange(detail) => RpcError::out_of_range(&detail),
            LedgerError::Storage(e) => {
                warn!(error = %e, "ledger storage failure");
                RpcError::storage_unavailable(&e.to_string())
            }
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Events stream for a connection that subscribed.
struct Subscription {
    filter: EventFilter,
    receiver: broadcast::Receiver<Event>,
}

/// Wait for the next event, or forever when not subscribed.
async fn next_event(subscription: &mut Option<Subscription>) -> Option<Event> {
    let Some(sub) = subscription else {
        return std::future::pending().await;
    };
    loop {
        match sub.receiver.recv().await {
            Ok(event) if sub.filter.matches(&event) => return Some(event),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut subscription: Option<Subscription> = None;

    loop {
        let outgoing = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = match serde_json::from_str::<RpcRequest>(&line) {
                    Ok(request) if request.method == "subscribe_events" => {
                        subscribe(&state, request, &mut subscription)
                    }
                    Ok(request) => dispatch_request(state.clone(), request).await,
                    Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
                };
                serde_json::to_string(&response)?
            }
            event = next_event(&mut subscription) => {
                let Some(event) = event else {
                    subscription = None;
                    continue;
                };
                serde_json::to_string(&RpcNotification {
                    jsonrpc: "2.0",
                    method: "event",
                    params: &event,
                })?
            }
        };

        writer.write_all(outgoing.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Start (or replace) this connection's event subscription.
fn subscribe(
    state: &DaemonState,
    request: RpcRequest,
    subscription: &mut Option<Subscription>,
) -> RpcResponse {
    let filter = match request.params.get("filter") {
        None | Some(serde_json::Value::Null) => EventFilter::default(),
        Some(raw) => match serde_json::from_value::<EventFilter>(raw.clone()) {
            Ok(filter) => filter,
            Err(e) => {
                return RpcResponse::error(request.id, RpcError::invalid_params(&e.to_string()))
            }
        },
    };
    debug!(?filter, "event subscription started");
    *subscription = Some(Subscription {
        filter,
        receiver: state.event_bus.subscribe(),
    });
    RpcResponse::success(
        request.id,
        serde_json::json!({"subscribed": true, "sequence": state.event_bus.sequence()}),
    )
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Accounts & wallet
        "ensure_account" => commands::wallet::ensure_account(&state, params).await,
        "get_wallet" => commands::wallet::get_wallet(&state, params).await,
        "set_referrer" => commands::wallet::set_referrer(&state, params).await,

        // Catalog
        "upsert_item" => commands::catalog::upsert_item(&state, params).await,

        // Transfers
        "purchase_item" => commands::wallet::purchase_item(&state, params).await,
        "tip" => commands::wallet::tip(&state, params).await,
        "gift_to_author" => commands::wallet::gift_to_author(&state, params).await,

        // Deposits & withdrawals
        "request_deposit" => commands::wallet::request_deposit(&state, params).await,
        "request_withdrawal" => commands::wallet::request_withdrawal(&state, params).await,
        "list_deposits" => commands::wallet::list_deposits(&state, params).await,
        "list_withdrawals" => commands::wallet::list_withdrawals(&state, params).await,

        // Administration
        "approve_deposit" => commands::admin::approve_deposit(&state, params).await,
        "reject_deposit" => commands::admin::reject_deposit(&state, params).await,
        "approve_withdrawal" => commands::admin::approve_withdrawal(&state, params).await,
        "reject_withdrawal" => commands::admin::reject_withdrawal(&state, params).await,
        "adjust_balance" => commands::admin::adjust_balance(&state, params).await,
        "set_role" => commands::admin::set_role(&state, params).await,
        "get_ledger_stats" => commands::admin::get_ledger_stats(&state, params).await,

        // Revenue reporting
        "get_revenue_summary" => commands::revenue::get_revenue_summary(&state, params).await,
        "get_split_preview" => commands::revenue::get_split_preview(params),

        // Daily quests
        "quest_status" => commands::quests::quest_status(&state, params).await,
        "quest_check_in" => commands::quests::quest_check_in(&state, params).await,
        "quest_record_reading" => commands::quests::quest_record_reading(&state, params).await,
        "quest_complete_comment" => {
            commands::quests::quest_complete_comment(&state, params).await
        }

        // Diagnostics
        "get_daemon_status" => commands::diagnostics::get_daemon_status(&state),

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vstory_db::DbError;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::insufficient_balance(100, 50);
        assert_eq!(err.code, -32040);
        assert_eq!(err.message, "INSUFFICIENT_BALANCE");

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_ledger_error_mapping() {
        let err: RpcError = LedgerError::InsufficientBalance {
            required: 500,
            available: 20,
        }
        .into();
        assert_eq!(err.code, -32040);
        assert_eq!(
            err.data,
            Some(serde_json::json!({"required": 500, "available": 20}))
        );

        let err: RpcError = LedgerError::AlreadyProcessed {
            status: "approved".into(),
        }
        .into();
        assert_eq!(err.code, -32042);
        assert_eq!(err.data, Some(serde_json::json!({"status": "approved"})));

        let err: RpcError = LedgerError::Storage(DbError::Migration("locked".into())).into();
        assert_eq!(err.code, -32050);
        assert_eq!(err.data.expect("data")["retryable"], true);

        let overflow = LedgerError::from(DbError::Overflow("approved deposit total".into()));
        let err: RpcError = overflow.into();
        assert_eq!(err.code, -32021);
        assert_eq!(err.data.expect("data")["retryable"], false);
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(
            serde_json::json!(1),
            serde_json::json!({"balance": 1000}),
        );
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(
            serde_json::json!(1),
            RpcError::internal_error("test"),
        );
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }
}
