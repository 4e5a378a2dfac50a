//! Administrator command handlers.
//!
//! Every handler takes the caller's `admin_id`; the ledger checks the role
//! inside the same transaction as the change.

use std::sync::Arc;

use serde_json::Value;
use vstory_ledger::{admin, deposit, reporting, withdrawal};
use vstory_types::account::Role;
use vstory_types::RequestId;

use crate::commands::{
    optional_str, required_i64, required_label, required_str, to_value, Param, Result,
};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Request id, admin id and optional note shared by the review commands.
fn review_params(params: &Value) -> Param<(RequestId, String, Option<String>)> {
    let id = params
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::invalid_params("id required"))?;
    Ok((id, required_str(params, "admin_id")?, optional_str(params, "note")?))
}

pub async fn approve_deposit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (id, admin_id, note) = review_params(params)?;
    let deposit = state
        .commit(move |conn| deposit::approve_deposit(conn, id, &admin_id, note.as_deref()))
        .await?;
    to_value(&deposit)
}

pub async fn reject_deposit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (id, admin_id, note) = review_params(params)?;
    let deposit = state
        .commit(move |conn| deposit::reject_deposit(conn, id, &admin_id, note.as_deref()))
        .await?;
    to_value(&deposit)
}

pub async fn approve_withdrawal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (id, admin_id, note) = review_params(params)?;
    let withdrawal = state
        .commit(move |conn| withdrawal::approve_withdrawal(conn, id, &admin_id, note.as_deref()))
        .await?;
    to_value(&withdrawal)
}

/// Reject a withdrawal and refund the reserved coins.
pub async fn reject_withdrawal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (id, admin_id, note) = review_params(params)?;
    let withdrawal = state
        .commit(move |conn| withdrawal::reject_withdrawal(conn, id, &admin_id, note.as_deref()))
        .await?;
    to_value(&withdrawal)
}

/// Correct a balance. Returns the new balance alongside the audit row.
pub async fn adjust_balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let delta = required_i64(params, "delta")?;
    let reason = required_str(params, "reason")?;
    let admin_id = required_str(params, "admin_id")?;
    let adjustment = state
        .commit(move |conn| admin::adjust_balance(conn, &account_id, delta, &reason, &admin_id))
        .await?;
    Ok(serde_json::json!({
        "new_balance": adjustment.balance_after,
        "adjustment": to_value(&adjustment)?,
    }))
}

pub async fn set_role(state: &Arc<DaemonState>, params: &Value) -> Result {
    let admin_id = required_str(params, "admin_id")?;
    let account_id = required_str(params, "account_id")?;
    let role: Role = required_label(params, "role")?;
    let account = state
        .run(move |conn| admin::set_role(conn, &admin_id, &account_id, role))
        .await?;
    to_value(&account)
}

/// Dashboard counters.
pub async fn get_ledger_stats(state: &Arc<DaemonState>, params: &Value) -> Result {
    let admin_id = required_str(params, "admin_id")?;
    let stats = state
        .run(move |conn| {
            admin::authorize(conn, &admin_id)?;
            reporting::ledger_stats(conn)
        })
        .await?;
    to_value(&stats)
}
