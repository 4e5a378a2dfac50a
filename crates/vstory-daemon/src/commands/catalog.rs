//! Catalog command handlers.

use std::sync::Arc;

use serde_json::Value;
use vstory_ledger::catalog;
use vstory_types::item::Item;

use crate::commands::{optional_bool, optional_str, optional_u64, required_str, to_value, Result};
use crate::DaemonState;

/// List or update a chapter. `owner_id` defaults to the caller; items are
/// locked unless `is_locked` is false.
pub async fn upsert_item(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller_id = required_str(params, "account_id")?;
    let item = Item {
        id: required_str(params, "item_id")?,
        owner_id: optional_str(params, "owner_id")?.unwrap_or_else(|| caller_id.clone()),
        title: required_str(params, "title")?,
        price: optional_u64(params, "price")?.unwrap_or(0),
        is_locked: optional_bool(params, "is_locked")?.unwrap_or(true),
    };
    let saved = state
        .run(move |conn| catalog::upsert_item(conn, &caller_id, item))
        .await?;
    to_value(&saved)
}
