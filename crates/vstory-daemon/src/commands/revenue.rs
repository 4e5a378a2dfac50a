//! Author revenue reporting and split preview.

use std::sync::Arc;

use serde_json::Value;
use vstory_ledger::{admin, reporting};

use crate::commands::{
    optional_str, optional_u32, optional_u64, required_str, to_value, Result, DEFAULT_LIMIT,
};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Earnings for an author over `[since, until)`. Both bounds are optional.
/// `author_id` defaults to the caller; only an administrator may name
/// someone else.
pub async fn get_revenue_summary(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller_id = required_str(params, "account_id")?;
    let author_id = optional_str(params, "author_id")?.unwrap_or_else(|| caller_id.clone());
    let since = optional_u64(params, "since")?.unwrap_or(0);
    let until = optional_u64(params, "until")?.unwrap_or(u64::MAX);
    let limit = optional_u32(params, "limit")?.unwrap_or(DEFAULT_LIMIT);
    let summary = state
        .run(move |conn| {
            admin::require_self_or_admin(conn, &caller_id, &author_id)?;
            reporting::revenue_summary(conn, &author_id, since, until, limit)
        })
        .await?;
    to_value(&summary)
}

/// Show how a gross amount would be split. Invalid amounts preview as zero.
pub fn get_split_preview(params: &Value) -> Result {
    let gross = params
        .get("gross")
        .and_then(Value::as_f64)
        .ok_or_else(|| RpcError::invalid_params("gross must be a number"))?;
    to_value(&vstory_revenue::split_untrusted(gross))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vstory_db::queries::accounts;
    use vstory_types::account::Role;

    #[test]
    fn test_split_preview() {
        let split = get_split_preview(&json!({"gross": 1000})).expect("preview");
        assert_eq!(split, json!({"gross": 1000, "author": 650, "platform": 300, "tax": 50}));

        let zero = get_split_preview(&json!({"gross": -5})).expect("preview");
        assert_eq!(zero["gross"], 0);
        let zero = get_split_preview(&json!({"gross": 2.5})).expect("preview");
        assert_eq!(zero["author"], 0);

        let err = get_split_preview(&json!({"gross": "100"})).expect_err("string");
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_summary_for_unknown_author() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = crate::testutil::state(&dir);
        let err = get_revenue_summary(&state, &json!({"account_id": "ghost"}))
            .await
            .expect_err("unknown");
        assert_eq!(err.code, -32030);
    }

    #[tokio::test]
    async fn test_summary_is_private_to_author_and_admin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = crate::testutil::state(&dir);
        {
            let conn = vstory_db::open(&state.db_path).expect("open");
            for (id, role) in [
                ("admin", Role::Admin),
                ("author", Role::Author),
                ("rival", Role::Author),
                ("u1", Role::Reader),
            ] {
                accounts::insert(&conn, id, id, role, 1).expect("account");
            }
        }

        let own = get_revenue_summary(&state, &json!({"account_id": "author"}))
            .await
            .expect("own summary");
        assert_eq!(own["author_id"], "author");
        assert_eq!(own["total"], 0);
        let audited = get_revenue_summary(
            &state,
            &json!({"account_id": "admin", "author_id": "author"}),
        )
        .await
        .expect("admin view");
        assert_eq!(audited["author_id"], "author");

        for caller in ["rival", "u1"] {
            let err = get_revenue_summary(
                &state,
                &json!({"account_id": caller, "author_id": "author"}),
            )
            .await
            .expect_err("someone else's revenue");
            assert_eq!(err.code, -32031);
        }
        let err = get_revenue_summary(&state, &json!({"account_id": "u1"}))
            .await
            .expect_err("reader has no revenue view");
        assert_eq!(err.code, -32031);
    }
}
