//! Account, transfer and request command handlers (caller-facing).

use std::sync::Arc;

use serde_json::Value;
use vstory_ledger::{admin, deposit, referral, reporting, transfer, withdrawal};
use vstory_types::requests::{BankDestination, DepositMethod, RequestStatus};

use crate::commands::{
    optional_label, optional_str, optional_u32, required_amount, required_label, required_str,
    to_value, Param, Result, DEFAULT_LIMIT,
};
use crate::DaemonState;

/// Create the caller's account on first access.
pub async fn ensure_account(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let display_name = optional_str(params, "display_name")?.unwrap_or_default();
    let account = state
        .run(move |conn| admin::ensure_account(conn, &account_id, &display_name))
        .await?;
    to_value(&account)
}

/// Balance, pending withdrawals and recent purchases. `subject_id`
/// defaults to the caller; only an administrator may name someone else.
pub async fn get_wallet(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller_id = required_str(params, "account_id")?;
    let subject_id = optional_str(params, "subject_id")?.unwrap_or_else(|| caller_id.clone());
    let limit = optional_u32(params, "limit")?.unwrap_or(DEFAULT_LIMIT);
    let wallet = state
        .run(move |conn| {
            admin::require_self_or_admin(conn, &caller_id, &subject_id)?;
            reporting::wallet(conn, &subject_id, limit)
        })
        .await?;
    to_value(&wallet)
}

/// Record who referred the caller.
pub async fn set_referrer(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let referrer_id = required_str(params, "referrer_id")?;
    let account = state
        .run(move |conn| referral::set_referrer(conn, &account_id, &referrer_id))
        .await?;
    to_value(&account)
}

/// Unlock a chapter.
pub async fn purchase_item(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let item_id = required_str(params, "item_id")?;
    let receipt = state
        .commit(move |conn| transfer::purchase_item(conn, &account_id, &item_id))
        .await?;
    to_value(&receipt)
}

/// Tip the owner of a chapter.
pub async fn tip(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = required_str(params, "account_id")?;
    let to = required_str(params, "to_account_id")?;
    let item_id = required_str(params, "item_id")?;
    let amount = required_amount(params, "amount")?;
    let policy = state.config.ledger.clone();
    let receipt = state
        .commit(move |conn| transfer::tip(conn, &policy, &from, &to, &item_id, amount))
        .await?;
    to_value(&receipt)
}

/// Send coins straight to an author.
pub async fn gift_to_author(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = required_str(params, "account_id")?;
    let to = required_str(params, "author_id")?;
    let amount = required_amount(params, "amount")?;
    let receipt = state
        .commit(move |conn| transfer::gift_to_author(conn, &from, &to, amount))
        .await?;
    to_value(&receipt)
}

/// File a deposit claim.
pub async fn request_deposit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let amount = required_amount(params, "amount")?;
    let coins = required_amount(params, "coins")?;
    let method: DepositMethod = required_label(params, "method")?;
    let note = optional_str(params, "note")?;
    let deposit = state
        .commit(move |conn| {
            deposit::request_deposit(conn, &account_id, amount, coins, method, note.as_deref())
        })
        .await?;
    to_value(&deposit)
}

/// Reserve coins for a payout.
pub async fn request_withdrawal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let coins = required_amount(params, "coins")?;
    let destination = BankDestination {
        bank_name: required_str(params, "bank_name")?,
        bank_account: required_str(params, "bank_account")?,
        bank_holder: required_str(params, "bank_holder")?,
    };
    let policy = state.config.ledger.clone();
    let withdrawal = state
        .commit(move |conn| {
            withdrawal::request_withdrawal(conn, &policy, &account_id, coins, &destination)
        })
        .await?;
    to_value(&withdrawal)
}

/// Paging and status filter shared by the list commands.
struct ListQuery {
    /// `None` when an administrator lists every account.
    account_id: Option<String>,
    admin_id: Option<String>,
    status: Option<RequestStatus>,
    limit: u32,
    offset: u32,
}

impl ListQuery {
    fn from_params(params: &Value) -> Param<Self> {
        let admin_id = optional_str(params, "admin_id")?;
        let account_id = match admin_id {
            Some(_) => optional_str(params, "account_id")?,
            None => Some(required_str(params, "account_id")?),
        };
        Ok(Self {
            account_id,
            admin_id,
            status: optional_label(params, "status")?,
            limit: optional_u32(params, "limit")?.unwrap_or(DEFAULT_LIMIT),
            offset: optional_u32(params, "offset")?.unwrap_or(0),
        })
    }

    fn authorize(&self, conn: &rusqlite::Connection) -> vstory_ledger::Result<()> {
        if let Some(admin_id) = &self.admin_id {
            vstory_ledger::admin::authorize(conn, admin_id)?;
        }
        Ok(())
    }
}

/// The caller's deposits, or every deposit for an administrator.
pub async fn list_deposits(state: &Arc<DaemonState>, params: &Value) -> Result {
    let query = ListQuery::from_params(params)?;
    let deposits = state
        .run(move |conn| {
            query.authorize(conn)?;
            reporting::list_deposits(
                conn,
                query.account_id.as_deref(),
                query.status,
                query.limit,
                query.offset,
            )
        })
        .await?;
    to_value(&deposits)
}

/// The caller's withdrawals, or every withdrawal for an administrator.
pub async fn list_withdrawals(state: &Arc<DaemonState>, params: &Value) -> Result {
    let query = ListQuery::from_params(params)?;
    let withdrawals = state
        .run(move |conn| {
            query.authorize(conn)?;
            reporting::list_withdrawals(
                conn,
                query.account_id.as_deref(),
                query.status,
                query.limit,
                query.offset,
            )
        })
        .await?;
    to_value(&withdrawals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use serde_json::json;
    use vstory_db::queries::accounts;
    use vstory_types::account::Role;

    #[tokio::test]
    async fn test_deposit_flow_over_handlers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = testutil::state(&dir);
        ensure_account(&state, &json!({"account_id": "u1", "display_name": "Reader"}))
            .await
            .expect("ensure");

        let deposit = request_deposit(
            &state,
            &json!({
                "account_id": "u1",
                "amount": 20000,
                "coins": 20000,
                "method": "bank_transfer"
            }),
        )
        .await
        .expect("request");
        assert_eq!(deposit["status"], "pending");

        let listed = list_deposits(&state, &json!({"account_id": "u1"}))
            .await
            .expect("list");
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_wallet_visible_to_owner_and_admin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = testutil::state(&dir);
        {
            let conn = vstory_db::open(&state.db_path).expect("open");
            for (id, role) in [
                ("admin", Role::Admin),
                ("u1", Role::Reader),
                ("u2", Role::Reader),
            ] {
                accounts::insert(&conn, id, id, role, 1).expect("account");
            }
        }

        let own = get_wallet(&state, &json!({"account_id": "u1"}))
            .await
            .expect("own wallet");
        assert_eq!(own["account"]["id"], "u1");
        let audited = get_wallet(&state, &json!({"account_id": "admin", "subject_id": "u1"}))
            .await
            .expect("admin view");
        assert_eq!(audited["account"]["id"], "u1");

        let err = get_wallet(&state, &json!({"account_id": "u2", "subject_id": "u1"}))
            .await
            .expect_err("someone else's wallet");
        assert_eq!(err.code, -32031);
    }

    #[tokio::test]
    async fn test_bad_params_rejected_before_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = testutil::state(&dir);
        let err = request_deposit(
            &state,
            &json!({"account_id": "u1", "amount": 1.5, "coins": 10, "method": "zalopay"}),
        )
        .await
        .expect_err("fractional amount");
        assert_eq!(err.code, -32602);

        let err = request_deposit(
            &state,
            &json!({"account_id": "u1", "amount": 10, "coins": 10, "method": "cash"}),
        )
        .await
        .expect_err("unknown method");
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_purchase_errors_carry_balance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = testutil::state(&dir);
        {
            let conn = vstory_db::open(&state.db_path).expect("open");
            accounts::insert(&conn, "author", "Author", Role::Author, 1).expect("author");
            accounts::insert(&conn, "u1", "U1", Role::Reader, 1).expect("reader");
            vstory_db::queries::items::upsert(
                &conn,
                &vstory_types::item::Item {
                    id: "ch-1".into(),
                    owner_id: "author".into(),
                    title: "One".into(),
                    price: 100,
                    is_locked: true,
                },
            )
            .expect("item");
        }
        let err = purchase_item(&state, &json!({"account_id": "u1", "item_id": "ch-1"}))
            .await
            .expect_err("no coins");
        assert_eq!(err.code, -32040);
        assert_eq!(err.data, Some(json!({"required": 100, "available": 0})));
    }
}
