//! Daily quest command handlers.

use std::sync::Arc;

use serde_json::Value;
use vstory_ledger::{clock, quests};

use crate::commands::{optional_u32, required_str, to_value, Result};
use crate::DaemonState;

/// Today's quest board: completion, reading progress, rewards and the cap.
pub async fn quest_status(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let policy = state.config.quests.clone();
    let board = state
        .run(move |conn| quests::status(conn, &policy, &account_id, clock::now_secs()))
        .await?;
    to_value(&board)
}

pub async fn quest_check_in(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let policy = state.config.quests.clone();
    let progress = state
        .commit(move |conn| quests::check_in(conn, &policy, &account_id, clock::now_secs()))
        .await?;
    to_value(&progress)
}

/// Report reading time. Reports are clamped to a few minutes each.
pub async fn quest_record_reading(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let minutes = optional_u32(params, "minutes")?.unwrap_or(1);
    let policy = state.config.quests.clone();
    let progress = state
        .commit(move |conn| {
            quests::record_reading(conn, &policy, &account_id, minutes, clock::now_secs())
        })
        .await?;
    to_value(&progress)
}

pub async fn quest_complete_comment(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account_id = required_str(params, "account_id")?;
    let policy = state.config.quests.clone();
    let progress = state
        .commit(move |conn| quests::complete_comment(conn, &policy, &account_id, clock::now_secs()))
        .await?;
    to_value(&progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_check_in_once_per_day() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = crate::testutil::state(&dir);
        crate::commands::wallet::ensure_account(&state, &json!({"account_id": "u1"}))
            .await
            .expect("ensure");

        let first = quest_check_in(&state, &json!({"account_id": "u1"}))
            .await
            .expect("check in");
        assert_eq!(first["rewarded"], 20);
        assert_eq!(first["balance"], 20);

        let err = quest_check_in(&state, &json!({"account_id": "u1"}))
            .await
            .expect_err("second check-in");
        assert_eq!(err.code, -32042);
    }

    #[tokio::test]
    async fn test_quest_status_tracks_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = crate::testutil::state(&dir);
        crate::commands::wallet::ensure_account(&state, &json!({"account_id": "u1"}))
            .await
            .expect("ensure");

        let board = quest_status(&state, &json!({"account_id": "u1"}))
            .await
            .expect("status");
        assert_eq!(board["max_daily"], 50);
        assert_eq!(board["coins_earned"], 0);
        assert_eq!(board["quests"].as_array().expect("quests").len(), 3);

        quest_check_in(&state, &json!({"account_id": "u1"}))
            .await
            .expect("check in");
        quest_record_reading(&state, &json!({"account_id": "u1", "minutes": 4}))
            .await
            .expect("read");

        let board = quest_status(&state, &json!({"account_id": "u1"}))
            .await
            .expect("status");
        assert_eq!(board["coins_earned"], 20);
        assert_eq!(board["quests"][0]["kind"], "check_in");
        assert_eq!(board["quests"][0]["completed"], true);
        assert_eq!(board["quests"][1]["completed"], false);
        assert_eq!(board["quests"][2]["progress"], 4);
        assert_eq!(board["quests"][2]["target"], 10);

        let err = quest_status(&state, &json!({"account_id": "ghost"}))
            .await
            .expect_err("unknown account");
        assert_eq!(err.code, -32030);
        let err = quest_status(&state, &json!({})).await.expect_err("no account");
        assert_eq!(err.code, -32602);
    }
}
