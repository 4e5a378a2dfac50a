//! Tunable ledger limits.
//!
//! Deserialized from the `[ledger]` and `[quests]` sections of the daemon
//! config; every field falls back to the platform default.

use serde::{Deserialize, Serialize};

/// Limits applied to tips and withdrawals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    /// Smallest withdrawal accepted, in coins.
    pub min_withdrawal: u64,
    /// Payout currency units per coin.
    pub payout_per_coin: u64,
    /// Smallest tip accepted, in coins.
    pub tip_min: u64,
    /// Largest tip accepted, in coins.
    pub tip_max: u64,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            min_withdrawal: 50_000,
            payout_per_coin: 1,
            tip_min: 100,
            tip_max: 50_000,
        }
    }
}

/// Daily quest rewards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestPolicy {
    pub checkin_reward: u64,
    pub comment_reward: u64,
    pub read_reward: u64,
    /// Minutes of reading that complete the reading quest.
    pub read_target_minutes: u32,
    /// Cap on quest coins per account per quest day.
    pub max_daily: u64,
    /// Offset of the quest calendar from UTC.
    pub utc_offset_hours: i64,
}

impl Default for QuestPolicy {
    fn default() -> Self {
        Self {
            checkin_reward: 20,
            comment_reward: 10,
            read_reward: 20,
            read_target_minutes: 10,
            max_daily: 50,
            utc_offset_hours: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = LedgerPolicy::default();
        assert_eq!(policy.min_withdrawal, 50_000);
        assert_eq!(policy.tip_min, 100);
        assert_eq!(policy.tip_max, 50_000);
        assert_eq!(QuestPolicy::default().max_daily, 50);
    }

    #[test]
    fn test_partial_override() {
        let policy: LedgerPolicy =
            serde_json::from_str(r#"{"tip_max": 1000}"#).expect("deserialize");
        assert_eq!(policy.tip_max, 1000);
        assert_eq!(policy.tip_min, 100);
    }
}
