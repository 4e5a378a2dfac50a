//! Daily engagement quests.

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Which daily quest a reward was paid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    CheckIn,
    Comment,
    Reading,
}

/// One account's quest progress for one quest day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct DailyQuest {
    pub account_id: AccountId,
    /// Calendar day number in the platform's quest time zone.
    pub day: i64,
    pub checked_in: bool,
    pub commented: bool,
    pub read_minutes: u32,
    pub read_completed: bool,
    pub coins_earned: u64,
}

/// Outcome of a quest report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct QuestProgress {
    pub quest: DailyQuest,
    /// Coins credited by this report (0 when nothing was unlocked or the cap was hit).
    pub rewarded: u64,
    /// The daily cap withheld this report's reward. The quest stays open.
    pub limit_reached: bool,
    pub balance: u64,
}

/// One line of the daily quest board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct QuestEntry {
    pub kind: QuestKind,
    pub reward: u64,
    pub completed: bool,
    /// Minutes read so far. Reading quest only.
    pub progress: Option<u32>,
    /// Minutes needed to complete. Reading quest only.
    pub target: Option<u32>,
}

/// Today's quests for one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct QuestStatus {
    pub account_id: AccountId,
    /// Calendar day number in the platform's quest time zone.
    pub day: i64,
    pub quests: Vec<QuestEntry>,
    pub coins_earned: u64,
    pub max_daily: u64,
}
