//! Daily engagement quests.
//!
//! Rewards are credited through the same balance primitive as every other
//! mutation and in the same transaction as the progress row. They are not
//! earnings: nothing is appended to the earning ledger and no referral
//! commission is triggered.
//!
//! A quest only completes when its reward is paid. If the daily cap would
//! be exceeded the completion flag stays unset and the report comes back
//! with `limit_reached`.

use rusqlite::Connection;
use vstory_db::queries::{accounts, quests};
use vstory_types::events::EventType;
use vstory_types::quest::{DailyQuest, QuestEntry, QuestKind, QuestProgress, QuestStatus};

use crate::follow_up::{Committed, Notice};
use crate::policy::QuestPolicy;
use crate::{balance, begin, clock, LedgerError, Result};

/// Minutes a single reading report may count for.
pub const READ_REPORT_MINUTES: std::ops::RangeInclusive<u32> = 1..=5;

/// Daily check-in. A second check-in on the same quest day fails with
/// [`LedgerError::AlreadyProcessed`].
pub fn check_in(
    conn: &mut Connection,
    policy: &QuestPolicy,
    account_id: &str,
    now: u64,
) -> Result<Committed<QuestProgress>> {
    advance(conn, policy, account_id, now, QuestKind::CheckIn, |quest| {
        if quest.checked_in {
            return Err(LedgerError::AlreadyProcessed {
                status: "checked_in".into(),
            });
        }
        quest.checked_in = true;
        Ok(policy.checkin_reward)
    })
}

/// First comment of the day earns the comment reward; later ones earn nothing.
pub fn complete_comment(
    conn: &mut Connection,
    policy: &QuestPolicy,
    account_id: &str,
    now: u64,
) -> Result<Committed<QuestProgress>> {
    advance(conn, policy, account_id, now, QuestKind::Comment, |quest| {
        if quest.commented {
            return Ok(0);
        }
        quest.commented = true;
        Ok(policy.comment_reward)
    })
}

/// Add reading time. Each report counts between one and five minutes, and
/// the day's total stops at the target, where the reward is paid.
pub fn record_reading(
    conn: &mut Connection,
    policy: &QuestPolicy,
    account_id: &str,
    minutes: u32,
    now: u64,
) -> Result<Committed<QuestProgress>> {
    let minutes = minutes.clamp(*READ_REPORT_MINUTES.start(), *READ_REPORT_MINUTES.end());
    advance(conn, policy, account_id, now, QuestKind::Reading, |quest| {
        if quest.read_completed {
            return Ok(0);
        }
        quest.read_minutes = quest
            .read_minutes
            .saturating_add(minutes)
            .min(policy.read_target_minutes);
        if quest.read_minutes < policy.read_target_minutes {
            return Ok(0);
        }
        quest.read_completed = true;
        Ok(policy.read_reward)
    })
}

/// Load today's row, apply `step`, pay its reward within the daily cap and
/// store the row, all in one transaction.
fn advance<F>(
    conn: &mut Connection,
    policy: &QuestPolicy,
    account_id: &str,
    now: u64,
    kind: QuestKind,
    step: F,
) -> Result<Committed<QuestProgress>>
where
    F: FnOnce(&mut DailyQuest) -> Result<u64>,
{
    let day = clock::quest_day(now, policy.utc_offset_hours);

    let tx = begin(conn)?;
    accounts::get(&tx, account_id)?;
    let mut quest = quests::get_or_default(&tx, account_id, day)?;
    let earned = step(&mut quest)?;
    let limit_reached = earned > 0 && quest.coins_earned.saturating_add(earned) > policy.max_daily;
    let rewarded = if limit_reached {
        tracing::debug!(account_id, day, earned, "daily quest cap reached");
        reopen(&mut quest, kind);
        0
    } else {
        earned
    };
    quest.coins_earned += rewarded;
    quests::save(&tx, &quest)?;
    let balance = if rewarded > 0 {
        balance::credit(&tx, account_id, rewarded)?
    } else {
        accounts::balance(&tx, account_id)?
    };
    tx.commit()?;

    let progress = QuestProgress {
        quest,
        rewarded,
        limit_reached,
        balance,
    };
    if rewarded == 0 {
        return Ok(Committed::new(progress));
    }
    tracing::info!(account_id, day, quest = ?kind, rewarded, "quest rewarded");
    let notice = Notice::to_account(
        EventType::QuestRewarded,
        account_id,
        serde_json::json!({ "quest": kind, "amount": rewarded }),
    );
    Ok(Committed::new(progress).notify(notice))
}

/// Undo the completion a capped step recorded. Reading minutes are kept.
fn reopen(quest: &mut DailyQuest, kind: QuestKind) {
    match kind {
        QuestKind::CheckIn => quest.checked_in = false,
        QuestKind::Comment => quest.commented = false,
        QuestKind::Reading => quest.read_completed = false,
    }
}

/// Today's quest board for `account_id`: what is done, the reading
/// progress and what each quest pays.
pub fn status(
    conn: &Connection,
    policy: &QuestPolicy,
    account_id: &str,
    now: u64,
) -> Result<QuestStatus> {
    let day = clock::quest_day(now, policy.utc_offset_hours);
    accounts::get(conn, account_id)?;
    let quest = quests::get_or_default(conn, account_id, day)?;

    let simple = |kind, reward, completed| QuestEntry {
        kind,
        reward,
        completed,
        progress: None,
        target: None,
    };
    let quests = vec![
        simple(QuestKind::CheckIn, policy.checkin_reward, quest.checked_in),
        simple(QuestKind::Comment, policy.comment_reward, quest.commented),
        QuestEntry {
            kind: QuestKind::Reading,
            reward: policy.read_reward,
            completed: quest.read_completed,
            progress: Some(quest.read_minutes.min(policy.read_target_minutes)),
            target: Some(policy.read_target_minutes),
        },
    ];
    Ok(QuestStatus {
        account_id: account_id.to_string(),
        day,
        quests,
        coins_earned: quest.coins_earned,
        max_daily: policy.max_daily,
    })
}
