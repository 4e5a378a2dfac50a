//! Per-day quest progress rows.

use rusqlite::{Connection, OptionalExtension};
use vstory_types::quest::DailyQuest;

use crate::queries::amount;
use crate::{to_sql, Result};

/// Progress for `(account_id, day)`, or a fresh all-false row if none is stored.
pub fn get_or_default(conn: &Connection, account_id: &str, day: i64) -> Result<DailyQuest> {
    let quest = conn
        .query_row(
            "SELECT checked_in, commented, read_minutes, read_completed, coins_earned
             FROM daily_quests WHERE account_id = ?1 AND day = ?2",
            rusqlite::params![account_id, day],
            |row| {
                Ok(DailyQuest {
                    account_id: account_id.to_string(),
                    day,
                    checked_in: row.get(0)?,
                    commented: row.get(1)?,
                    read_minutes: row.get(2)?,
                    read_completed: row.get(3)?,
                    coins_earned: amount(row, 4)?,
                })
            },
        )
        .optional()?;
    Ok(quest.unwrap_or_else(|| DailyQuest {
        account_id: account_id.to_string(),
        day,
        ..DailyQuest::default()
    }))
}

/// Insert or overwrite the row for `(quest.account_id, quest.day)`.
pub fn save(conn: &Connection, quest: &DailyQuest) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_quests (account_id, day, checked_in, commented, read_minutes,
                                   read_completed, coins_earned)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(account_id, day) DO UPDATE SET
            checked_in = excluded.checked_in,
            commented = excluded.commented,
            read_minutes = excluded.read_minutes,
            read_completed = excluded.read_completed,
            coins_earned = excluded.coins_earned",
        rusqlite::params![
            quest.account_id,
            quest.day,
            quest.checked_in,
            quest.commented,
            quest.read_minutes,
            quest.read_completed,
            to_sql(quest.coins_earned)?,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::accounts;
    use vstory_types::account::Role;

    #[test]
    fn test_missing_row_defaults() {
        let conn = crate::open_memory().expect("open");
        accounts::insert(&conn, "u1", "U1", Role::Reader, 1).expect("insert");
        let quest = get_or_default(&conn, "u1", 20_000).expect("get");
        assert_eq!(quest.account_id, "u1");
        assert!(!quest.checked_in);
        assert_eq!(quest.coins_earned, 0);
    }

    #[test]
    fn test_save_then_update() {
        let conn = crate::open_memory().expect("open");
        accounts::insert(&conn, "u1", "U1", Role::Reader, 1).expect("insert");

        let mut quest = get_or_default(&conn, "u1", 20_000).expect("get");
        quest.checked_in = true;
        quest.coins_earned = 20;
        save(&conn, &quest).expect("save");

        quest.read_minutes = 4;
        save(&conn, &quest).expect("save again");

        let stored = get_or_default(&conn, "u1", 20_000).expect("get");
        assert_eq!(stored, quest);
        let other_day = get_or_default(&conn, "u1", 20_001).expect("get");
        assert!(!other_day.checked_in);
    }
}
