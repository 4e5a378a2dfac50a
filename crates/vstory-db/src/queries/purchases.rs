//! Chapter purchase rows. One per (account, item).

use rusqlite::Connection;
use vstory_types::transfer::ChapterPurchase;

use crate::queries::amount;
use crate::{to_sql, Result};

/// Whether the account already owns the item.
pub fn exists(conn: &Connection, account_id: &str, item_id: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM chapter_purchases WHERE account_id = ?1 AND item_id = ?2",
        [account_id, item_id],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Record a purchase. Fails with a constraint violation on a duplicate.
pub fn insert(
    conn: &Connection,
    account_id: &str,
    item_id: &str,
    coins_spent: u64,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO chapter_purchases (account_id, item_id, coins_spent, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![account_id, item_id, to_sql(coins_spent)?, to_sql(created_at)?],
    )?;
    Ok(())
}

/// Most recent purchases by an account.
pub fn recent_for_account(
    conn: &Connection,
    account_id: &str,
    limit: u32,
) -> Result<Vec<ChapterPurchase>> {
    let mut stmt = conn.prepare(
        "SELECT account_id, item_id, coins_spent, created_at
         FROM chapter_purchases WHERE account_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![account_id, limit], |row| {
            Ok(ChapterPurchase {
                account_id: row.get(0)?,
                item_id: row.get(1)?,
                coins_spent: amount(row, 2)?,
                created_at: amount(row, 3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Number of purchases of items owned by `owner_id`.
pub fn sold_count_for_owner(conn: &Connection, owner_id: &str) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM chapter_purchases p JOIN items i ON i.id = p.item_id
         WHERE i.owner_id = ?1",
        [owner_id],
        |row| row.get(0),
    )?;
    Ok(crate::from_sql(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{accounts, items};
    use vstory_types::account::Role;
    use vstory_types::item::Item;

    fn seeded() -> Connection {
        let conn = crate::open_memory().expect("open");
        accounts::insert(&conn, "author", "Author", Role::Author, 1).expect("author");
        accounts::insert(&conn, "reader", "Reader", Role::Reader, 1).expect("reader");
        items::upsert(
            &conn,
            &Item {
                id: "ch-1".to_string(),
                owner_id: "author".to_string(),
                title: "Chapter 1".to_string(),
                price: 100,
                is_locked: true,
            },
        )
        .expect("item");
        conn
    }

    #[test]
    fn test_insert_and_exists() {
        let conn = seeded();
        assert!(!exists(&conn, "reader", "ch-1").expect("exists"));
        insert(&conn, "reader", "ch-1", 100, 10).expect("insert");
        assert!(exists(&conn, "reader", "ch-1").expect("exists"));
        assert_eq!(sold_count_for_owner(&conn, "author").expect("count"), 1);
    }

    #[test]
    fn test_duplicate_is_constraint_violation() {
        let conn = seeded();
        insert(&conn, "reader", "ch-1", 100, 10).expect("insert");
        let err = insert(&conn, "reader", "ch-1", 100, 11).expect_err("duplicate");
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_recent_for_account() {
        let conn = seeded();
        insert(&conn, "reader", "ch-1", 100, 10).expect("insert");
        let rows = recent_for_account(&conn, "reader", 10).expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].coins_spent, 100);
    }
}
