//! Priced-item catalog (chapters).
//!
//! Rows are written through the ledger's catalog operation and read inside
//! purchase and tip transactions to learn an item's price and owner.

use rusqlite::{Connection, OptionalExtension};
use vstory_types::item::Item;

use crate::queries::amount;
use crate::{to_sql, DbError, Result};

/// Insert or replace a catalog row.
pub fn upsert(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT INTO items (id, owner_id, title, price, is_locked)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             owner_id = excluded.owner_id,
             title = excluded.title,
             price = excluded.price,
             is_locked = excluded.is_locked",
        rusqlite::params![
            item.id,
            item.owner_id,
            item.title,
            to_sql(item.price)?,
            item.is_locked,
        ],
    )?;
    Ok(())
}

/// Look up an item, if present.
pub fn find(conn: &Connection, id: &str) -> Result<Option<Item>> {
    Ok(conn
        .query_row(
            "SELECT id, owner_id, title, price, is_locked FROM items WHERE id = ?1",
            [id],
            |row| {
                Ok(Item {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    title: row.get(2)?,
                    price: amount(row, 3)?,
                    is_locked: row.get(4)?,
                })
            },
        )
        .optional()?)
}

/// Look up an item that must exist.
pub fn get(conn: &Connection, id: &str) -> Result<Item> {
    find(conn, id)?.ok_or_else(|| DbError::NotFound(format!("item '{id}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::accounts;
    use vstory_types::account::Role;

    #[test]
    fn test_upsert_and_get() {
        let conn = crate::open_memory().expect("open");
        accounts::insert(&conn, "author", "Author", Role::Author, 1).expect("author");

        let mut item = Item {
            id: "ch-1".to_string(),
            owner_id: "author".to_string(),
            title: "Chapter 1".to_string(),
            price: 100,
            is_locked: true,
        };
        upsert(&conn, &item).expect("insert");
        assert_eq!(get(&conn, "ch-1").expect("get"), item);

        item.price = 150;
        upsert(&conn, &item).expect("update");
        assert_eq!(get(&conn, "ch-1").expect("get").price, 150);
    }

    #[test]
    fn test_owner_must_exist() {
        let conn = crate::open_memory().expect("open");
        let item = Item {
            id: "ch-1".to_string(),
            owner_id: "nobody".to_string(),
            title: "Orphan".to_string(),
            price: 10,
            is_locked: true,
        };
        assert!(upsert(&conn, &item).is_err());
        assert!(matches!(get(&conn, "ch-1"), Err(DbError::NotFound(_))));
        assert_eq!(find(&conn, "ch-1").expect("find"), None);
    }
}
