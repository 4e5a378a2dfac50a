//! Catalog maintenance: registering and repricing sellable items.
//!
//! Authors list and reprice their own chapters. Administrators may write
//! any row, including handing an item to a different author.

use std::ops::RangeInclusive;

use rusqlite::Connection;
use vstory_db::queries::{accounts, items};
use vstory_types::item::Item;

use crate::{begin, LedgerError, Result};

/// Accepted price for a locked item.
pub const LOCKED_PRICE: RangeInclusive<u64> = 100..=5_000;

/// Longest accepted item title.
pub const MAX_TITLE_CHARS: usize = 200;

/// Create or update a catalog item on behalf of `caller_id`.
///
/// The caller must be the item's owner (an author) or an administrator,
/// and only an administrator may move an existing item to another owner.
/// Unlocked items are stored with price 0.
pub fn upsert_item(conn: &mut Connection, caller_id: &str, item: Item) -> Result<Item> {
    let item = normalize(item)?;

    let tx = begin(conn)?;
    let caller = accounts::find(&tx, caller_id)?
        .ok_or_else(|| LedgerError::Forbidden(format!("unknown account '{caller_id}'")))?;
    let owner = accounts::get(&tx, &item.owner_id)?;
    if !owner.role.is_earner() {
        return Err(LedgerError::Validation(format!(
            "owner '{}' is not an author",
            item.owner_id
        )));
    }
    let existing = items::find(&tx, &item.id)?;
    if !caller.role.is_admin() {
        let takes_over = existing
            .as_ref()
            .is_some_and(|prev| prev.owner_id != caller.id);
        if caller.id != item.owner_id || takes_over {
            return Err(LedgerError::Forbidden(format!(
                "account '{caller_id}' may not edit item '{}'",
                item.id
            )));
        }
    }
    items::upsert(&tx, &item)?;
    tx.commit()?;

    tracing::info!(
        item_id = %item.id,
        owner_id = %item.owner_id,
        caller_id,
        price = item.price,
        is_locked = item.is_locked,
        created = existing.is_none(),
        "catalog item saved"
    );
    Ok(item)
}

fn normalize(mut item: Item) -> Result<Item> {
    item.id = item.id.trim().to_string();
    item.title = item.title.trim().to_string();
    if item.id.is_empty() {
        return Err(LedgerError::Validation("item id is required".into()));
    }
    if item.title.is_empty() {
        return Err(LedgerError::Validation("item title is required".into()));
    }
    if item.title.chars().count() > MAX_TITLE_CHARS {
        return Err(LedgerError::Validation(format!(
            "title longer than {MAX_TITLE_CHARS} characters"
        )));
    }
    if !item.is_locked {
        item.price = 0;
    } else if !LOCKED_PRICE.contains(&item.price) {
        return Err(LedgerError::Validation(format!(
            "locked price must be between {} and {} coins",
            LOCKED_PRICE.start(),
            LOCKED_PRICE.end()
        )));
    }
    Ok(item)
}
