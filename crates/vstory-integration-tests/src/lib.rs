//! Integration test crate for the VStory coin ledger.
//!
//! The library only holds fixtures shared by the tests under `tests/`,
//! which drive end-to-end money flows across the workspace crates against
//! a real database file.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p vstory-integration-tests
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::Connection;
use tempfile::TempDir;
use vstory_db::queries::{accounts, items};
use vstory_ledger::{Notice, Notifier};
use vstory_types::account::Role;
use vstory_types::events::EventType;
use vstory_types::item::Item;

/// Fixed creation time for seeded rows.
pub const SEEDED_AT: u64 = 1_704_067_200;

/// A ledger database file in a private temporary directory.
///
/// Every call to [`TestLedger::connect`] opens an independent connection,
/// so threads can contend on the same file the way daemon requests do.
pub struct TestLedger {
    _dir: TempDir,
    path: PathBuf,
}

impl TestLedger {
    /// Create the database and run migrations once.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("ledger.db");
        drop(vstory_db::open(&path).expect("create ledger database"));
        Self { _dir: dir, path }
    }

    pub fn connect(&self) -> Connection {
        vstory_db::open(&self.path).expect("open ledger database")
    }

    /// Insert an account holding `balance` coins.
    pub fn account(&self, id: &str, role: Role, balance: u64) {
        let conn = self.connect();
        accounts::insert(&conn, id, id, role, SEEDED_AT).expect("insert account");
        if balance > 0 {
            vstory_ledger::balance::credit(&conn, id, balance).expect("seed balance");
        }
    }

    /// Insert a locked chapter.
    pub fn chapter(&self, id: &str, owner_id: &str, price: u64) {
        let conn = self.connect();
        items::upsert(
            &conn,
            &Item {
                id: id.to_string(),
                owner_id: owner_id.to_string(),
                title: format!("Chapter {id}"),
                price,
                is_locked: true,
            },
        )
        .expect("insert chapter");
    }

    pub fn balance(&self, id: &str) -> u64 {
        accounts::balance(&self.connect(), id).expect("read balance")
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifier that keeps every notice it is handed.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<Notice>>);

impl Recorder {
    pub fn kinds(&self) -> Vec<EventType> {
        self.0.lock().expect("recorder lock").iter().map(|n| n.kind).collect()
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.0.lock().expect("recorder lock"))
    }
}

impl Notifier for Recorder {
    fn notify(&self, notice: Notice) {
        self.0.lock().expect("recorder lock").push(notice);
    }
}
