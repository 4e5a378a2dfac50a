//! Background follow-up worker.
//!
//! Request handlers push the follow-ups of each committed operation onto a
//! channel and return immediately. This task drains the channel and runs
//! each batch on the blocking pool with its own connection, so referral
//! commissions and notifications never delay or fail the triggering call.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use vstory_ledger::FollowUp;

use crate::events::EventBus;

/// Spawn the worker. It stops once every sender has been dropped.
pub fn spawn(
    db_path: PathBuf,
    bus: EventBus,
    capacity: usize,
) -> (mpsc::Sender<Vec<FollowUp>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(run(db_path, bus, rx));
    (tx, handle)
}

async fn run(db_path: PathBuf, bus: EventBus, mut rx: mpsc::Receiver<Vec<FollowUp>>) {
    while let Some(batch) = rx.recv().await {
        let path = db_path.clone();
        let notifier = bus.clone();
        let count = batch.len();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut conn = vstory_db::open(&path)?;
            vstory_ledger::dispatch(&mut conn, &notifier, batch);
            Ok::<_, vstory_db::DbError>(())
        })
        .await;

        match outcome {
            Ok(Ok(())) => debug!(count, "follow-ups dispatched"),
            Ok(Err(e)) => warn!(count, error = %e, "follow-ups dropped: database unavailable"),
            Err(e) => error!(count, error = %e, "follow-up task panicked"),
        }
    }
    debug!("follow-up worker stopped");
}
