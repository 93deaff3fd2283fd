//! Persistence service — background flush for dirty creator records.
//!
//! DESIGN
//! ======
//! A background task snapshots dirty records under the store lock, flushes
//! them to Postgres outside the lock, then sleeps before the next cycle.
//!
//! ERROR HANDLING
//! ==============
//! Dirty flags are cleared only after successful writes, and only when the
//! record's `updated_at` has not advanced since the snapshot. Delete
//! tombstones are cleared only after a successful reap. This prioritizes
//! durability over duplicate flush attempts: repeated upserts and deletes
//! are acceptable, silent data loss is not.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::creator;
use crate::state::{AppState, Creator};

const DEFAULT_FLUSH_INTERVAL_MS: u64 = 500;

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_flush_task(state: AppState) -> JoinHandle<()> {
    let flush_interval_ms = env_parse("CREATOR_FLUSH_INTERVAL_MS", DEFAULT_FLUSH_INTERVAL_MS);
    info!(flush_interval_ms, "creator persistence flush configured");
    tokio::spawn(async move {
        loop {
            flush_all_dirty(&state).await;
            tokio::time::sleep(Duration::from_millis(flush_interval_ms)).await;
        }
    })
}

#[derive(Debug)]
struct DirtyFlushBatch {
    creators: Vec<Creator>,
    flushed_stamps: Vec<(Uuid, i64)>,
}

async fn flush_all_dirty(state: &AppState) {
    // PHASE: SNAPSHOT DIRTY RECORDS + TOMBSTONES
    // WHY: collect immutable clones under lock, then perform I/O lock-free.
    let (batch, tombstones) = {
        let store = state.creators.read().await;
        if store.dirty.is_empty() && store.deleted.is_empty() {
            return;
        }

        let creators = store
            .dirty
            .iter()
            .filter_map(|id| store.creators.get(id).cloned())
            .collect::<Vec<_>>();
        let stamps = creators
            .iter()
            .map(|c| (c.id, c.updated_at))
            .collect::<Vec<_>>();
        let tombstones = store.deleted.iter().copied().collect::<Vec<_>>();
        (DirtyFlushBatch { creators, flushed_stamps: stamps }, tombstones)
    };

    // PHASE: FLUSH + ACK DIRTY IDS
    // WHY: if flush fails we intentionally keep dirty flags for retry.
    if !batch.creators.is_empty() {
        match creator::flush_creators(&state.pool, &batch.creators).await {
            Ok(()) => {
                clear_flushed_dirty_ids(state, &batch.flushed_stamps).await;
            }
            Err(e) => {
                error!(error = %e, count = batch.creators.len(), "persistence flush failed");
            }
        }
    }

    // PHASE: REAP TOMBSTONES
    // WHY: a delete that raced an earlier flush snapshot can be re-inserted
    // by that flush's upsert; re-issuing the delete after the upserts makes
    // the row stay gone. Tombstones survive failed reaps for retry.
    if !tombstones.is_empty() {
        match creator::delete_creators(&state.pool, &tombstones).await {
            Ok(()) => {
                let mut store = state.creators.write().await;
                for id in &tombstones {
                    store.deleted.remove(id);
                }
            }
            Err(e) => {
                error!(error = %e, count = tombstones.len(), "tombstone reap failed");
            }
        }
    }
}

async fn clear_flushed_dirty_ids(state: &AppState, flushed_stamps: &[(Uuid, i64)]) {
    let mut store = state.creators.write().await;
    for (creator_id, flushed_at) in flushed_stamps {
        // EDGE: keep dirty flag if the record was updated again after snapshot.
        let can_clear = match store.creators.get(creator_id) {
            Some(current) => current.updated_at == *flushed_at,
            None => true,
        };
        if can_clear {
            store.dirty.remove(creator_id);
        }
    }
}

#[cfg(test)]
pub(crate) async fn flush_all_dirty_for_tests(state: &AppState) {
    flush_all_dirty(state).await;
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
