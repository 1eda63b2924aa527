//! Concurrent per-manager history retrieval.
//!
//! A fixed pool of [`HISTORY_WORKERS`] tasks drains one shared queue of entry
//! ids. Each worker claims the next unclaimed id, fetches that manager's
//! history and keeps the valid gameweeks in its own partial map; partial maps
//! are merged once every worker has finished. A failed fetch is logged and
//! the manager simply contributes nothing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::fetch::{FetchError, FplApi};
use crate::models::{EntryId, GameweekId, ScoreBasis, ScoresByGameweek};

/// Number of history requests in flight at once.
///
/// Fixed rather than configurable: enough throughput for leagues of a few
/// hundred managers while staying polite to a free public API that has no
/// published rate limit.
pub const HISTORY_WORKERS: usize = 10;

/// One manager's history could not be fetched.
#[derive(Debug, Error)]
#[error("History fetch failed for entry {entry_id}: {source}")]
pub struct EntryFetchFailed {
    pub entry_id: EntryId,
    #[source]
    pub source: FetchError,
}

/// Everything the worker pool produced.
#[derive(Debug, Default)]
pub struct HistoryBatch {
    /// Gameweek scores on the requested basis
    pub scores: ScoresByGameweek,
    /// Transfer hits per gameweek, recorded whatever the basis
    pub transfer_costs: ScoresByGameweek,
    /// Entries whose history was fetched
    pub fetched: Vec<EntryId>,
    /// Entries whose fetch failed; they score zero everywhere
    pub failed: Vec<EntryId>,
}

impl HistoryBatch {
    fn merge(&mut self, other: HistoryBatch) {
        self.scores.merge(other.scores);
        self.transfer_costs.merge(other.transfer_costs);
        self.fetched.extend(other.fetched);
        self.failed.extend(other.failed);
    }

    /// How many of `expected` entries are neither fetched nor failed, which
    /// happens only when a worker dies mid-queue.
    pub fn unaccounted(&self, expected: usize) -> usize {
        expected.saturating_sub(self.fetched.len() + self.failed.len())
    }
}

/// Entry ids waiting to be claimed. Each id is handed out exactly once.
struct WorkQueue {
    ids: Vec<EntryId>,
    next: AtomicUsize,
}

impl WorkQueue {
    fn new(ids: Vec<EntryId>) -> Self {
        Self {
            ids,
            next: AtomicUsize::new(0),
        }
    }

    fn claim(&self) -> Option<EntryId> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.ids.get(index).copied()
    }
}

/// One gameweek of a manager's history after filtering.
struct GameweekScore {
    gameweek: GameweekId,
    points: i64,
    transfers_cost: i64,
}

/// Fetch one manager and keep only records for listed gameweeks.
async fn fetch_entry(
    api: &dyn FplApi,
    entry_id: EntryId,
    valid_gameweeks: &HashSet<GameweekId>,
    basis: ScoreBasis,
) -> Result<Vec<GameweekScore>, EntryFetchFailed> {
    let history = api
        .get_manager_history(entry_id)
        .await
        .map_err(|source| EntryFetchFailed { entry_id, source })?;

    Ok(history
        .current
        .iter()
        .filter(|record| valid_gameweeks.contains(&record.event))
        .map(|record| GameweekScore {
            gameweek: record.event,
            points: basis.score(record.points, record.event_transfers_cost),
            transfers_cost: record.event_transfers_cost,
        })
        .collect())
}

async fn run_worker(
    worker: usize,
    api: Arc<dyn FplApi>,
    queue: Arc<WorkQueue>,
    valid_gameweeks: Arc<HashSet<GameweekId>>,
    basis: ScoreBasis,
) -> HistoryBatch {
    let mut partial = HistoryBatch::default();

    while let Some(entry_id) = queue.claim() {
        match fetch_entry(api.as_ref(), entry_id, &valid_gameweeks, basis).await {
            Ok(records) => {
                for record in records {
                    partial
                        .scores
                        .record(record.gameweek, entry_id, record.points);
                    partial
                        .transfer_costs
                        .record(record.gameweek, entry_id, record.transfers_cost);
                }
                partial.fetched.push(entry_id);
            }
            Err(e) => {
                warn!("{}", e);
                partial.failed.push(entry_id);
            }
        }
    }

    debug!(
        "History worker {} done: {} fetched, {} failed",
        worker,
        partial.fetched.len(),
        partial.failed.len()
    );
    partial
}

/// Fetch every manager's history with at most [`HISTORY_WORKERS`] requests
/// outstanding, returning once every id has been attempted.
///
/// Records for gameweeks outside `valid_gameweeks` are dropped. Failures never
/// fail the batch, even when every fetch fails.
pub async fn fetch_all_histories(
    api: Arc<dyn FplApi>,
    entry_ids: &[EntryId],
    valid_gameweeks: &HashSet<GameweekId>,
    basis: ScoreBasis,
) -> HistoryBatch {
    let queue = Arc::new(WorkQueue::new(entry_ids.to_vec()));
    let valid_gameweeks = Arc::new(valid_gameweeks.clone());

    let mut workers = JoinSet::new();
    for worker in 0..HISTORY_WORKERS {
        workers.spawn(run_worker(
            worker,
            Arc::clone(&api),
            Arc::clone(&queue),
            Arc::clone(&valid_gameweeks),
            basis,
        ));
    }

    let mut batch = HistoryBatch::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(partial) => batch.merge(partial),
            Err(e) => error!("History worker aborted: {}", e),
        }
    }
    batch.failed.sort();

    info!(
        "Fetched {} of {} manager histories ({} failed)",
        batch.fetched.len(),
        entry_ids.len(),
        batch.failed.len()
    );
    if !entry_ids.is_empty() && batch.fetched.is_empty() {
        warn!("Every history fetch failed; all managers will show zero");
    }

    batch
}
