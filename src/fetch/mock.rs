//! In-process upstream stand-in used by tests and dry runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{
    EventMeta, EventsMetadata, FetchError, FplApi, HistoryRecord, ManagerHistory, StandingRow,
    StandingsPage,
};
use crate::models::{EntryId, GameweekId};

/// Canned upstream with call counters and failure injection.
#[derive(Debug, Default)]
pub struct MockFplApi {
    pages: Vec<StandingsPage>,
    events: EventsMetadata,
    histories: HashMap<EntryId, ManagerHistory>,
    failing_entries: HashSet<EntryId>,
    fail_standings: bool,
    fail_events: bool,
    endless_standings: bool,
    standings_calls: AtomicUsize,
    events_calls: AtomicUsize,
    history_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn unavailable() -> FetchError {
    FetchError::HttpStatus {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

impl MockFplApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a standings page; pages are served in insertion order from 1.
    pub fn with_page(mut self, managers: &[(u64, &str, &str)], has_next: bool) -> Self {
        let page = self.pages.len() as u32 + 1;
        self.pages.push(StandingsPage {
            results: managers
                .iter()
                .map(|(entry, player, team)| StandingRow {
                    entry: EntryId::new(*entry),
                    player_name: player.to_string(),
                    entry_name: team.to_string(),
                    ..StandingRow::default()
                })
                .collect(),
            has_next,
            page,
        });
        self
    }

    /// Gameweeks the events metadata lists.
    pub fn with_events(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.events = EventsMetadata {
            events: ids
                .into_iter()
                .map(|id| EventMeta {
                    id: GameweekId::new(id),
                    name: format!("Gameweek {}", id),
                    ..EventMeta::default()
                })
                .collect(),
        };
        self
    }

    /// Set a manager's history from `(gameweek, points)` pairs.
    pub fn with_history(self, entry_id: u64, scores: &[(u32, i64)]) -> Self {
        let records = scores
            .iter()
            .map(|(gw, points)| HistoryRecord::new(*gw, *points))
            .collect();
        self.with_history_records(entry_id, records)
    }

    pub fn with_history_records(mut self, entry_id: u64, records: Vec<HistoryRecord>) -> Self {
        self.histories
            .insert(EntryId::new(entry_id), ManagerHistory { current: records });
        self
    }

    /// Make this manager's history request fail.
    pub fn failing_entry(mut self, entry_id: u64) -> Self {
        self.failing_entries.insert(EntryId::new(entry_id));
        self
    }

    pub fn failing_standings(mut self) -> Self {
        self.fail_standings = true;
        self
    }

    pub fn failing_events(mut self) -> Self {
        self.fail_events = true;
        self
    }

    /// Every standings page has one new row and claims another page follows.
    pub fn endless_standings(mut self) -> Self {
        self.endless_standings = true;
        self
    }

    pub fn standings_calls(&self) -> usize {
        self.standings_calls.load(Ordering::SeqCst)
    }

    pub fn events_calls(&self) -> usize {
        self.events_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Most history requests that were ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FplApi for MockFplApi {
    async fn get_standings_page(
        &self,
        _league_id: u64,
        page: u32,
    ) -> Result<StandingsPage, FetchError> {
        self.standings_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_standings {
            return Err(unavailable());
        }
        if self.endless_standings {
            return Ok(StandingsPage {
                results: vec![StandingRow {
                    entry: EntryId::new(page as u64),
                    ..StandingRow::default()
                }],
                has_next: true,
                page,
            });
        }

        let index = page.checked_sub(1).map(|i| i as usize);
        Ok(index
            .and_then(|i| self.pages.get(i))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_events_metadata(&self) -> Result<EventsMetadata, FetchError> {
        self.events_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_events {
            return Err(unavailable());
        }
        Ok(self.events.clone())
    }

    async fn get_manager_history(&self, entry_id: EntryId) -> Result<ManagerHistory, FetchError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_entries.contains(&entry_id) {
            return Err(unavailable());
        }
        Ok(self.histories.get(&entry_id).cloned().unwrap_or_default())
    }
}
