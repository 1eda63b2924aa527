//! Upstream response records.
//!
//! Every field defaults when absent or null: an upstream record missing a
//! field reads as empty/zero rather than failing to parse.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{EntryId, GameweekId, Manager};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let maybe: Option<T> = Option::deserialize(deserializer)?;
    Ok(maybe.unwrap_or_default())
}

/// Read an RFC 3339 timestamp; any other value reads as `None`.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

// ── Standings ───────────────────────────────────────────────────────────────

/// Envelope of `leagues-classic/{id}/standings/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub standings: StandingsPage,
}

/// One page of a classic league's standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingsPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<StandingRow>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub has_next: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
}

/// A manager's row within a standings page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entry: EntryId,

    /// Manager name
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_name: String,

    /// Team name
    #[serde(default, deserialize_with = "null_as_default")]
    pub entry_name: String,

}

impl StandingRow {
    pub fn to_manager(&self) -> Manager {
        Manager::new(self.entry, self.player_name.clone(), self.entry_name.clone())
    }
}

// ── Bootstrap / events ──────────────────────────────────────────────────────

/// The slice of `bootstrap-static/` this crate reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<EventMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: GameweekId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub finished: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_current: bool,

    #[serde(default, deserialize_with = "lenient_datetime")]
    pub deadline_time: Option<DateTime<Utc>>,
}

impl EventsMetadata {
    /// Ids of every listed gameweek.
    pub fn valid_gameweeks(&self) -> HashSet<GameweekId> {
        self.events.iter().map(|e| e.id).collect()
    }

    pub fn current_gameweek(&self) -> Option<GameweekId> {
        self.events.iter().find(|e| e.is_current).map(|e| e.id)
    }

    pub fn last_finished_gameweek(&self) -> Option<GameweekId> {
        self.events.iter().filter(|e| e.finished).map(|e| e.id).max()
    }

    /// Deadline of the first unfinished gameweek that has one.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.events
            .iter()
            .filter(|e| !e.finished)
            .find_map(|e| e.deadline_time)
    }
}

// ── Manager history ─────────────────────────────────────────────────────────

/// `entry/{id}/history/`; only the current season is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current: Vec<HistoryRecord>,
}

/// A manager's result for one gameweek.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: GameweekId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub points: i64,

    /// Points deducted for extra transfers
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_transfers_cost: i64,
}

impl HistoryRecord {
    pub fn new(event: u32, points: i64) -> Self {
        Self {
            event: GameweekId::new(event),
            points,
            event_transfers_cost: 0,
        }
    }

    pub fn with_transfers_cost(mut self, cost: i64) -> Self {
        self.event_transfers_cost = cost;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standings_deserialize() {
        let json = r#"{
            "league": {"id": 314, "name": "Office League"},
            "standings": {
                "has_next": true,
                "page": 1,
                "results": [
                    {"id": 9, "entry": 1001, "player_name": "Ana Silva", "entry_name": "Silva Linings", "rank": 1, "total": 812},
                    {"id": 10, "entry": 1002, "player_name": "Tom Reid", "entry_name": "Reid the Game", "rank": 2, "total": 790}
                ]
            }
        }"#;

        let parsed: StandingsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.standings.has_next);
        assert_eq!(parsed.standings.results.len(), 2);

        let manager = parsed.standings.results[0].to_manager();
        assert_eq!(manager.entry_id, EntryId::new(1001));
        assert_eq!(manager.display_name, "Ana Silva");
        assert_eq!(manager.team_name, "Silva Linings");
    }

    #[test]
    fn test_standings_ignores_unread_fields() {
        let json = r#"{"standings": {"results": [
            {"entry": 7, "player_name": "Kai", "entry_name": "K", "rank": "n/a", "total": null}
        ]}}"#;

        let parsed: StandingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.standings.results[0].entry, EntryId::new(7));
    }

    #[test]
    fn test_standings_missing_fields_default() {
        let parsed: StandingsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.standings.results.is_empty());
        assert!(!parsed.standings.has_next);

        let parsed: StandingsResponse =
            serde_json::from_str(r#"{"standings": {"results": [{"entry": 5, "player_name": null}]}}"#)
                .unwrap();
        assert!(!parsed.standings.has_next);
        assert_eq!(parsed.standings.results[0].player_name, "");
        assert_eq!(parsed.standings.results[0].entry_name, "");
    }

    #[test]
    fn test_events_metadata_deserialize() {
        let json = r#"{
            "events": [
                {"id": 1, "name": "Gameweek 1", "finished": true, "is_current": false, "deadline_time": "2024-08-16T17:30:00Z"},
                {"id": 2, "name": "Gameweek 2", "finished": true, "is_current": true, "deadline_time": "2024-08-24T10:00:00Z"},
                {"id": 3, "name": "Gameweek 3", "finished": false, "is_current": false, "deadline_time": null}
            ],
            "teams": [],
            "elements": []
        }"#;

        let meta: EventsMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.events.len(), 3);
        assert_eq!(meta.current_gameweek(), Some(GameweekId::new(2)));
        assert_eq!(meta.last_finished_gameweek(), Some(GameweekId::new(2)));
        assert!(meta.events[0].deadline_time.is_some());
        assert!(meta.events[2].deadline_time.is_none());
        assert_eq!(meta.next_deadline(), None);

        let valid = meta.valid_gameweeks();
        assert!(valid.contains(&GameweekId::new(3)));
        assert!(!valid.contains(&GameweekId::new(4)));
    }

    #[test]
    fn test_events_metadata_malformed_deadline_is_none() {
        let json = r#"{"events": [
            {"id": 1, "deadline_time": "TBC"},
            {"id": 2},
            {"id": 3, "deadline_time": 1723829400},
            {"id": 4, "deadline_time": "2024-09-14T10:00:00Z"}
        ]}"#;

        let meta: EventsMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(meta.valid_gameweeks().len(), 4);
        assert!(meta.events[0].deadline_time.is_none());
        assert!(meta.events[2].deadline_time.is_none());
        assert_eq!(
            meta.next_deadline().map(|d| d.to_rfc3339()),
            Some("2024-09-14T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_events_metadata_missing_events() {
        let meta: EventsMetadata = serde_json::from_str(r#"{"teams": []}"#).unwrap();
        assert!(meta.valid_gameweeks().is_empty());
        assert_eq!(meta.current_gameweek(), None);
    }

    #[test]
    fn test_history_deserialize() {
        let json = r#"{
            "current": [
                {"event": 1, "points": 71, "total_points": 71, "event_transfers_cost": 0},
                {"event": 2, "points": 48, "total_points": 119, "event_transfers_cost": 4}
            ],
            "past": [{"season_name": "2023/24", "total_points": 2301}],
            "chips": []
        }"#;

        let history: ManagerHistory = serde_json::from_str(json).unwrap();
        assert_eq!(
            history.current,
            vec![
                HistoryRecord::new(1, 71),
                HistoryRecord::new(2, 48).with_transfers_cost(4)
            ]
        );
    }

    #[test]
    fn test_history_missing_current() {
        let history: ManagerHistory = serde_json::from_str(r#"{"current": null}"#).unwrap();
        assert!(history.current.is_empty());

        let history: ManagerHistory = serde_json::from_str(r#"{"current": [{"event": 3}]}"#).unwrap();
        assert_eq!(history.current, vec![HistoryRecord::new(3, 0)]);
    }
}
