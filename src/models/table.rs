use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EntryId;

/// One manager's line in the league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    /// Dense rank by `total`; equal totals share a rank
    pub rank: u32,
    pub entry_id: EntryId,
    pub name: String,
    pub team_name: String,
    /// Points per month name
    pub monthly: BTreeMap<String, i64>,
    /// Sum of `monthly` over the table's month list
    pub total: i64,
    /// Gross, transfer cost, net and month rank per month name
    #[serde(default)]
    pub breakdown: BTreeMap<String, MonthBreakdown>,
}

/// One manager's month seen both before and after transfer hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBreakdown {
    pub gross: i64,
    pub transfer_cost: i64,
    pub net: i64,
    /// Dense rank among all rows for this month's counted points
    pub rank: u32,
}

impl ResultRow {
    pub fn month_points(&self, month: &str) -> i64 {
        self.monthly.get(month).copied().unwrap_or(0)
    }
}

/// The ranked table returned for one league computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueTable {
    /// Month names in the caller's order, duplicates kept
    pub months: Vec<String>,
    /// Sorted by `total` descending, roster order on ties
    pub rows: Vec<ResultRow>,
}

/// Best score for a month and everyone who reached it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthLeader {
    pub month: String,
    pub points: i64,
    pub leaders: Vec<LeaderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderEntry {
    pub entry_id: EntryId,
    pub name: String,
    pub team_name: String,
}
