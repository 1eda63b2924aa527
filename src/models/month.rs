//! Caller-defined months and the per-month totals derived from them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntryId, GameweekId};

/// Errors building a month definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonthSpecError {
    #[error("Month '{name}': gameweek range {from}..={to} is empty")]
    EmptyRange { name: String, from: u32, to: u32 },

    #[error("Month '{name}': gameweek 0 does not exist")]
    ZeroGameweek { name: String },
}

/// A named bucket of gameweeks supplied by the caller.
///
/// Names are not required to be unique. Two months sharing a name collide
/// when the table is assembled and the later one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpec {
    pub name: String,
    pub gameweeks: Vec<GameweekId>,
}

impl MonthSpec {
    pub fn new(name: impl Into<String>, gameweeks: impl IntoIterator<Item = u32>) -> Self {
        Self {
            name: name.into(),
            gameweeks: gameweeks.into_iter().map(GameweekId::new).collect(),
        }
    }

    /// Build a month from an inclusive gameweek range.
    pub fn from_range(name: impl Into<String>, from: u32, to: u32) -> Result<Self, MonthSpecError> {
        let name = name.into();
        if from == 0 {
            return Err(MonthSpecError::ZeroGameweek { name });
        }
        if from > to {
            return Err(MonthSpecError::EmptyRange { name, from, to });
        }
        Ok(Self::new(name, from..=to))
    }
}

/// Names that occur more than once, in order of their first repeat.
pub fn duplicate_month_names(months: &[MonthSpec]) -> Vec<&str> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for month in months {
        let count = seen.entry(month.name.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(month.name.as_str());
        }
    }
    duplicates
}

/// Summed points per entry for one month.
///
/// Only entries that scored in at least one of the month's valid gameweeks
/// appear in `totals`; a missing entry means zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub name: String,
    pub totals: BTreeMap<EntryId, i64>,
}

impl MonthTotal {
    pub fn points_for(&self, entry_id: EntryId) -> i64 {
        self.totals.get(&entry_id).copied().unwrap_or(0)
    }
}

/// Which figure from a history record counts as the gameweek score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBasis {
    /// Points as reported by upstream
    #[default]
    Gross,
    /// Points minus that gameweek's transfer hits
    Net,
}

impl ScoreBasis {
    pub fn score(self, points: i64, transfers_cost: i64) -> i64 {
        match self {
            ScoreBasis::Gross => points,
            ScoreBasis::Net => points - transfers_cost,
        }
    }
}
