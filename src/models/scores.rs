use std::collections::HashMap;

use super::{EntryId, GameweekId};

/// Points keyed by gameweek, then by entry.
///
/// Holds at most one value per `(gameweek, entry)` pair; recording the same
/// pair twice keeps the later value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoresByGameweek {
    by_gameweek: HashMap<GameweekId, HashMap<EntryId, i64>>,
}

impl ScoresByGameweek {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, gameweek: GameweekId, entry_id: EntryId, points: i64) {
        self.by_gameweek
            .entry(gameweek)
            .or_default()
            .insert(entry_id, points);
    }

    pub fn gameweek(&self, gameweek: GameweekId) -> Option<&HashMap<EntryId, i64>> {
        self.by_gameweek.get(&gameweek)
    }

    pub fn points(&self, gameweek: GameweekId, entry_id: EntryId) -> Option<i64> {
        self.gameweek(gameweek)
            .and_then(|entries| entries.get(&entry_id))
            .copied()
    }

    /// Fold another set of scores into this one; `other` wins on collisions.
    pub fn merge(&mut self, other: ScoresByGameweek) {
        for (gameweek, entries) in other.by_gameweek {
            self.by_gameweek.entry(gameweek).or_default().extend(entries);
        }
    }

    /// Number of `(gameweek, entry)` pairs held.
    pub fn len(&self) -> usize {
        self.by_gameweek.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
