use serde::{Deserialize, Serialize};

use super::EntryId;

/// One league participant, built from a single standings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub entry_id: EntryId,

    /// The human's name (`player_name` upstream)
    pub display_name: String,

    /// The team's name (`entry_name` upstream)
    pub team_name: String,
}

impl Manager {
    pub fn new(entry_id: EntryId, display_name: String, team_name: String) -> Self {
        Self {
            entry_id,
            display_name,
            team_name,
        }
    }
}
