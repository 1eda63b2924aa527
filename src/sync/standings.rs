//! Paginated standings collection.

use tracing::{debug, info, warn};

use super::SyncError;
use crate::fetch::FplApi;
use crate::models::Manager;

/// Hard ceiling on standings pages for one league.
///
/// The upstream's `has_next` flag is otherwise trusted; a league this large
/// (50 rows per page) is far beyond any real mini-league.
pub const MAX_STANDINGS_PAGES: u32 = 1000;

/// Walk a league's standings from page 1 until `has_next` is false.
///
/// Any page failure is fatal; there is no partial roster. A page that claims
/// a successor but carries no rows ends the walk.
pub async fn collect_standings(api: &dyn FplApi, league_id: u64) -> Result<Vec<Manager>, SyncError> {
    let mut managers = Vec::new();
    let mut page = 1;

    loop {
        if page > MAX_STANDINGS_PAGES {
            return Err(SyncError::StandingsRunaway {
                league_id,
                pages: MAX_STANDINGS_PAGES,
            });
        }

        let standings = api
            .get_standings_page(league_id, page)
            .await
            .map_err(|source| SyncError::UpstreamUnavailable {
                stage: "standings",
                source,
            })?;

        debug!(
            "League {}: page {} has {} rows (has_next={})",
            league_id,
            page,
            standings.results.len(),
            standings.has_next
        );

        let empty = standings.results.is_empty();
        managers.extend(standings.results.iter().map(|row| row.to_manager()));

        if !standings.has_next {
            break;
        }
        if empty {
            warn!(
                "League {}: page {} is empty but claims another page follows, stopping",
                league_id, page
            );
            break;
        }
        page += 1;
    }

    info!(
        "League {}: collected {} managers over {} page(s)",
        league_id,
        managers.len(),
        page
    );
    Ok(managers)
}
