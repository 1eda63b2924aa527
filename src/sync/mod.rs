//! League month-table pipeline.
//!
//! Coordinates one computation:
//! 1. Collect the league roster page by page
//! 2. Read the valid gameweek ids from the events metadata
//! 3. Fetch every manager's history through the bounded worker pool
//! 4. Sum gameweeks into months and assemble the ranked table

mod histories;
mod standings;

pub use histories::*;
pub use standings::*;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::calculate::{aggregate, assemble, attach_breakdown};
use crate::fetch::{FetchError, FplApi};
use crate::models::{duplicate_month_names, EntryId, LeagueTable, MonthSpec, ScoreBasis};

/// Errors that can occur computing a league table.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Upstream unavailable ({stage}): {source}")]
    UpstreamUnavailable {
        stage: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("League {league_id}: standings still paginating after {pages} pages")]
    StandingsRunaway { league_id: u64, pages: u32 },
}

/// Compute the month table for a classic league.
///
/// Standings or metadata failures abort the computation. Individual history
/// failures do not: those managers show zero for every month, exactly like a
/// manager who scored nothing.
pub async fn compute_league_monthly(
    api: Arc<dyn FplApi>,
    league_id: u64,
    months: &[MonthSpec],
    basis: ScoreBasis,
) -> Result<LeagueTable, SyncError> {
    if league_id == 0 {
        return Err(SyncError::BadInput("leagueId is required".to_string()));
    }

    let duplicates = duplicate_month_names(months);
    if !duplicates.is_empty() {
        warn!(
            "Duplicate month names {:?}: later months overwrite earlier ones in each row",
            duplicates
        );
    }

    info!(
        "Computing league {} over {} month(s) ({:?} points)",
        league_id,
        months.len(),
        basis
    );

    let managers = collect_standings(api.as_ref(), league_id).await?;

    let metadata = api
        .get_events_metadata()
        .await
        .map_err(|source| SyncError::UpstreamUnavailable {
            stage: "events metadata",
            source,
        })?;
    let valid_gameweeks = metadata.valid_gameweeks();
    info!(
        "{} gameweeks listed upstream (current: {:?}, last finished: {:?}, next deadline: {:?})",
        valid_gameweeks.len(),
        metadata.current_gameweek(),
        metadata.last_finished_gameweek(),
        metadata.next_deadline()
    );

    let entry_ids: Vec<EntryId> = managers.iter().map(|m| m.entry_id).collect();
    let batch = fetch_all_histories(api, &entry_ids, &valid_gameweeks, basis).await;
    if !batch.failed.is_empty() {
        warn!(
            "League {}: {} manager(s) will show zero after failed history fetches: {:?}",
            league_id,
            batch.failed.len(),
            batch.failed
        );
    }
    let lost = batch.unaccounted(entry_ids.len());
    if lost > 0 {
        warn!(
            "League {}: {} manager(s) were never fetched after a history worker aborted and will show zero",
            league_id, lost
        );
    }

    let month_totals = aggregate(&batch.scores, months);
    let month_names: Vec<String> = months.iter().map(|m| m.name.clone()).collect();
    let mut table = assemble(&managers, &month_totals, &month_names);
    attach_breakdown(&mut table, &aggregate(&batch.transfer_costs, months), basis);

    info!("League {}: table built with {} rows", league_id, table.rows.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFplApi;
    use pretty_assertions::assert_eq;

    fn two_manager_league() -> MockFplApi {
        MockFplApi::new()
            .with_page(&[(1, "Alice", "A Team"), (2, "Bob", "B Team")], false)
            .with_events(1..=38)
    }

    #[tokio::test]
    async fn test_two_manager_month() {
        let api = Arc::new(
            two_manager_league()
                .with_history(1, &[(1, 50), (2, 60)])
                .with_history(2, &[(1, 70)]),
        );
        let months = vec![MonthSpec::new("Aug", [1, 2])];

        let table = compute_league_monthly(api, 314, &months, ScoreBasis::Gross)
            .await
            .unwrap();

        assert_eq!(table.months, vec!["Aug".to_string()]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].name, "Alice");
        assert_eq!(table.rows[0].total, 110);
        assert_eq!(table.rows[0].month_points("Aug"), 110);
        assert_eq!(table.rows[1].name, "Bob");
        assert_eq!(table.rows[1].total, 70);
    }

    #[tokio::test]
    async fn test_zero_league_id_makes_no_calls() {
        let api = Arc::new(two_manager_league());

        let err = compute_league_monthly(api.clone(), 0, &[], ScoreBasis::Gross)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::BadInput(_)));
        assert_eq!(api.standings_calls(), 0);
        assert_eq!(api.events_calls(), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_is_fatal() {
        let api = Arc::new(two_manager_league().failing_events());

        let err = compute_league_monthly(api.clone(), 1, &[], ScoreBasis::Gross)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::UpstreamUnavailable {
                stage: "events metadata",
                ..
            }
        ));
        assert_eq!(api.history_calls(), 0);
    }

    #[tokio::test]
    async fn test_standings_failure_is_fatal() {
        let api = Arc::new(two_manager_league().failing_standings());

        let err = compute_league_monthly(api.clone(), 1, &[], ScoreBasis::Gross)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::UpstreamUnavailable { .. }));
        assert_eq!(api.events_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_history_shows_zero() {
        let api = Arc::new(
            two_manager_league()
                .with_history(1, &[(1, 50)])
                .with_history(2, &[(1, 70), (2, 80)])
                .failing_entry(2),
        );
        let months = vec![MonthSpec::new("Aug", [1]), MonthSpec::new("Sep", [2])];

        let table = compute_league_monthly(api, 1, &months, ScoreBasis::Gross)
            .await
            .unwrap();

        let bob = table
            .rows
            .iter()
            .find(|r| r.entry_id == EntryId::new(2))
            .unwrap();
        assert_eq!(bob.total, 0);
        assert_eq!(bob.month_points("Aug"), 0);
        assert_eq!(bob.month_points("Sep"), 0);
        assert_eq!(table.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_every_history_failing_still_returns_roster() {
        let api = Arc::new(two_manager_league().failing_entry(1).failing_entry(2));
        let months = vec![MonthSpec::new("Aug", [1, 2])];

        let table = compute_league_monthly(api, 1, &months, ScoreBasis::Gross)
            .await
            .unwrap();

        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|r| r.total == 0));
        // Roster order survives an all-zero sort
        assert_eq!(table.rows[0].entry_id, EntryId::new(1));
    }

    #[tokio::test]
    async fn test_unlisted_gameweek_ignored() {
        let api = Arc::new(
            MockFplApi::new()
                .with_page(&[(1, "Alice", "A Team")], false)
                .with_events(1..=2)
                .with_history(1, &[(1, 10), (2, 20), (3, 1000)]),
        );
        let months = vec![MonthSpec::new("Aug", [1, 2, 3])];

        let table = compute_league_monthly(api, 1, &months, ScoreBasis::Gross)
            .await
            .unwrap();

        assert_eq!(table.rows[0].total, 30);
    }

    #[tokio::test]
    async fn test_net_basis() {
        let api = Arc::new(two_manager_league().with_history_records(
            1,
            vec![crate::fetch::HistoryRecord::new(1, 70).with_transfers_cost(8)],
        ));
        let months = vec![MonthSpec::new("Aug", [1])];

        let gross = compute_league_monthly(api.clone(), 1, &months, ScoreBasis::Gross)
            .await
            .unwrap();
        let net = compute_league_monthly(api, 1, &months, ScoreBasis::Net)
            .await
            .unwrap();

        assert_eq!(gross.rows[0].total, 70);
        assert_eq!(net.rows[0].total, 62);
        assert_eq!(gross.rows[0].breakdown["Aug"], net.rows[0].breakdown["Aug"]);
        assert_eq!(net.rows[0].breakdown["Aug"].gross, 70);
        assert_eq!(net.rows[0].breakdown["Aug"].transfer_cost, 8);
        assert_eq!(net.rows[0].breakdown["Aug"].net, 62);
    }

    #[tokio::test]
    async fn test_tied_managers_share_rank() {
        let api = Arc::new(
            MockFplApi::new()
                .with_page(&[(1, "Alice", "A"), (2, "Bob", "B"), (3, "Cat", "C")], false)
                .with_events(1..=38)
                .with_history(1, &[(1, 40)])
                .with_history(2, &[(1, 60)])
                .with_history(3, &[(1, 60)]),
        );
        let months = vec![MonthSpec::new("Aug", [1])];

        let table = compute_league_monthly(api, 1, &months, ScoreBasis::Gross)
            .await
            .unwrap();

        let ranks: Vec<u32> = table.rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 2]);
        assert_eq!(table.rows[0].name, "Bob");
        assert_eq!(table.rows[2].breakdown["Aug"].rank, 2);
    }
}
