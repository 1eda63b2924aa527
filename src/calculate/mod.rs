//! Month aggregation and table ranking.
//!
//! Pure functions over already-fetched scores:
//! - Gameweek points summed into caller-defined months
//! - Per-manager rows with a grand total, ranked by that total
//! - Per-month gross/transfer-cost/net breakdown with month ranks
//! - Month leaders for reporting

use std::collections::{BTreeMap, HashSet};

use crate::models::{
    LeaderEntry, LeagueTable, Manager, MonthBreakdown, MonthLeader, MonthSpec, MonthTotal,
    ResultRow, ScoreBasis, ScoresByGameweek,
};

/// Sum each month's gameweeks per entry, one total per month in input order.
///
/// A gameweek with no scores (unplayed, future, or unlisted) adds nothing.
/// Partially played months are not prorated.
pub fn aggregate(scores: &ScoresByGameweek, months: &[MonthSpec]) -> Vec<MonthTotal> {
    months
        .iter()
        .map(|month| {
            let mut totals: BTreeMap<_, i64> = BTreeMap::new();
            for &gameweek in &month.gameweeks {
                let Some(entries) = scores.gameweek(gameweek) else {
                    continue;
                };
                for (&entry_id, &points) in entries {
                    *totals.entry(entry_id).or_insert(0) += points;
                }
            }
            MonthTotal {
                name: month.name.clone(),
                totals,
            }
        })
        .collect()
}

/// Dense ranks for `values`, highest first: `[50, 70, 50, 40]` gives
/// `[2, 1, 2, 3]`.
fn dense_ranks(values: &[i64]) -> Vec<u32> {
    let mut distinct = values.to_vec();
    distinct.sort_unstable_by(|a, b| b.cmp(a));
    distinct.dedup();
    values
        .iter()
        .map(|value| {
            distinct
                .binary_search_by(|candidate| value.cmp(candidate))
                .map_or(0, |i| i as u32 + 1)
        })
        .collect()
}

/// Join managers with their month totals into a table sorted by total.
///
/// `total` is summed over `month_names` in order. When two months share a
/// name, the later month's value replaces the earlier one in `monthly` and is
/// then counted once per occurrence of the name. Ties keep roster order and
/// share a dense `rank`.
pub fn assemble(
    managers: &[Manager],
    month_totals: &[MonthTotal],
    month_names: &[String],
) -> LeagueTable {
    let mut rows: Vec<ResultRow> = managers
        .iter()
        .map(|manager| {
            let mut monthly = BTreeMap::new();
            for month in month_totals {
                monthly.insert(month.name.clone(), month.points_for(manager.entry_id));
            }
            let total = month_names
                .iter()
                .map(|name| monthly.get(name).copied().unwrap_or(0))
                .sum();

            ResultRow {
                rank: 0,
                entry_id: manager.entry_id,
                name: manager.display_name.clone(),
                team_name: manager.team_name.clone(),
                monthly,
                total,
                breakdown: BTreeMap::new(),
            }
        })
        .collect();

    // Stable: equal totals stay in roster order
    rows.sort_by(|a, b| b.total.cmp(&a.total));

    let totals: Vec<i64> = rows.iter().map(|r| r.total).collect();
    for (row, rank) in rows.iter_mut().zip(dense_ranks(&totals)) {
        row.rank = rank;
    }

    LeagueTable {
        months: month_names.to_vec(),
        rows,
    }
}

/// Fill each row's per-month breakdown from the month transfer-cost totals.
///
/// `monthly` already holds the counted points on `basis`; the other side is
/// rebuilt from the transfer cost. Month ranks are dense over the counted
/// points. Cost months sharing a name overwrite like `monthly` does.
pub fn attach_breakdown(table: &mut LeagueTable, transfer_costs: &[MonthTotal], basis: ScoreBasis) {
    let mut costs_by_name: BTreeMap<&str, &MonthTotal> = BTreeMap::new();
    for month in transfer_costs {
        costs_by_name.insert(month.name.as_str(), month);
    }

    for (name, costs) in costs_by_name {
        let counted: Vec<i64> = table.rows.iter().map(|r| r.month_points(name)).collect();
        let ranks = dense_ranks(&counted);

        for ((row, points), rank) in table.rows.iter_mut().zip(counted).zip(ranks) {
            let transfer_cost = costs.points_for(row.entry_id);
            let (gross, net) = match basis {
                ScoreBasis::Gross => (points, points - transfer_cost),
                ScoreBasis::Net => (points + transfer_cost, points),
            };
            row.breakdown.insert(
                name.to_string(),
                MonthBreakdown {
                    gross,
                    transfer_cost,
                    net,
                    rank,
                },
            );
        }
    }
}

/// Top score per distinct month name, with every row that reached it.
pub fn month_leaders(table: &LeagueTable) -> Vec<MonthLeader> {
    if table.rows.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    table
        .months
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .filter_map(|name| {
            let points = table.rows.iter().map(|r| r.month_points(name)).max()?;
            let leaders = table
                .rows
                .iter()
                .filter(|r| r.month_points(name) == points)
                .map(|r| LeaderEntry {
                    entry_id: r.entry_id,
                    name: r.name.clone(),
                    team_name: r.team_name.clone(),
                })
                .collect();
            Some(MonthLeader {
                month: name.clone(),
                points,
                leaders,
            })
        })
        .collect()
}
