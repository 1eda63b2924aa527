use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::warn;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{LeagueTable, MonthSpec, ScoreBasis};
use crate::sync::compute_league_monthly;

/// A validated `POST /api/league-monthly` body.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueMonthlyRequest {
    pub league_id: u64,
    pub months: Vec<MonthSpec>,
    pub basis: ScoreBasis,
}

impl LeagueMonthlyRequest {
    /// Validate a raw JSON body.
    ///
    /// `leagueId` may be a number or a numeric string and must be non-zero;
    /// `months` must be an array of `{name, gameweeks}` objects.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let league_id = parse_league_id(body.get("leagueId")).ok_or_else(|| {
            ApiError::BadInput("leagueId and months are required".to_string())
        })?;

        let items = match body.get("months") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ApiError::BadInput(
                    "leagueId and months are required".to_string(),
                ))
            }
        };

        let months = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<MonthSpec>(item.clone())
                    .map_err(|e| ApiError::BadInput(format!("months[{}]: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let basis = match body.get("basis") {
            None | Some(Value::Null) => ScoreBasis::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|_| ApiError::BadInput("basis must be \"gross\" or \"net\"".to_string()))?,
        };

        Ok(Self {
            league_id,
            months,
            basis,
        })
    }
}

fn parse_league_id(value: Option<&Value>) -> Option<u64> {
    let id = match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

pub async fn league_monthly(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LeagueTable>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        warn!("Rejected league-monthly body: {}", rejection.body_text());
        ApiError::BadInput(rejection.body_text())
    })?;

    let request = LeagueMonthlyRequest::from_json(&body).inspect_err(|e| {
        warn!("Rejected league-monthly request: {}", e);
    })?;

    let table = compute_league_monthly(
        state.upstream.clone(),
        request.league_id,
        &request.months,
        request.basis,
    )
    .await?;

    Ok(Json(table))
}
