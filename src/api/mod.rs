//! REST API endpoints.
//!
//! Axum-based HTTP surface over the league month-table computation.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::sync::SyncError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad input: {0}")]
    BadInput(String),

    /// Deliberately opaque; the cause is logged server-side
    #[error("Failed to compute monthly scores")]
    ComputeFailed,
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::BadInput(message) => ApiError::BadInput(message),
            other => {
                tracing::error!("League computation failed: {}", other);
                ApiError::ComputeFailed
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadInput(_) => (StatusCode::BAD_REQUEST, "BAD_INPUT"),
            ApiError::ComputeFailed => (StatusCode::INTERNAL_SERVER_ERROR, "COMPUTE_FAILED"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// CORS for the configured origin, `*` meaning any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/league-monthly", post(routes::league::league_monthly))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
