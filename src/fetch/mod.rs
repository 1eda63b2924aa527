//! Upstream Fantasy Premier League client.
//!
//! Three read-only requests are made against the public API: one page of a
//! classic league's standings, the bootstrap events list, and one manager's
//! season history. Every request carries a browser User-Agent because the
//! upstream rejects default client identifiers.

mod mock;
mod responses;

pub use mock::MockFplApi;
pub use responses::*;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::EntryId;

/// Errors that can occur talking to the upstream API.
///
/// Every variant means the upstream was unavailable for that request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The upstream operations the aggregation pipeline depends on.
#[async_trait]
pub trait FplApi: Send + Sync {
    /// Fetch one 1-based page of a classic league's standings.
    async fn get_standings_page(&self, league_id: u64, page: u32)
        -> Result<StandingsPage, FetchError>;

    /// Fetch the season's gameweek list.
    async fn get_events_metadata(&self) -> Result<EventsMetadata, FetchError>;

    /// Fetch one manager's per-gameweek history for the current season.
    async fn get_manager_history(&self, entry_id: EntryId) -> Result<ManagerHistory, FetchError>;
}

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `reqwest`-backed implementation of [`FplApi`].
pub struct FplClient {
    client: Client,
    base_url: String,
}

impl FplClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("Mozilla/5.0")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    fn standings_url(&self, league_id: u64, page: u32) -> Result<Url, FetchError> {
        let mut url = self.endpoint(&format!("leagues-classic/{}/standings/", league_id))?;
        url.query_pairs_mut()
            .append_pair("page_standings", &page.to_string());
        Ok(url)
    }

    fn bootstrap_url(&self) -> Result<Url, FetchError> {
        self.endpoint("bootstrap-static/")
    }

    fn history_url(&self, entry_id: EntryId) -> Result<Url, FetchError> {
        self.endpoint(&format!("entry/{}/history/", entry_id))
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let url_str = format!("{}/{}", self.base_url, path);
        Url::parse(&url_str).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url_str, e)))
    }

    /// GET a URL and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl FplApi for FplClient {
    async fn get_standings_page(
        &self,
        league_id: u64,
        page: u32,
    ) -> Result<StandingsPage, FetchError> {
        let url = self.standings_url(league_id, page)?;
        let response: StandingsResponse = self.get_json(url).await?;
        Ok(response.standings)
    }

    async fn get_events_metadata(&self) -> Result<EventsMetadata, FetchError> {
        let url = self.bootstrap_url()?;
        self.get_json(url).await
    }

    async fn get_manager_history(&self, entry_id: EntryId) -> Result<ManagerHistory, FetchError> {
        let url = self.history_url(entry_id)?;
        self.get_json(url).await
    }
}
