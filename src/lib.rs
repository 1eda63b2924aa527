//! # FPL Monthly
//!
//! Ranks a Fantasy Premier League classic league over caller-defined
//! "months" (named groups of gameweeks).
//!
//! ## Architecture
//!
//! - **models**: Core data structures (managers, months, score maps, tables)
//! - **fetch**: Upstream API client and response records
//! - **sync**: Standings pagination, concurrent history fetching, orchestration
//! - **calculate**: Month aggregation, ranking and month leaders
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod sync;

pub use models::*;
pub use sync::compute_league_monthly;
