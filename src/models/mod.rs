//! Core data models for league month tables.

mod ids;
mod manager;
mod month;
mod scores;
mod table;

pub use ids::*;
pub use manager::*;
pub use month::*;
pub use scores::*;
pub use table::*;
