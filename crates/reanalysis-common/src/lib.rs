//! Common types and utilities shared across the reanalysis extraction crates.

pub mod bbox;
pub mod error;
pub mod station;
pub mod time;
pub mod variable;

pub use bbox::BoundingBox;
pub use error::{ExtractError, ExtractResult};
pub use station::Station;
pub use time::{ForecastCycle, ModelCycle, TimeRange};
pub use variable::{ArchiveKind, GlobalGroup, Variable, VariableKind};
