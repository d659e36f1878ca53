//! Error types and outcome statistics.

mod stats;
mod types;

pub use stats::ProcessingStats;
pub use types::{ErrorType, InfoType, InitializationError, ResolveError, WarningType};
