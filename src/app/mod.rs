//! Application-level helpers: seed validation, progress, and summaries.

pub mod logging;
pub mod statistics;
pub mod url;
