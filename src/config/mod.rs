//! Configuration: runtime settings and application-wide constants.

pub mod constants;
mod types;

pub use types::{Config, FailOn, LogFormat, LogLevel, ProbeMethod, Strategy};
