//! Configuration types for the resolver.
//!
//! These types carry everything the library needs to run: the input to
//! resolve, probe behavior, concurrency, logging, and output routing. The
//! CLI layer in `main.rs` builds a [`Config`] from parsed arguments; tests
//! and embedders can construct one directly.

use clap::ValueEnum;
use std::path::PathBuf;

use crate::config::constants::{MAX_REDIRECT_HOPS, SEMAPHORE_LIMIT};

/// Log verbosity levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// Everything, including per-hop resolution detail.
    Debug,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Log output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable colored output.
    Plain,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// HTTP method used for redirect-hop probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProbeMethod {
    /// Lightweight probe that fetches headers only. Falls back to GET when
    /// a server rejects or mishandles it.
    Head,
    /// Full fetch. Required for content-redirect detection, since HEAD
    /// responses carry no body to scan.
    Get,
}

/// How a chain is dereferenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Plain HTTP probes plus HTML source scanning. No browser involved.
    Static,
    /// Drive a real browser and observe the navigations it performs.
    /// Catches redirects that only fire under script execution.
    Rendered,
}

/// When the process should exit non-zero after a batch run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    /// Always exit zero, regardless of per-URL failures.
    Never,
    /// Exit non-zero if any URL failed to resolve.
    Any,
    /// Exit non-zero if the failure percentage crosses the configured
    /// threshold.
    Pct,
}

/// Runtime configuration assembled by the CLI layer.
///
/// Plain data with no clap dependencies, so library callers and tests can
/// build one without going through argument parsing.
#[derive(Clone, Debug)]
pub struct Config {
    /// A URL to resolve directly, or a path to a seed-list file
    /// (`-` reads the list from stdin).
    pub input: String,
    /// Probe method for redirect hops.
    pub method: ProbeMethod,
    /// Ceiling on followed redirects per chain.
    pub max_redirects: usize,
    /// Resolution strategy.
    pub strategy: Strategy,
    /// Maximum concurrent resolutions in batch mode.
    pub max_concurrency: usize,
    /// Wall-clock budget per URL, in seconds.
    pub timeout_seconds: u64,
    /// User-Agent header sent with every probe.
    pub user_agent: String,
    /// Where results are written. `None` means stdout.
    pub output: Option<PathBuf>,
    /// Exit-code policy for batch runs.
    pub fail_on: FailOn,
    /// Failure percentage (0 to 100) that trips [`FailOn::Pct`].
    pub fail_on_pct_threshold: u8,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: String::new(),
            method: ProbeMethod::Head,
            max_redirects: MAX_REDIRECT_HOPS,
            strategy: Strategy::Static,
            max_concurrency: SEMAPHORE_LIMIT,
            timeout_seconds: crate::config::constants::RESOLVE_TIMEOUT.as_secs(),
            user_agent: crate::config::constants::DEFAULT_USER_AGENT.to_string(),
            output: None,
            fail_on: FailOn::Never,
            fail_on_pct_threshold: 10,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
