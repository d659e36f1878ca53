//! Command-line entry point.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use hopcheck::app::statistics::print_run_summary;
use hopcheck::config::constants::{
    DEFAULT_USER_AGENT, MAX_REDIRECT_HOPS, RESOLVE_TIMEOUT, SEMAPHORE_LIMIT,
};
use hopcheck::initialization::init_logger_with;
use hopcheck::{input_is_url, Config, FailOn, LogFormat, LogLevel, ProbeMethod, RunReport, Strategy};

/// Resolve full redirect chains for URLs.
#[derive(Debug, Parser)]
#[command(name = "hopcheck", version, about)]
struct Cli {
    /// URL to resolve, or path to a seed-list file (use "-" for stdin)
    input: String,

    /// HTTP method for redirect-hop probes
    #[arg(long, value_enum, default_value_t = ProbeMethod::Head)]
    method: ProbeMethod,

    /// Maximum redirects to follow per chain
    #[arg(long, default_value_t = MAX_REDIRECT_HOPS)]
    max_redirects: usize,

    /// Resolution strategy
    #[arg(long, value_enum, default_value_t = Strategy::Static)]
    strategy: Strategy,

    /// Concurrent resolutions in batch mode (env: HOPCHECK_MAX_CONCURRENCY)
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Per-URL wall-clock budget in seconds (env: HOPCHECK_TIMEOUT_SECONDS)
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// User-Agent header override (env: HOPCHECK_USER_AGENT)
    #[arg(long)]
    user_agent: Option<String>,

    /// Write results here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// When to exit non-zero after a batch run
    #[arg(long, value_enum, default_value_t = FailOn::Never)]
    fail_on: FailOn,

    /// Failure percentage that trips --fail-on pct
    #[arg(long, default_value_t = 10)]
    fail_on_pct_threshold: u8,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> Config {
        let max_concurrency = self
            .max_concurrency
            .or_else(|| env_parsed("HOPCHECK_MAX_CONCURRENCY"))
            .unwrap_or(SEMAPHORE_LIMIT);
        let timeout_seconds = self
            .timeout_seconds
            .or_else(|| env_parsed("HOPCHECK_TIMEOUT_SECONDS"))
            .unwrap_or(RESOLVE_TIMEOUT.as_secs());
        let user_agent = self
            .user_agent
            .or_else(|| std::env::var("HOPCHECK_USER_AGENT").ok())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Config {
            input: self.input,
            method: self.method,
            max_redirects: self.max_redirects,
            strategy: self.strategy,
            max_concurrency,
            timeout_seconds,
            user_agent,
            output: self.output,
            fail_on: self.fail_on,
            fail_on_pct_threshold: self.fail_on_pct_threshold,
            log_level: self.log_level,
            log_format: self.log_format,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

/// Loads `.env` from the working directory, falling back to the
/// executable's directory.
fn load_env() {
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

fn should_exit_nonzero(report: &RunReport, single: bool, fail_on: FailOn, threshold: u8) -> bool {
    if single {
        return report.failed > 0;
    }
    match fail_on {
        FailOn::Never => false,
        FailOn::Any => report.failed > 0,
        FailOn::Pct => {
            if report.failed == 0 || report.total == 0 {
                return false;
            }
            report.failed * 100 >= report.total * threshold as usize
        }
    }
}

#[tokio::main]
async fn main() {
    load_env();
    let config = Cli::parse().into_config();

    if let Err(e) = init_logger_with(config.log_level.into(), config.log_format) {
        eprintln!("Failed to initialize logger: {e}");
        process::exit(1);
    }

    let single = input_is_url(&config.input);
    let fail_on = config.fail_on;
    let threshold = config.fail_on_pct_threshold;

    match hopcheck::run(config).await {
        Ok(report) => {
            print_run_summary(&report);
            if should_exit_nonzero(&report, single, fail_on, threshold) {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}
