//! Logger setup.
//!
//! Builds on `env_logger` with two output modes: colored human-readable
//! lines for interactive use, and one JSON object per line for log
//! aggregation. `RUST_LOG` still works and takes precedence over the
//! configured level.

use colored::Colorize;
use log::{Level, LevelFilter};
use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Initializes the global logger.
///
/// Noisy dependencies are pinned to warn-or-worse so hop-by-hop debug
/// output stays readable. Calling this a second time in one process
/// returns an error, since the global logger can only be claimed once.
///
/// # Arguments
/// * `level` - Verbosity applied to this crate's own modules.
/// * `format` - Plain colored lines or JSON lines.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Error);
    builder.filter_module("reqwest", LevelFilter::Warn);
    builder.filter_module("hyper_util", LevelFilter::Warn);
    builder.filter_module("chromiumoxide", LevelFilter::Warn);
    builder.filter_module("hopcheck", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".to_string())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level_str = match record.level() {
                    Level::Error => "ERROR".red().bold(),
                    Level::Warn => "WARN ".yellow().bold(),
                    Level::Info => "INFO ".green(),
                    Level::Debug => "DEBUG".blue(),
                    Level::Trace => "TRACE".magenta(),
                };
                let emoji = match record.level() {
                    Level::Error => "❌",
                    Level::Warn => "⚠️",
                    Level::Info => "✔️",
                    Level::Debug => "🔍",
                    Level::Trace => "🔬",
                };
                writeln!(
                    buf,
                    "[{} {} {}] {} {}",
                    buf.timestamp(),
                    level_str,
                    record.target(),
                    emoji,
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}
