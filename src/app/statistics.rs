//! Run summary output.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, InfoType, ProcessingStats, WarningType};
use crate::runner::RunReport;

/// Logs per-category outcome counts, skipping empty categories.
pub fn print_outcome_statistics(stats: &ProcessingStats) {
    if stats.total_errors() > 0 {
        info!("Error statistics:");
        for error_type in ErrorType::iter() {
            let count = stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if stats.total_warnings() > 0 {
        info!("Warning statistics:");
        for warning_type in WarningType::iter() {
            let count = stats.get_warning_count(warning_type);
            if count > 0 {
                info!("   {}: {}", warning_type.as_str(), count);
            }
        }
    }

    if stats.total_info() > 0 {
        info!("Chain statistics:");
        for info_type in InfoType::iter() {
            let count = stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}

/// Prints the one-line closing summary to stderr.
///
/// Goes to stderr so it never interleaves with JSONL results on stdout.
pub fn print_run_summary(report: &RunReport) {
    let plural = if report.total == 1 { "" } else { "s" };
    eprintln!(
        "✅ Processed {} URL{} ({} resolved, {} failed, {} skipped) in {:.1}s",
        report.total, plural, report.succeeded, report.failed, report.skipped, report.elapsed_seconds
    );
}
