//! Progress reporting for batch runs.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Logs one progress line with throughput.
///
/// `total_seeds` of zero means the total is unknown, as when seeds stream
/// in from stdin.
pub fn log_progress(
    start_time: Instant,
    completed: &AtomicUsize,
    failed: &AtomicUsize,
    total_seeds: usize,
) {
    let completed_count = completed.load(Ordering::SeqCst);
    let failed_count = failed.load(Ordering::SeqCst);
    let elapsed = start_time.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        completed_count as f64 / elapsed
    } else {
        0.0
    };

    if total_seeds > 0 {
        info!(
            "Resolved {}/{} URLs ({} failed, {:.1}/s)",
            completed_count, total_seeds, failed_count, rate
        );
    } else {
        info!(
            "Resolved {} URLs ({} failed, {:.1}/s)",
            completed_count, failed_count, rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_handles_zero_elapsed_and_zero_total() {
        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        log_progress(Instant::now(), &completed, &failed, 0);
    }

    #[test]
    fn test_log_progress_with_counts() {
        let completed = AtomicUsize::new(7);
        let failed = AtomicUsize::new(2);
        log_progress(Instant::now(), &completed, &failed, 10);
    }
}
