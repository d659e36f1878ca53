//! Lock-free counters for resolution outcomes.
//!
//! One [`ProcessingStats`] instance is shared across all worker tasks in a
//! run. Every category key is inserted up front, so incrementing never
//! allocates and never contends on a lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use crate::error_handling::types::{ErrorType, InfoType, WarningType};

/// Counters for errors, warnings, and notable outcomes observed in a run.
#[derive(Debug)]
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    warnings: HashMap<WarningType, AtomicUsize>,
    info: HashMap<InfoType, AtomicUsize>,
}

impl ProcessingStats {
    /// Creates a stats instance with every category preinitialized to zero.
    pub fn new() -> Self {
        ProcessingStats {
            errors: ErrorType::iter().map(|e| (e, AtomicUsize::new(0))).collect(),
            warnings: WarningType::iter().map(|w| (w, AtomicUsize::new(0))).collect(),
            info: InfoType::iter().map(|i| (i, AtomicUsize::new(0))).collect(),
        }
    }

    /// Increments the counter for an error category.
    pub fn increment_error(&self, error_type: ErrorType) {
        if let Some(counter) = self.errors.get(&error_type) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!("Missing error counter for {:?}", error_type);
        }
    }

    /// Increments the counter for a warning category.
    pub fn increment_warning(&self, warning_type: WarningType) {
        if let Some(counter) = self.warnings.get(&warning_type) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!("Missing warning counter for {:?}", warning_type);
        }
    }

    /// Increments the counter for an informational category.
    pub fn increment_info(&self, info_type: InfoType) {
        if let Some(counter) = self.info.get(&info_type) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!("Missing info counter for {:?}", info_type);
        }
    }

    /// Current count for an error category.
    pub fn get_error_count(&self, error_type: ErrorType) -> usize {
        self.errors
            .get(&error_type)
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    /// Current count for a warning category.
    pub fn get_warning_count(&self, warning_type: WarningType) -> usize {
        self.warnings
            .get(&warning_type)
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    /// Current count for an informational category.
    pub fn get_info_count(&self, info_type: InfoType) -> usize {
        self.info
            .get(&info_type)
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    /// Sum across all error categories.
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Sum across all warning categories.
    pub fn total_warnings(&self) -> usize {
        self.warnings.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Sum across all informational categories.
    pub fn total_info(&self) -> usize {
        self.info.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
