// src/scan/stats.rs
// =============================================================================
// Counters for the end-of-run summary. Workers bump them with atomics.
// =============================================================================

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ScanStats {
    targets: AtomicUsize,
    with_csp: AtomicUsize,
    failed: AtomicUsize,
    emitted: AtomicUsize,
}

/// Point-in-time copy of ScanStats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub targets: usize,
    pub with_csp: usize,
    pub failed: usize,
    pub emitted: usize,
}

impl ScanStats {
    pub fn record_target(&self) {
        self.targets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_csp(&self) {
        self.with_csp.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self, count: usize) {
        self.emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            targets: self.targets.load(Ordering::Relaxed),
            with_csp: self.with_csp.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} target(s), {} with CSP, {} failed, {} domain(s) found",
            self.targets, self.with_csp, self.failed, self.emitted
        )
    }
}
