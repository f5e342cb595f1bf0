//! Counters shared between probe workers and the controller.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-run scan progress. Only these counters are touched from worker
/// tasks; everything else is owned by the controller.
#[derive(Debug, Default)]
pub struct ScanState {
    scanned: AtomicUsize,
    failed: AtomicUsize,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed probe, whatever its outcome.
    pub fn record_probe(&self, responded: bool) {
        if !responded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.scanned.fetch_add(1, Ordering::AcqRel);
    }

    /// Probes completed so far.
    pub fn scanned(&self) -> usize {
        self.scanned.load(Ordering::Acquire)
    }

    /// Probes that ended without a result.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}
