//! Batch scanning engine.
//!
//! A run is a strictly ordered sequence of batches. Within a batch, probes
//! run concurrently on a bounded worker pool and may finish in any order;
//! the scheduler joins all of them before the next batch is considered.

mod batch;
mod state;

pub use batch::{BatchOutcome, BatchScheduler};
pub use state::ScanState;
