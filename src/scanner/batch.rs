//! Execution of a single batch.
//!
//! One task is spawned per port of the batch; a semaphore caps how many of
//! them probe at once. `run_batch` returns only after every task has
//! finished, so no probe of the next batch can start early.

use super::state::ScanState;
use crate::probe::{ProbeFailure, StatusProbe};
use crate::sink::ResultSink;
use crate::types::{BatchDescriptor, ScanTarget};
use futures::future::join_all;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, trace};

/// What happened while probing one batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch: BatchDescriptor,
    /// Tasks that ran to completion (always `batch.len()`).
    pub probed: usize,
    /// Probes that produced a result, including ones later filtered out.
    pub responded: usize,
    /// Ports that produced no result.
    pub failures: Vec<ProbeFailure>,
    pub elapsed: Duration,
}

/// Runs batches against one target with a bounded number of workers.
pub struct BatchScheduler<P: ?Sized> {
    probe: Arc<P>,
    target: Arc<ScanTarget>,
    workers: usize,
    timeout: Duration,
}

impl<P> BatchScheduler<P>
where
    P: StatusProbe + ?Sized + 'static,
{
    /// Create a scheduler. `workers` is clamped to at least one.
    pub fn new(probe: Arc<P>, target: ScanTarget, workers: usize, timeout: Duration) -> Self {
        Self {
            probe,
            target: Arc::new(target),
            workers: workers.max(1),
            timeout,
        }
    }

    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    /// Probe every port of `batch` and wait for all of them.
    ///
    /// Each completed probe bumps `state` exactly once. Results go to
    /// `sink`; failures are collected in the outcome and never propagate.
    pub async fn run_batch<W>(
        &self,
        batch: BatchDescriptor,
        state: &Arc<ScanState>,
        sink: &Arc<ResultSink<W>>,
    ) -> BatchOutcome
    where
        W: Write + Send + 'static,
    {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let handles: Vec<_> = batch
            .ports()
            .map(|port| {
                let semaphore = Arc::clone(&semaphore);
                let probe = Arc::clone(&self.probe);
                let target = Arc::clone(&self.target);
                let state = Arc::clone(state);
                let sink = Arc::clone(sink);
                let limit = self.timeout;

                tokio::spawn(async move {
                    // The semaphore is never closed, so this only waits.
                    let _permit = semaphore.acquire().await.ok();

                    let outcome = probe.probe(&target, port, limit).await;
                    state.record_probe(outcome.is_ok());

                    match outcome {
                        Ok(result) => {
                            trace!(%port, version = %result.version, "port responded");
                            sink.offer(result);
                            None
                        }
                        Err(failure) => {
                            trace!(%port, reason = %failure.reason, "no response");
                            Some(failure)
                        }
                    }
                })
            })
            .collect();

        let mut outcome = BatchOutcome {
            batch,
            probed: 0,
            responded: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        };

        for joined in join_all(handles).await {
            outcome.probed += 1;
            match joined {
                Ok(None) => outcome.responded += 1,
                Ok(Some(failure)) => outcome.failures.push(failure),
                Err(e) => {
                    // The task died before it could count itself.
                    error!(batch = %batch, "probe task failed: {}", e);
                    state.record_probe(false);
                }
            }
        }

        outcome.elapsed = start.elapsed();
        debug!(
            batch = %batch,
            responded = outcome.responded,
            failed = outcome.failures.len(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "batch complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::ScriptedProbe;
    use crate::probe::ProbeResult;
    use crate::types::{Port, PortRange};
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn target() -> ScanTarget {
        ScanTarget::new("127.0.0.1", IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    fn scheduler<P: StatusProbe + 'static>(probe: Arc<P>, workers: usize) -> BatchScheduler<P> {
        BatchScheduler::new(probe, target(), workers, Duration::from_secs(1))
    }

    fn first_batch(start: u16, end: u16) -> BatchDescriptor {
        let range = PortRange::from_bounds(start, end).unwrap();
        range.batches(range.len()).next().unwrap()
    }

    fn memory_sink() -> Arc<ResultSink<Vec<u8>>> {
        Arc::new(ResultSink::from_writer(Vec::new()))
    }

    #[tokio::test]
    async fn test_every_port_probed_once() {
        let probe = Arc::new(
            ScriptedProbe::new()
                .with_server(10003, "1.20.1", 1, 10)
                .with_server(10007, "N/A", 0, 0),
        );
        let scheduler = scheduler(Arc::clone(&probe), 4);
        let state = Arc::new(ScanState::new());
        let sink = memory_sink();

        let batch = first_batch(10000, 10009);
        let outcome = scheduler.run_batch(batch, &state, &sink).await;

        assert_eq!(outcome.probed, 10);
        assert_eq!(outcome.responded, 2);
        assert_eq!(outcome.failures.len(), 8);
        assert_eq!(state.scanned(), 10);
        assert_eq!(state.failed(), 8);

        let mut calls = probe.calls.lock().unwrap().clone();
        calls.sort_unstable();
        assert_eq!(calls, (10000..=10009).collect::<Vec<_>>());

        let report = sink.flush().await.unwrap();
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.discarded, 1);
    }

    #[tokio::test]
    async fn test_short_final_batch() {
        let probe = Arc::new(ScriptedProbe::new());
        let scheduler = scheduler(Arc::clone(&probe), 10);
        let state = Arc::new(ScanState::new());
        let sink = memory_sink();

        let range = PortRange::from_bounds(20000, 20012).unwrap();
        for batch in range.batches(10) {
            let outcome = scheduler.run_batch(batch, &state, &sink).await;
            assert_eq!(outcome.probed, batch.len());
        }

        assert_eq!(state.scanned(), 13);
        assert_eq!(probe.calls.lock().unwrap().len(), 13);
    }

    /// Tracks the highest number of probes running at once.
    #[derive(Default)]
    struct GaugeProbe {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl StatusProbe for GaugeProbe {
        async fn probe(
            &self,
            target: &ScanTarget,
            port: Port,
            _timeout: Duration,
        ) -> Result<ProbeResult, ProbeFailure> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Err(ProbeFailure::new(target, port, crate::error::ProbeError::Timeout))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_capped_and_batch_is_a_barrier() {
        let probe = Arc::new(GaugeProbe::default());
        let scheduler = scheduler(Arc::clone(&probe), 3);
        let state = Arc::new(ScanState::new());
        let sink = memory_sink();

        let batch = first_batch(30000, 30011);
        let outcome = scheduler.run_batch(batch, &state, &sink).await;

        assert_eq!(outcome.failures.len(), 12);
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
        assert!(probe.peak.load(Ordering::SeqCst) >= 1);
        // Nothing is still running once the batch has returned.
        assert_eq!(probe.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(state.scanned(), 12);
    }

    #[test]
    fn test_workers_clamped() {
        let scheduler = scheduler(Arc::new(ScriptedProbe::new()), 0);
        assert_eq!(scheduler.workers, 1);
        assert_eq!(scheduler.target().host, "127.0.0.1");
    }
}
