//! Top-level orchestration of a scan run.
//!
//! A run resolves the target, replaces any previous results file, then
//! walks the port range batch by batch: probe the batch, flush the sink,
//! report, pause. Batches never overlap. A storage failure ends the run;
//! probe failures never do.

use crate::config::ScanSettings;
use crate::error::{RunError, RunResult};
use crate::probe::{ProbeResult, StatusProbe};
use crate::progress::Reporter;
use crate::scanner::{BatchScheduler, ScanState};
use crate::sink::ResultSink;
use crate::storage;
use crate::types::{PortRange, ScanTarget};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Totals of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The host as configured, with the address that was actually scanned.
    pub target: ScanTarget,
    pub range: PortRange,
    pub ports_scanned: usize,
    /// Servers persisted across all batches.
    pub active_servers: usize,
    pub unresponsive: usize,
    pub batches: usize,
    pub output: PathBuf,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
}

/// Drives one scan from start to finish.
pub struct RunController<P: ?Sized, R> {
    settings: ScanSettings,
    probe: Arc<P>,
    reporter: R,
}

impl<P, R> RunController<P, R>
where
    P: StatusProbe + ?Sized + 'static,
    R: Reporter,
{
    pub fn new(settings: ScanSettings, probe: Arc<P>, reporter: R) -> Self {
        Self {
            settings,
            probe,
            reporter,
        }
    }

    /// Execute the whole run, writing results to the configured CSV file.
    pub async fn run(self) -> RunResult<RunSummary> {
        self.run_with(ResultSink::<File>::create).await
    }

    /// Execute the whole run with results going to the sink built by `open`.
    ///
    /// The host is resolved before the previous results file is touched,
    /// so an unresolvable target leaves it intact.
    pub async fn run_with<W, F>(mut self, open: F) -> RunResult<RunSummary>
    where
        W: Write + Send + 'static,
        F: FnOnce(&Path) -> io::Result<ResultSink<W>>,
    {
        let started_at = Local::now();
        let clock = Instant::now();
        let settings = self.settings.clone();
        let range = settings.range;
        let output_error = |source: io::Error| RunError::Output {
            path: settings.output.clone(),
            source,
        };

        let target = ScanTarget::resolve(&settings.host).await?;

        storage::discard_previous(&settings.output).map_err(output_error)?;
        let sink = Arc::new(open(&settings.output).map_err(output_error)?);

        info!(
            target = %target,
            range = %range,
            workers = settings.workers,
            batch_size = settings.batch_size,
            "starting scan"
        );
        self.reporter.scan_started(&settings, &target);

        let scheduler = BatchScheduler::new(
            Arc::clone(&self.probe),
            target,
            settings.workers,
            settings.timeout,
        );
        let state = Arc::new(ScanState::new());
        let total = range.len();

        // Owned by this task alone and only touched between batches.
        let mut newly_active: Vec<ProbeResult> = Vec::new();
        let mut active_servers = 0;
        let mut batches = 0;

        for batch in range.batches(settings.batch_size) {
            self.reporter.batch_started(&batch);

            let outcome = scheduler.run_batch(batch, &state, &sink).await;

            let report = sink.flush().await.map_err(|e| {
                error!(batch = %batch, "cannot write results: {}", e);
                RunError::from(e)
            })?;
            newly_active.extend(report.written);
            active_servers += newly_active.len();
            batches += 1;

            self.reporter.render(state.scanned(), total, &newly_active);
            self.reporter.failures(&outcome.failures);

            if batch.end < range.end() {
                self.reporter.waiting(settings.delay);
                if !settings.delay.is_zero() {
                    tokio::time::sleep(settings.delay).await;
                }
            }
            newly_active.clear();
        }

        let summary = RunSummary {
            target: scheduler.target().clone(),
            range,
            ports_scanned: state.scanned(),
            active_servers,
            unresponsive: state.failed(),
            batches,
            output: settings.output.clone(),
            started_at,
            duration: clock.elapsed(),
        };
        debug_assert_eq!(summary.ports_scanned, total);
        info!(
            scanned = summary.ports_scanned,
            active = summary.active_servers,
            output = %summary.output.display(),
            "scan finished"
        );
        debug!(elapsed_ms = summary.duration.as_millis() as u64, batches, "run timing");

        self.reporter.finish(&summary);
        Ok(summary)
    }
}
