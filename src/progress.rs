//! Progress reporting.
//!
//! The controller drives a [`Reporter`] through one cycle per batch:
//! `batch_started` (Scanning), `render` (Reporting, then back to Idle),
//! and `waiting` while it sleeps before the next batch. Reporting is purely
//! observational and never fails; when the terminal cannot host a progress
//! bar the console reporter falls back to plain lines.

use crate::config::ScanSettings;
use crate::output;
use crate::probe::{ProbeFailure, ProbeResult};
use crate::runner::RunSummary;
use crate::types::{BatchDescriptor, ScanTarget};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

/// Receives scan progress from the run controller.
pub trait Reporter: Send {
    /// The target was resolved and the results file is ready.
    fn scan_started(&mut self, _settings: &ScanSettings, _target: &ScanTarget) {}

    /// A batch is about to be probed.
    fn batch_started(&mut self, _batch: &BatchDescriptor) {}

    /// A batch finished and its results were flushed.
    ///
    /// `newly_active` holds only the servers persisted for this batch.
    fn render(&mut self, scanned: usize, total: usize, newly_active: &[ProbeResult]);

    /// Ports of the finished batch that gave no result.
    ///
    /// Purely informational; a run never stops because of them.
    fn failures(&mut self, _failures: &[ProbeFailure]) {}

    /// The controller is pausing before the next batch.
    fn waiting(&mut self, _delay: Duration) {}

    /// The run is over.
    fn finish(&mut self, _summary: &RunSummary) {}
}

/// Where the console reporter currently is within a batch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Scanning,
    Reporting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Progress bar pinned below printed lines.
    Bar,
    /// One status line per batch, for pipes and dumb terminals.
    Lines,
    /// Only the final summary.
    Quiet,
}

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Reporter writing to the terminal.
pub struct ConsoleReporter {
    bar: ProgressBar,
    /// Destination of the `Lines` layout.
    out: Box<dyn Write + Send>,
    layout: Layout,
    state: ReporterState,
    verbose: bool,
    current: Option<BatchDescriptor>,
}

impl ConsoleReporter {
    /// Create a reporter for a run of `total` ports.
    pub fn new(total: usize, verbose: bool, quiet: bool) -> Self {
        let layout = if quiet {
            Layout::Quiet
        } else if Term::stdout().size_checked().is_some() {
            Layout::Bar
        } else {
            Layout::Lines
        };

        let bar = match layout {
            Layout::Bar => {
                let style = ProgressStyle::with_template(BAR_TEMPLATE)
                    .map(|s| s.progress_chars("=>-"))
                    .unwrap_or_else(|e| {
                        debug!("falling back to default bar style: {}", e);
                        ProgressStyle::default_bar()
                    });
                ProgressBar::new(total as u64).with_style(style)
            }
            Layout::Lines | Layout::Quiet => ProgressBar::hidden(),
        };

        Self {
            bar,
            out: Box::new(io::stdout()),
            layout,
            state: ReporterState::Idle,
            verbose,
            current: None,
        }
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    fn line(&mut self, msg: impl AsRef<str>) {
        match self.layout {
            Layout::Bar => self.bar.println(msg),
            Layout::Lines => {
                if let Err(e) = writeln!(self.out, "{}", msg.as_ref()) {
                    debug!("could not write progress line: {}", e);
                }
            }
            Layout::Quiet => {}
        }
    }

    fn batch_label(&self) -> String {
        self.current
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

impl Reporter for ConsoleReporter {
    fn scan_started(&mut self, settings: &ScanSettings, target: &ScanTarget) {
        if self.layout != Layout::Quiet {
            output::print_scan_header(settings, target);
        }
    }

    fn batch_started(&mut self, batch: &BatchDescriptor) {
        self.state = ReporterState::Scanning;
        self.current = Some(*batch);
        self.bar.set_message(format!("batch {}", batch));
    }

    fn render(&mut self, scanned: usize, total: usize, newly_active: &[ProbeResult]) {
        self.state = ReporterState::Reporting;
        self.bar.set_position(scanned as u64);

        let batch = self.batch_label();

        if self.layout == Layout::Lines {
            let percent = if total == 0 {
                100.0
            } else {
                scanned as f64 * 100.0 / total as f64
            };
            self.line(format!(
                "progress: {}/{} ({:.1}%), batch {}, {} active",
                scanned,
                total,
                percent,
                batch,
                newly_active.len()
            ));
        }

        if newly_active.is_empty() {
            self.bar.set_message(format!("batch {}: no active servers", batch));
        } else {
            self.line(format!("{}", style("Found active servers:").green().bold()));
            for result in newly_active {
                self.line(format!("  {}", output::server_line(result)));
            }
            self.bar.set_message(format!(
                "batch {}: {} active servers",
                batch,
                newly_active.len()
            ));
        }

        self.state = ReporterState::Idle;
    }

    fn failures(&mut self, failures: &[ProbeFailure]) {
        if failures.is_empty() {
            return;
        }

        let batch = self.batch_label();
        debug!(batch = %batch, count = failures.len(), "ports unresponsive");

        if self.verbose {
            for failure in failures {
                self.line(format!("{}", style(failure).dim()));
            }
        } else {
            self.line(format!(
                "{}",
                style(format!("{} ports unresponsive in batch {}", failures.len(), batch)).dim()
            ));
        }
    }

    fn waiting(&mut self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let msg = format!("waiting {:.1}s before next batch", delay.as_secs_f64());
        if self.layout == Layout::Lines {
            self.line(&msg);
        }
        self.bar.set_message(msg);
    }

    fn finish(&mut self, summary: &RunSummary) {
        self.bar.finish_and_clear();
        self.state = ReporterState::Idle;

        if let Err(e) = output::print_summary(summary) {
            debug!("could not print summary: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::types::{Port, PortRange};
    use std::sync::{Arc, Mutex};

    /// Cloneable in-memory writer standing in for stdout.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines_reporter(verbose: bool) -> (ConsoleReporter, Captured) {
        let captured = Captured::default();
        let reporter = ConsoleReporter {
            bar: ProgressBar::hidden(),
            out: Box::new(captured.clone()),
            layout: Layout::Lines,
            state: ReporterState::Idle,
            verbose,
            current: None,
        };
        (reporter, captured)
    }

    fn refused(port: u16) -> ProbeFailure {
        ProbeFailure {
            host: "127.0.0.1".to_string(),
            port: Port::new(port).unwrap(),
            reason: ProbeError::ConnectionRefused,
        }
    }

    fn first_batch() -> BatchDescriptor {
        PortRange::from_bounds(25565, 25567)
            .unwrap()
            .batches(3)
            .next()
            .unwrap()
    }

    #[test]
    fn test_state_cycle() {
        let mut reporter = ConsoleReporter::new(20, true, true);
        assert_eq!(reporter.layout, Layout::Quiet);
        assert_eq!(reporter.state(), ReporterState::Idle);

        let batch = PortRange::from_bounds(100, 119)
            .unwrap()
            .batches(10)
            .next()
            .unwrap();
        reporter.batch_started(&batch);
        assert_eq!(reporter.state(), ReporterState::Scanning);

        reporter.render(10, 20, &[]);
        assert_eq!(reporter.state(), ReporterState::Idle);
    }

    #[test]
    fn test_render_without_terminal_does_not_panic() {
        let mut reporter = ConsoleReporter::new(3, true, false);
        let result = ProbeResult {
            host: "127.0.0.1".to_string(),
            port: Port::new(25566).unwrap(),
            online_count: 5,
            max_players: 20,
            version: "1.20.1".to_string(),
            protocol_id: 763,
            latency_ms: 42.0,
        };

        // Works the same before any batch has started.
        reporter.render(0, 0, &[]);
        reporter.render(2, 3, &[result]);
        reporter.failures(&[refused(25565)]);
        reporter.waiting(Duration::from_secs(1));
        assert_eq!(reporter.state(), ReporterState::Idle);
    }

    #[test]
    fn test_unresponsive_ports_summarized_per_batch() {
        let (mut reporter, captured) = lines_reporter(false);
        reporter.batch_started(&first_batch());
        reporter.render(3, 3, &[]);
        reporter.failures(&[refused(25565), refused(25567)]);

        let text = captured.text();
        assert!(text.contains("2 ports unresponsive in batch 25565-25567"));
        assert!(!text.contains("did not respond"));
    }

    #[test]
    fn test_verbose_lists_each_unresponsive_port() {
        let (mut reporter, captured) = lines_reporter(true);
        reporter.batch_started(&first_batch());
        reporter.failures(&[refused(25565), refused(25567)]);
        reporter.failures(&[]);

        let text = captured.text();
        assert!(text.contains("127.0.0.1:25565 did not respond"));
        assert!(text.contains("127.0.0.1:25567 did not respond"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_waiting_is_shown_without_a_bar() {
        let (mut reporter, captured) = lines_reporter(false);
        reporter.waiting(Duration::ZERO);
        assert!(captured.text().is_empty());

        reporter.waiting(Duration::from_millis(1500));
        assert_eq!(captured.text(), "waiting 1.5s before next batch\n");
    }
}
