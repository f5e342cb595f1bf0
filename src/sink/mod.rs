//! Thread-safe result accumulator.
//!
//! Probe workers [`offer`](ResultSink::offer) results from any task without
//! blocking; the controller [`flush`](ResultSink::flush)es them into the
//! CSV file between batches. Results reporting the `"N/A"` version are
//! drained like any other but never written.

use crate::error::SinkResult;
use crate::probe::ProbeResult;
use crate::storage::{self, COLUMNS};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Rows produced by one [`ResultSink::flush`] call.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Results appended to storage, in drain order.
    pub written: Vec<ProbeResult>,
    /// Results drained but excluded by the version filter.
    pub discarded: usize,
}

struct SinkWriter<W: Write> {
    pending: mpsc::UnboundedReceiver<ProbeResult>,
    writer: csv::Writer<W>,
    header_written: bool,
}

/// Queue of pending results plus the single writer that persists them.
pub struct ResultSink<W: Write = File> {
    queue: mpsc::UnboundedSender<ProbeResult>,
    inner: Mutex<SinkWriter<W>>,
}

impl ResultSink<File> {
    /// Open `path` for appending. The header is written on the first flush.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::from_writer(storage::open_append(path)?))
    }
}

impl<W: Write> ResultSink<W> {
    /// Wrap an arbitrary writer.
    pub fn from_writer(writer: W) -> Self {
        let (queue, pending) = mpsc::unbounded_channel();
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        Self {
            queue,
            inner: Mutex::new(SinkWriter {
                pending,
                writer,
                header_written: false,
            }),
        }
    }

    /// Enqueue a result. Never blocks.
    pub fn offer(&self, result: ProbeResult) {
        // The receiver is owned by `self`, so the channel cannot be closed here.
        let _ = self.queue.send(result);
    }

    /// Drain every pending result into storage.
    ///
    /// Concurrent calls are serialized. The header row goes out on the
    /// first call only. Any write error is returned and should end the run.
    pub async fn flush(&self) -> SinkResult<FlushReport> {
        let mut guard = self.inner.lock().await;
        let sink = &mut *guard;

        if !sink.header_written {
            sink.writer.write_record(COLUMNS)?;
            sink.header_written = true;
        }

        let mut report = FlushReport::default();
        while let Ok(result) = sink.pending.try_recv() {
            if !result.is_reportable() {
                debug!(port = %result.port, "dropping result without version");
                report.discarded += 1;
                continue;
            }
            sink.writer.serialize(&result)?;
            report.written.push(result);
        }
        sink.writer.flush()?;

        debug!(
            written = report.written.len(),
            discarded = report.discarded,
            "flushed results"
        );
        Ok(report)
    }
}
