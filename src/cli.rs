//! Command-line interface definitions for mcportscan.
//!
//! Uses `clap` derive macros for declarative argument parsing. Every scan
//! option is optional here so that unset flags leave the settings file (or
//! the built-in defaults) in charge.

use crate::config::AppSettings;
use clap::Parser;
use std::path::PathBuf;

/// Discover game servers listening across a port range of one host.
///
/// Ports are probed in fixed-size batches with a bounded number of
/// concurrent workers. Responsive servers are appended to a CSV file after
/// every batch.
#[derive(Parser, Debug)]
#[command(name = "mcportscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch scanner for game server status endpoints", long_about = None)]
pub struct Cli {
    /// Host to scan
    #[arg(long, env = "MCPORTSCAN_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// First port of the range
    #[arg(short = 's', long, value_name = "PORT")]
    pub start_port: Option<u16>,

    /// Last port of the range (inclusive)
    #[arg(short = 'e', long, value_name = "PORT")]
    pub end_port: Option<u16>,

    /// Seconds to wait between batches
    #[arg(short = 'd', long, value_name = "SECONDS")]
    pub delay: Option<f64>,

    /// Number of concurrent probes (also the batch size unless --batch-size is given)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Number of ports per batch
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Per-probe timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Protocol version announced in the status handshake
    #[arg(long, value_name = "VERSION")]
    pub protocol_version: Option<i32>,

    /// CSV file receiving the results (replaced at start)
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Ask for start port, end port, delay and workers before scanning
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Path to a settings file to use instead of the default one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    pub save_settings: bool,

    /// Show debug logs and every unresponsive port
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Overlay the flags that were given onto `settings`.
    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.start_port {
            settings.start_port = port;
        }
        if let Some(port) = self.end_port {
            settings.end_port = port;
        }
        if let Some(delay) = self.delay {
            settings.delay_secs = delay;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(size) = self.batch_size {
            settings.batch_size = Some(size);
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_ms = timeout;
        }
        if let Some(version) = self.protocol_version {
            settings.protocol_version = version;
        }
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
    }
}
