//! # mcportscan - Batch Game Server Discovery
//!
//! mcportscan probes every port in a range of a single host with a status
//! query and records the ports that answer like a game server.
//!
//! ## Features
//!
//! - **Batched scanning**: fixed-size batches with a completion barrier, so
//!   progress and persistence happen at well-defined points
//! - **Bounded concurrency**: a capped worker pool per batch
//! - **Incremental persistence**: results are appended to CSV after every batch
//! - **Layered configuration**: settings file, CLI flags, interactive prompts
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use mcportscan::config::ScanSettings;
//! use mcportscan::probe::SlpProbe;
//! use mcportscan::progress::ConsoleReporter;
//! use mcportscan::runner::RunController;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = ScanSettings::default();
//!     let reporter = ConsoleReporter::new(settings.range.len(), false, false);
//!     let summary = RunController::new(settings, Arc::new(SlpProbe::default()), reporter)
//!         .run()
//!         .await
//!         .unwrap();
//!
//!     println!("{} active servers", summary.active_servers);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, ranges, batches and the scan target
//! - [`probe`] - The `StatusProbe` trait and the server list ping client
//! - [`scanner`] - Batch scheduler and shared scan counters
//! - [`sink`] - Thread-safe result queue flushed to storage
//! - [`storage`] - The CSV results file
//! - [`progress`] - Progress reporting
//! - [`runner`] - Run orchestration
//! - [`config`] - Settings file, defaults and prompts
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod scanner;
pub mod sink;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{ConfigError, ProbeError, RunError, SinkError};
pub use probe::{ProbeFailure, ProbeResult, StatusProbe};
pub use runner::{RunController, RunSummary};
pub use types::{BatchDescriptor, Port, PortRange, ScanTarget};
