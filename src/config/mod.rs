//! Configuration management for mcportscan.
//!
//! Settings are layered: built-in defaults, then the settings file, then
//! command-line flags, then interactive answers. Validation happens last
//! and never fails; bad values are replaced by defaults.

pub mod prompt;
mod settings;

pub use settings::{
    AppSettings, Paths, ScanSettings, DEFAULT_DELAY_SECS, DEFAULT_END_PORT, DEFAULT_HOST,
    DEFAULT_OUTPUT, DEFAULT_START_PORT, DEFAULT_TIMEOUT_MS, DEFAULT_WORKERS,
};
