//! Application settings and paths.
//!
//! `AppSettings` is the raw, user-editable form (settings file, CLI flags,
//! prompts all write into it). `ScanSettings` is the validated form a run
//! consumes; converting between them replaces every bad value with its
//! documented default.

use crate::error::{ConfigError, ConfigResult};
use crate::probe::slp::DEFAULT_PROTOCOL_VERSION;
use crate::types::PortRange;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "play.simpfun.cn";
pub const DEFAULT_START_PORT: u16 = 10000;
pub const DEFAULT_END_PORT: u16 = 65533;
pub const DEFAULT_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_OUTPUT: &str = "simpfun_server_scan_results.csv";

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/mcportscan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform configuration directory.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "mcportscan", "mcportscan")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Raw scan settings, as stored in `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Host whose ports are probed.
    pub host: String,
    pub start_port: u16,
    pub end_port: u16,
    /// Pause between batches, in seconds.
    pub delay_secs: f64,
    /// Concurrent probes per batch.
    pub workers: usize,
    /// Ports per batch; follows `workers` when unset.
    pub batch_size: Option<usize>,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
    /// Protocol version announced in the handshake.
    pub protocol_version: i32,
    /// Results file.
    pub output: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            start_port: DEFAULT_START_PORT,
            end_port: DEFAULT_END_PORT,
            delay_secs: DEFAULT_DELAY_SECS,
            workers: DEFAULT_WORKERS,
            batch_size: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if none exist.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let paths = Paths::new()?;
        fs::create_dir_all(&paths.config_dir)?;

        let file = paths.settings_file();
        self.save_to(&file)?;
        Ok(file)
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate into [`ScanSettings`].
    ///
    /// Invalid values are replaced by their defaults; the problems found
    /// are returned so the caller can report them.
    pub fn resolve(&self) -> (ScanSettings, Vec<ConfigError>) {
        let mut issues = Vec::new();

        let host = match self.host.trim() {
            "" => {
                issues.push(ConfigError::invalid("host", &self.host, "must not be empty"));
                DEFAULT_HOST.to_string()
            }
            host => host.to_string(),
        };

        let range = PortRange::from_bounds(self.start_port, self.end_port).unwrap_or_else(|e| {
            issues.push(ConfigError::invalid(
                "port range",
                format!("{}-{}", self.start_port, self.end_port),
                e.to_string(),
            ));
            default_range()
        });

        let workers = if self.workers == 0 {
            issues.push(ConfigError::invalid("worker count", 0, "must be at least 1"));
            DEFAULT_WORKERS
        } else {
            self.workers
        };

        let batch_size = match self.batch_size {
            Some(0) => {
                issues.push(ConfigError::invalid("batch size", 0, "must be at least 1"));
                workers
            }
            Some(size) => size,
            None => workers,
        };

        let delay = Duration::try_from_secs_f64(self.delay_secs).unwrap_or_else(|_| {
            issues.push(ConfigError::invalid(
                "delay",
                self.delay_secs,
                "must be a non-negative number of seconds",
            ));
            Duration::from_secs_f64(DEFAULT_DELAY_SECS)
        });

        let timeout = if self.timeout_ms == 0 {
            issues.push(ConfigError::invalid("timeout", 0, "must be at least 1 ms"));
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.timeout_ms)
        };

        let output = if self.output.as_os_str().is_empty() {
            issues.push(ConfigError::invalid("output", "", "must not be empty"));
            PathBuf::from(DEFAULT_OUTPUT)
        } else {
            self.output.clone()
        };

        let settings = ScanSettings {
            host,
            range,
            delay,
            workers,
            batch_size,
            timeout,
            protocol_version: self.protocol_version,
            output,
        };
        (settings, issues)
    }
}

fn default_range() -> PortRange {
    PortRange::from_bounds(DEFAULT_START_PORT, DEFAULT_END_PORT)
        .unwrap_or_else(|_| unreachable!("default port range is valid"))
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub host: String,
    pub range: PortRange,
    /// Sleep between consecutive batches.
    pub delay: Duration,
    pub workers: usize,
    pub batch_size: usize,
    /// Upper bound for a single probe.
    pub timeout: Duration,
    pub protocol_version: i32,
    pub output: PathBuf,
}

impl Default for ScanSettings {
    fn default() -> Self {
        AppSettings::default().resolve().0
    }
}
