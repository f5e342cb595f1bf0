//! CSV results file.
//!
//! A run starts by deleting whatever a previous run left at the output
//! path; afterwards the file is only ever appended to.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::info;

/// Column order of the results file.
pub const COLUMNS: [&str; 7] = [
    "server_address",
    "server_port",
    "online_count",
    "max_players",
    "version",
    "protocol",
    "latency",
];

/// Remove a previous run's output. Returns whether a file was removed.
pub fn discard_previous(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed previous results file");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Open the results file for appending, creating it (and its parent
/// directory) if needed.
pub fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new().create(true).append(true).open(path)
}
