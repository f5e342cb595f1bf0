//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::config::ScanSettings;
use crate::probe::ProbeResult;
use crate::runner::RunSummary;
use crate::types::ScanTarget;
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// One line describing an active server.
pub fn server_line(result: &ProbeResult) -> String {
    format!(
        "{}:{} - players {}/{}, version {} (protocol {}, {:.0} ms)",
        result.host,
        result.port,
        result.online_count,
        result.max_players,
        truncate_string(&result.version, 40),
        result.protocol_id,
        result.latency_ms
    )
}

/// Print the run parameters before scanning begins.
pub fn print_scan_header(settings: &ScanSettings, target: &ScanTarget) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("mcportscan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {}",
        style("•").dim(),
        style(target).white().bold()
    );
    println!(
        "{} Ports: {} ({} ports)",
        style("•").dim(),
        style(settings.range).yellow(),
        settings.range.len()
    );
    println!(
        "{} Workers: {}, batch size: {}, delay: {:.1}s, timeout: {}ms",
        style("•").dim(),
        settings.workers,
        settings.batch_size,
        settings.delay.as_secs_f64(),
        settings.timeout.as_millis()
    );
    println!(
        "{} Results: {}",
        style("•").dim(),
        settings.output.display()
    );
    println!();
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                    {}", style("Scan Complete").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;
    writeln!(out, "  {} {}", style("Target:").bold(), summary.target)?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(
        out,
        "  {} {} ports ({}) in {} batches, {:.2}s",
        style("Scanned:").bold(),
        summary.ports_scanned,
        summary.range,
        summary.batches,
        summary.duration.as_secs_f64()
    )?;
    writeln!(
        out,
        "  {} {} active, {} unresponsive",
        style("Servers:").bold(),
        style(summary.active_servers).green().bold(),
        style(summary.unresponsive).dim()
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Results:").bold(),
        summary.output.display()
    )?;
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum number of characters, adding ellipsis.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
