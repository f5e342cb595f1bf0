//! Interactive collection of scan settings.
//!
//! Each question shows the current value in brackets. An empty answer keeps
//! it; an answer that does not parse or validate is reported and the
//! current value is kept as well.

use super::AppSettings;
use crate::error::ConfigError;
use crate::output;
use console::style;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tracing::warn;

/// Ask for the run settings on the terminal.
pub fn collect(settings: &mut AppSettings) {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut term = console::Term::stdout();

    if let Err(e) = collect_from(&mut input, &mut term, settings) {
        warn!("stopped reading answers: {}", e);
        output::print_warning("could not read input; keeping the remaining defaults");
    }
}

/// Ask every question on `out`, reading answers from `input`.
///
/// Only I/O errors are returned; invalid answers are warned about on `out`
/// and replaced by the value shown in brackets.
pub fn collect_from<R, W>(
    input: &mut R,
    out: &mut W,
    settings: &mut AppSettings,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    settings.start_port = ask(input, out, "start port", settings.start_port, nonzero_port)?;
    writeln!(out, "start port: {}", settings.start_port)?;

    let start = settings.start_port;
    settings.end_port = ask(input, out, "end port", settings.end_port, |p: &u16| {
        if *p < start {
            Err(format!("must not be below the start port {}", start))
        } else {
            Ok(())
        }
    })?;
    writeln!(out, "end port: {}", settings.end_port)?;

    let delay = settings.delay_secs;
    settings.delay_secs = ask(input, out, "delay between batches (s)", delay, seconds)?;
    writeln!(out, "delay: {} s", settings.delay_secs)?;

    settings.workers = ask(input, out, "worker count", settings.workers, at_least_one)?;
    writeln!(
        out,
        "workers and batch size: {}",
        settings.batch_size.unwrap_or(settings.workers)
    )?;

    Ok(())
}

fn nonzero_port(port: &u16) -> Result<(), String> {
    if *port == 0 {
        Err("port 0 is not scannable".to_string())
    } else {
        Ok(())
    }
}

fn seconds(delay: &f64) -> Result<(), String> {
    if delay.is_finite() && *delay >= 0.0 {
        Ok(())
    } else {
        Err("must be a non-negative number".to_string())
    }
}

fn at_least_one(count: &usize) -> Result<(), String> {
    if *count == 0 {
        Err("must be at least 1".to_string())
    } else {
        Ok(())
    }
}

fn ask<R, W, T, F>(
    input: &mut R,
    out: &mut W,
    field: &'static str,
    current: T,
    check: F,
) -> io::Result<T>
where
    R: BufRead,
    W: Write,
    T: FromStr + ToString + Copy,
    F: Fn(&T) -> Result<(), String>,
{
    write!(out, "{} [{}]: ", style(field).bold(), current.to_string())?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }

    match parse_answer(field, &line, current, check) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("{}", e);
            let warning = style("Warning:").yellow().bold();
            writeln!(out, "{} {}; using {}", warning, e, current.to_string())?;
            Ok(current)
        }
    }
}

/// Interpret one answer. Blank input keeps `current`.
pub fn parse_answer<T, F>(
    field: &'static str,
    input: &str,
    current: T,
    check: F,
) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&T) -> Result<(), String>,
{
    let input = input.trim();
    if input.is_empty() {
        return Ok(current);
    }

    let value: T = input
        .parse()
        .map_err(|_| ConfigError::invalid(field, input, "not a valid number"))?;
    check(&value).map_err(|reason| ConfigError::invalid(field, input, reason))?;
    Ok(value)
}
