use anyhow::Context;
use clap::Parser;
use mcportscan::cli::Cli;
use mcportscan::config::{prompt, AppSettings};
use mcportscan::probe::{SlpProbe, StatusProbe};
use mcportscan::progress::ConsoleReporter;
use mcportscan::runner::RunController;
use mcportscan::{logging, output};
use std::sync::Arc;
use tracing::warn;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut raw = load_settings(&cli);
    cli.apply(&mut raw);

    if cli.interactive {
        prompt::collect(&mut raw);
    }

    if cli.save_settings {
        match raw.save() {
            Ok(path) => output::print_success(&format!("Settings saved to {}", path.display())),
            Err(e) => output::print_warning(&format!("could not save settings: {}", e)),
        }
    }

    let (settings, issues) = raw.resolve();
    for issue in &issues {
        warn!("{}", issue);
        output::print_warning(&format!("{}; using the default", issue));
    }

    let probe: Arc<dyn StatusProbe> = Arc::new(SlpProbe::new(settings.protocol_version));
    let reporter = ConsoleReporter::new(settings.range.len(), cli.verbose, cli.quiet);
    RunController::new(settings, probe, reporter)
        .run()
        .await
        .context("scan aborted")?;
    Ok(())
}

/// Settings file contents, or defaults when it cannot be used.
fn load_settings(cli: &Cli) -> AppSettings {
    let loaded = match &cli.config {
        Some(path) => {
            output::print_info(&format!("Using settings from {}", path.display()));
            AppSettings::load_from(path)
        }
        None => AppSettings::load(),
    };

    loaded.unwrap_or_else(|e| {
        warn!("{}", e);
        output::print_warning(&format!("{}; using built-in defaults", e));
        AppSettings::default()
    })
}
