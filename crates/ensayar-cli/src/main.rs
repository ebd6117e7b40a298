//! Ensayador: runnable entry point for the built-in E2E suite.
//!
//! ```bash
//! ensayador --base-url http://localhost:3002
//! ensayador --filter "nav buttons" --no-sandbox
//! ```
//!
//! Exit code 0 iff every test case passed. Launch failures (no chromium,
//! port conflict) abort the run and exit non-zero.

use std::process::ExitCode;

use clap::Parser;
use ensayar::CdpSessionManager;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod output;
mod suites;

use cli::Cli;
use error::CliResult;
use output::Reporter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> CliResult<bool> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_suite(cli))
}

async fn run_suite(cli: Cli) -> CliResult<bool> {
    let config = cli.suite_config();
    let mut suite = suites::gamesplay_suite(config.clone());
    if let Some(filter) = &cli.filter {
        suite.retain_matching(filter);
    }

    let reporter = Reporter::new(!cli.no_color, cli.quiet);
    reporter.suite_started(suite.name(), suite.cases().len(), &config.base_url);
    tracing::info!(base_url = %config.base_url, cases = suite.cases().len(), "starting run");

    // One browser process for the whole suite; failure here is fatal.
    let manager = CdpSessionManager::start(config).await?;
    let report = suite.run(&manager).await?;

    reporter.render(&report);
    Ok(report.all_passed())
}
