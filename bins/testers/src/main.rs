mod config;
mod engine;
mod evaluator;
mod executor;

#[cfg(test)]
mod engine_tests;

use anyhow::{Context, Result};
use clap::Parser;
use config::RunnerConfig;
use engine::Invocation;
use testers_common::{report, suite};
use testers_common::types::ScoringPolicy;
use tracing::info;

/// Run a program against a JSON suite of input/output cases
#[derive(Parser, Debug)]
#[command(name = "testers")]
#[command(about = "Batch test-runner: feeds each case to a program and grades its output", long_about = None)]
struct Cli {
    /// Interpreter to run PROGRAM with (e.g. python3, node), or `compiler`
    /// to execute PROGRAM directly
    language: String,

    /// Script, source file or executable under test
    program: String,

    /// Suite name, resolved to `<SUITE>.json`
    suite: String,

    /// How passed cases turn into a completion percentage
    #[arg(long)]
    scoring: Option<ScoringPolicy>,

    /// Per-case timeout in seconds, replacing the suite's own
    #[arg(long)]
    timeout: Option<u64>,

    /// Pretty-print the JSON report
    #[arg(long, default_value = "false")]
    pretty: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout is reserved for the report
    if config::json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = RunnerConfig::resolve(cli.scoring, cli.timeout, cli.pretty)?;
    let invocation = Invocation::from_mode(&cli.language, &cli.program);

    let suite = suite::load_suite(&cli.suite)?;

    info!(
        suite = %cli.suite,
        cases = suite.len(),
        timeout_secs = suite.timeout_secs,
        "Loaded test suite"
    );

    let run = executor::run_suite(&suite, &invocation, &config)
        .await
        .with_context(|| format!("Cannot grade suite {}", cli.suite))?;

    let rendered = report::render(&run, config.pretty).context("Failed to serialize report")?;
    println!("{}", rendered);

    Ok(())
}
