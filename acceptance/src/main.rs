//! Acceptance Test Runner
//!
//! Runs built-in scenarios against a real Alertmanager binary:
//! - Starts one or more instances with generated configuration
//! - Pushes alerts and silences on a scripted timeline
//! - Reconciles delivered notifications against expectation windows
//! - Exits non-zero when any scenario fails

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;

use acceptance::{AcceptanceOpts, TestScenarios};

#[derive(Parser)]
#[command(name = "acceptance")]
#[command(about = "Acceptance tests for Alertmanager notification timing")]
struct Args {
    /// Test scenario to run
    #[arg(long, default_value = "all")]
    scenario: String,

    /// Alertmanager binary to launch
    #[arg(long, env = "ALERTMANAGER_BIN", default_value = "alertmanager")]
    binary: PathBuf,

    /// Matching tolerance in milliseconds
    #[arg(long, default_value = "150")]
    tolerance_ms: u64,

    /// Test timeout in seconds
    #[arg(long, default_value = "60")]
    timeout_secs: u64,

    /// Log level passed to Alertmanager instances
    #[arg(long, default_value = "debug")]
    log_level: String,

    /// Enable verbose tracing output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    shared::logging::init_tracing(None, args.verbose);

    tracing::info!("🧪 Starting acceptance runner");
    tracing::info!(
        "Scenario: {}, Binary: {}, Timeout: {}s",
        args.scenario,
        args.binary.display(),
        args.timeout_secs
    );

    let opts = AcceptanceOpts::builder()
        .binary(args.binary)
        .tolerance(Duration::from_millis(args.tolerance_ms))
        .log_level(args.log_level)
        .build();
    let scenarios = TestScenarios::new(opts);

    let passed = timeout(
        Duration::from_secs(args.timeout_secs),
        scenarios.run_scenario(&args.scenario),
    )
    .await
    .map_err(|_| acceptance::HarnessError::Timeout(Duration::from_secs(args.timeout_secs)))?
    .with_context(|| format!("scenario '{}' could not be run", args.scenario))?;

    if !passed {
        tracing::error!("❌ Scenario '{}' failed", args.scenario);
        bail!("scenario '{}' failed", args.scenario);
    }

    tracing::info!("🏁 Scenario '{}' passed", args.scenario);
    Ok(())
}
