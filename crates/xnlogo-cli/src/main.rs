//! xnlogo - compile Python agent-based models into NetLogo

use anyhow::Result;
use clap::Parser;
use std::io;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xnlogo_cli::{run, Cli, XnlogoConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = XnlogoConfig::load()?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(level)?;
    debug!("Loaded configuration: {:?}", config);

    let stdout = io::stdout();
    let stderr = io::stderr();
    let outcome = run(
        &cli.command,
        &config,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )?;

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Initialize tracing subscriber; `log` records from the compiler crates are
/// forwarded to it
fn init_tracing(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "xnlogo={level},xnlogo_cli={level},xnlogo_compiler={level},xnlogo_parser={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
