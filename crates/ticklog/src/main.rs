//! ticklog daemon binary

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ticklog::{telemetry, Logger};
use ticklog_conf::TicklogConfig;

/// ticklog - record sample vectors to timestamped text files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file, used in place of ./ticklog.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process name, overrides logger.name
    #[arg(long)]
    name: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, sources) = TicklogConfig::load_with_sources_from(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(name) = args.name {
        config.logger.name = Some(name);
    }

    if args.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    telemetry::init(&config.telemetry.log_level)?;

    for file in &sources.files {
        info!("config file: {}", file.display());
    }
    for var in &sources.env_overrides {
        info!("config override: {}", var);
    }

    let settings = config.settings().context("invalid configuration")?;

    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    info!("ticklog {} starting", env!("CARGO_PKG_VERSION"));
    info!("  name: {}", settings.name);
    info!("  output: {}", settings.output_dir.display());

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    // Handle SIGINT
    let shutdown_tx_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_signal.send(());
    });

    Logger::new(settings).run(shutdown_rx).await?;

    info!("ticklog shutdown complete");
    Ok(())
}
