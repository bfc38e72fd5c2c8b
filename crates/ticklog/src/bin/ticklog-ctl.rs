//! ticklog-ctl - drive a running ticklog from the shell
//!
//! Subcommands:
//! - `ticklog-ctl record <names...>` - start a session with these columns
//! - `ticklog-ctl quit` - stop the current session
//! - `ticklog-ctl send <tokens...>` - send raw command tokens
//! - `ticklog-ctl publish <values...>` - publish sample vectors

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::info;

use ticklog::{telemetry, LoggerClient, Reply, SamplePublisher};
use ticklog_conf::TicklogConfig;

#[derive(Parser)]
#[command(name = "ticklog-ctl")]
#[command(about = "Control a running ticklog")]
#[command(version)]
struct Cli {
    /// Rpc endpoint; defaults to the one derived from the ticklog config
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// Data endpoint; defaults to the one derived from the ticklog config
    #[arg(long, global = true)]
    data: Option<String>,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "5000", global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start recording the given columns
    Record {
        columns: Vec<String>,
    },

    /// Stop recording
    Quit,

    /// Send raw command tokens
    Send {
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Publish a sample vector on the data port
    Publish {
        #[arg(allow_negative_numbers = true)]
        values: Vec<f64>,

        /// How many times to publish the vector
        #[arg(short, long, default_value = "1")]
        count: u32,

        /// Pause between publications in milliseconds
        #[arg(short, long, default_value = "100")]
        interval_ms: u64,
    },
}

/// Endpoint from the flag, or from the local ticklog configuration.
fn resolve(explicit: Option<String>, pick: fn(&ticklog_conf::LoggerSettings) -> String) -> Result<String> {
    if let Some(endpoint) = explicit {
        return Ok(endpoint);
    }
    let settings = TicklogConfig::load()?.settings()?;
    Ok(pick(&settings))
}

async fn command(endpoint: &str, timeout: Duration, tokens: &[String]) -> Result<()> {
    let mut client = LoggerClient::connect(endpoint, timeout)?;
    match client.send(tokens).await? {
        Reply::Success => {
            println!("1");
            Ok(())
        }
        Reply::Failure => {
            println!("0");
            bail!("{} rejected {:?}", endpoint, tokens.join(" "))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init("warn")?;

    let timeout = Duration::from_millis(cli.timeout);

    match cli.command {
        Commands::Record { columns } => {
            let endpoint = resolve(cli.rpc, |s| s.rpc_endpoint.clone())?;
            let mut tokens = vec!["record".to_string()];
            tokens.extend(columns);
            command(&endpoint, timeout, &tokens).await?;
        }
        Commands::Quit => {
            let endpoint = resolve(cli.rpc, |s| s.rpc_endpoint.clone())?;
            command(&endpoint, timeout, &["quit".to_string()]).await?;
        }
        Commands::Send { tokens } => {
            let endpoint = resolve(cli.rpc, |s| s.rpc_endpoint.clone())?;
            command(&endpoint, timeout, &tokens).await?;
        }
        Commands::Publish {
            values,
            count,
            interval_ms,
        } => {
            let endpoint = resolve(cli.data, |s| s.data_endpoint.clone())?;
            let mut publisher = SamplePublisher::connect(&endpoint)?;
            // PUB drops everything sent before the connection is up
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            for i in 0..count {
                publisher.publish(&values).await?;
                info!("published {:?} ({}/{})", values, i + 1, count);
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
    }

    Ok(())
}
