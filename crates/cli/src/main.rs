//! Fleet control CLI
//!
//! A command-line tool for inspecting the predictive memory autoscaler:
//! fleet capacity, per-node forecasts and component health.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{health, nodes};
use output::OutputFormat;

/// Predictive autoscaler CLI
#[derive(Parser)]
#[command(name = "fleetctl")]
#[command(author, version, about = "CLI for the Predictive Memory Autoscaler", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via FLEETCTL_API_URL env var)
    #[arg(long, env = "FLEETCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format [default: table]
    #[arg(long, short, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all nodes with capacity and usage
    Nodes,

    /// Show one node with its usage history and forecast
    Node {
        /// Node ID
        id: u32,
    },

    /// Show autoscaler health and readiness
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or_default();

    // Initialize client
    let client = client::ApiClient::new(&config.api_url(cli.api_url))?;

    // Execute command
    match cli.command {
        Commands::Nodes => nodes::list_nodes(&client, format).await?,
        Commands::Node { id } => nodes::show_node(&client, id, format).await?,
        Commands::Health => health::show_health(&client, format).await?,
    }

    Ok(())
}
