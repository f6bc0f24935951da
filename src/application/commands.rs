//! CLI commands and handlers
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::app;
use crate::config::{CliOverrides, Config};

#[derive(Parser, Debug)]
#[command(name = "fundarb")]
#[command(version, about = "Cross-venue perpetual funding rate arbitrage bot")]
pub struct Cli {
    /// Path to config file (defaults to Config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter, used when RUST_LOG is unset
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Place orders for qualifying opportunities
    #[arg(long, global = true, conflicts_with = "observe_only")]
    pub execute_trades: bool,

    /// Only report opportunities
    #[arg(long, global = true)]
    pub observe_only: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        let execute_trades = match (self.execute_trades, self.observe_only) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        CliOverrides {
            execute_trades,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Default)]
pub enum Commands {
    /// Run the enabled strategies until Ctrl-C
    #[default]
    Run,

    /// Scan funding rates once and print the best spread per pair
    Scan {
        /// Pairs to scan instead of the configured list
        #[arg(short, long)]
        pairs: Vec<String>,
    },

    /// Log EdgeX ticker updates from the quote WebSocket
    Stream {
        /// Channels to subscribe to
        #[arg(default_values = ["ticker.10000001", "ticker.10000002"])]
        channels: Vec<String>,

        /// WebSocket URL (overrides exchanges.edgex.ws_url)
        #[arg(long)]
        url: Option<String>,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: Config) -> anyhow::Result<()> {
        match command {
            Commands::Run => app::run(config).await,
            Commands::Scan { pairs } => app::scan(config, pairs).await,
            Commands::Stream { channels, url } => app::stream(config, channels, url).await,
        }
    }
}
