use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fundarb::application::{Cli, CommandExecutor};
use fundarb::config::Config;

const DEFAULT_CONFIG: &str = "Config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit --config must exist; the default file is optional.
    let (mut config, source) = match &cli.config {
        Some(path) => (
            Config::from_file(path).with_context(|| format!("load config {}", path.display()))?,
            path.display().to_string(),
        ),
        None if Path::new(DEFAULT_CONFIG).exists() => (
            Config::from_file(DEFAULT_CONFIG).with_context(|| format!("load config {}", DEFAULT_CONFIG))?,
            DEFAULT_CONFIG.to_string(),
        ),
        None => {
            let mut config = Config::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            (config, "built-in defaults".to_string())
        }
    };
    config.apply_cli(&cli.overrides());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("Config loaded from {}", source);

    CommandExecutor::execute(cli.command.unwrap_or_default(), config).await
}
