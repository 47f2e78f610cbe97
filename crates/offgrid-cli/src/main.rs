//! offgrid CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::{Commands, ConfigCommands};
use config::EdgeConfig;

#[derive(Parser)]
#[command(name = "offgrid")]
#[command(author, version, long_about = None)]
#[command(about = "Offline-resilient asset cache and health monitor")]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = EdgeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(overrides) => {
            config.apply(&overrides);
            handlers::serve(&config).await?
        }
        Commands::Precache(overrides) => {
            config.apply(&overrides);
            handlers::precache(&config).await?
        }
        Commands::Probe { origin } => {
            if let Some(origin) = origin {
                config.origin_url = origin.to_string();
            }
            handlers::probe(&config).await?
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config, cli.config.as_deref())?,
        },
    }

    Ok(())
}
