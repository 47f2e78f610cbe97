//! CLI command definitions.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Subcommand)]
pub enum Commands {
    /// Precache, start the health monitor, and serve the gateway
    Serve(Overrides),

    /// Seed the cache from the manifest once and exit
    Precache(Overrides),

    /// Probe the origin once and print the link state
    Probe {
        /// Origin base URL
        #[arg(long)]
        origin: Option<Url>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Flags that take precedence over the configuration file.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Origin base URL
    #[arg(long)]
    pub origin: Option<Url>,

    /// Address the gateway listens on
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Cache generation
    #[arg(short, long)]
    pub generation: Option<String>,

    /// Cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory instead of on disk
    #[arg(long)]
    pub memory: bool,

    /// Wait for each cache write before returning the response
    #[arg(long)]
    pub await_writes: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
}
