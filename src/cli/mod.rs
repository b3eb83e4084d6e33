//! CLI command definitions and handlers
//!
//! The CLI plays the hosting runtime: it delivers install, activate and
//! fetch events to the controller and keeps storage between runs.

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

use crate::models::RequestMode;

pub mod args;
pub mod cache;
pub mod context;
pub mod fetch;
pub mod init;
pub mod lifecycle;
pub mod status;

pub use args::{GlobalOptions, OutputFormat};

/// offcache - offline-first cache controller for a web application's assets
#[derive(Parser, Debug)]
#[command(name = "offcache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "OFFCACHE_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "OFFCACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the origin manifest paths resolve against
    #[arg(long, global = true, env = "OFFCACHE_ORIGIN", hide_env = true)]
    pub origin: Option<String>,

    /// Override the cache directory
    #[arg(long, global = true, env = "OFFCACHE_CACHE_DIR", hide_env = true)]
    pub cache_dir: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "OFFCACHE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Populate the current cache with the essential URL manifest
    Install,

    /// Promote the installed cache and delete every stale cache
    Activate,

    /// Answer a request the way the controller would
    Fetch {
        /// Absolute URL, or a path resolved against the origin
        target: String,

        /// Treat the request as a top-level page navigation
        #[arg(long, short = 'n', conflicts_with = "mode")]
        navigate: bool,

        /// Request mode
        #[arg(long, value_enum)]
        mode: Option<RequestMode>,

        /// Write the body to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<String>,

        /// Print the status line and headers before the body
        #[arg(long, short = 'i')]
        include: bool,
    },

    /// Show configuration and registration status
    Status,

    /// Inspect and manage the cache registry
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Display version information
    Version,

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Cache registry subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List every named cache
    List,

    /// List the entries of one cache
    Entries {
        /// Cache name (defaults to the current version tag)
        name: Option<String>,
    },

    /// Delete every cache and forget the registration
    Clear,

    /// Show cache directory path
    Path,
}
