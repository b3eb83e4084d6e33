//! offcache - offline-first cache controller for a web application's assets

use clap::{CommandFactory, Parser};

mod cache;
mod cli;
mod config;
mod controller;
mod error;
mod models;
mod network;
mod output;
mod registration;

use cli::fetch::FetchArgs;
use cli::{CacheCommands, Cli, Commands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `--debug`
fn init_logging(debug: bool) {
    let default_filter = if debug { "offcache=debug" } else { "offcache=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init { force } => cli::init::run(&opts, force),
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("offcache version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Install => cli::lifecycle::install(&opts).await,
        Commands::Activate => cli::lifecycle::activate(&opts).await,
        Commands::Fetch {
            target,
            navigate,
            mode,
            output,
            include,
        } => {
            let args = FetchArgs {
                target,
                navigate,
                mode,
                output,
                include,
            };
            cli::fetch::run(&opts, args).await
        }
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::List => cli::cache::list(&opts),
            CacheCommands::Entries { name } => cli::cache::entries(&opts, name).await,
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "offcache", &mut std::io::stdout());
            Ok(())
        }
    }
}
