mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod report;
mod store;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!(
        "🚀 Stereoplane CLI v{} starting up.",
        env!("CARGO_PKG_VERSION")
    );
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Align(args) => {
            info!("Dispatching to 'align' command.");
            commands::align::run(args).await
        }
        Commands::Spin(args) => {
            info!("Dispatching to 'spin' command.");
            commands::spin::run(args).await
        }
        Commands::Fetch(args) => {
            info!("Dispatching to 'fetch' command.");
            commands::fetch::run(args).await
        }
        Commands::Store(args) => {
            info!("Dispatching to 'store' command.");
            commands::store::run(args).await
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}
