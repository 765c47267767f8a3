use clap::Parser;

use crate::config::{Cli, Commands};

mod config;
mod env_file;
mod error;
mod logging;
mod progress;
mod smoke;

pub(crate) use error::{CliError, CliResult};

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing_registry()?;

    match cli.commands {
        Commands::EnvShow(args) => env_file::show_command(&args.file),
        Commands::EnvPatch(args) => env_file::patch_command(&args.file),
        Commands::Smoke(args) => smoke::smoke_command(args).await?,
    }

    Ok(())
}
