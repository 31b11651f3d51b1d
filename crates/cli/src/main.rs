//! cfgprov CLI
//!
//! Configures a secret provider exactly as a worker would and resolves one
//! path, so credentials, region and secret layout can be checked before a
//! deployment picks them up.

// The CLI reports results on stdout
#![allow(clippy::print_stdout)]

mod cli;
mod commands;

use cli::{CliError, Commands, EXIT_OK, exit_code_for, render_error};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.level.as_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(cli.command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::from(EXIT_OK)
        }
        Err(err) => {
            let code = exit_code_for(&err);
            render_error(err);
            ExitCode::from(code)
        }
    }
}

async fn run(command: Commands) -> Result<String, CliError> {
    match command {
        Commands::Resolve {
            provider,
            path,
            keys,
            show_values,
        } => commands::resolve(provider, &path, &keys, show_values).await,
        Commands::Options => commands::options(),
    }
}
