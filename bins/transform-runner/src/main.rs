mod cmd;
mod config;
mod error;

use std::process::ExitCode;

use clap::Parser;
use config::{Cli, Commands};
use error::RunnerError;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // stdout carries transformed records, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let result = match Cli::parse().command {
        Commands::Run(args) => run_async(args),
        Commands::Functions(args) => cmd::functions::run(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "transform-runner failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_async(args: config::RunArgs) -> Result<(), RunnerError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(cmd::run::run(args))
}
