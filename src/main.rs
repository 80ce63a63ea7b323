// ABOUTME: Entry point for the helmsman CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use helmsman::config::{self, DeploymentSpec};
use helmsman::error::Result;
use helmsman::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    let result = run(cli, output).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    match cli.command {
        Commands::Init { app, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, app.as_deref(), force)
        }
        Commands::Render => {
            let cwd = env::current_dir()?;
            let spec = DeploymentSpec::discover(&cwd)?;
            commands::render(spec)
        }
        Commands::Deploy => {
            let cwd = env::current_dir()?;
            let spec = DeploymentSpec::discover(&cwd)?;
            commands::deploy(spec, output).await
        }
        Commands::Status => {
            let cwd = env::current_dir()?;
            let spec = DeploymentSpec::discover(&cwd)?;
            commands::status(spec, output).await
        }
    }
}
