// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "helmsman")]
#[command(about = "Build, push, and deploy an application to Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new helmsman.yml configuration file
    Init {
        /// Application name to seed the template with
        #[arg(short, long)]
        app: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Print the rendered cluster manifests without applying them
    Render,

    /// Build, push, apply, and wait for the rollout
    Deploy,

    /// Show the current rollout status of the deployed workload
    Status,
}
