//! Command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LLM-driven town simulation backend.
#[derive(Parser)]
#[command(name = "yunmeng", version, about)]
pub struct Cli {
    /// Path to a configuration file (defaults to .yunmeng/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP backend with background planning jobs (the default).
    Serve(commands::serve::ServeArgs),
    /// Run one offline simulated day and log the town's story.
    Simulate(commands::simulate::SimulateArgs),
}

/// Report a fatal command error and exit.
pub fn handle_error(err: anyhow::Error) -> ! {
    tracing::error!(error = ?err, "command failed");
    eprintln!("Error: {err:#}");
    std::process::exit(1);
}
