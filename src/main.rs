//! Unified sockpipe CLI.
//!
//! - `sockpipe forward` - Forward TCP connections through the relay
//!
//! The forwarder can also be run as a standalone binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Sockpipe unified CLI.
#[derive(Parser)]
#[command(
    name = "sockpipe",
    version,
    about = "Relay bytes between two TCP connections",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward connections from listen addresses to targets.
    #[command(name = "forward", alias = "fwd")]
    Forward(Box<sockpipe_forward::ForwardArgs>),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Forward(args) => sockpipe_forward::cli::run(*args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
