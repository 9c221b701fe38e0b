//! Standalone forwarder binary.

use std::process::ExitCode;

use clap::Parser;
use sockpipe_forward::ForwardArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ForwardArgs::parse();
    match sockpipe_forward::cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
