// ghsel: pick a repository from a GitHub organization and clone it.
// Prints the clone path on stdout for a shell function to cd into.

use std::process::ExitCode;

use clap::Parser;

mod cache;
mod cli;
mod cloner;
mod config;
mod error;
mod github;
mod logging;
mod selector;
mod workflow;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::init(cli.v);

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(?err, "ghsel failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
