//! update-deps entry point
//!
//! Parses arguments, runs the update and turns any failure into a coloured
//! diagnostic with a suggestion, exiting with status 1.

use anyhow::Result;
use clap::Parser;
use deps_pin::cli;
use deps_pin::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
