//! rulepack CLI entry point
//!
//! Parses arguments, runs the command and renders failures through
//! [`user_friendly_error`] with exit status 1.
//!
//! - `import` - Resolve imports and list the delivered units
//! - `cache-key` - Show where a URI is cached

use anyhow::Result;
use clap::Parser;
use rulepack_cli::cli;
use rulepack_cli::core::user_friendly_error;

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
