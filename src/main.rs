//! handover CLI entry point
//!
//! Parses the command line, runs the command and reports failures as a
//! single line on stderr with exit code 1. The same binary serves as the
//! updater payload through the hidden `apply` subcommand.

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use handover_cli::cli;
use handover_cli::core::{ErrorContext, ErrorKind, user_friendly_error};

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => {
                ErrorContext::new(usage_error_line(&e.to_string())).with_kind(ErrorKind::MalformedInput).display();
                std::process::exit(1);
            }
        },
    };

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        user_friendly_error(e).display();
        std::process::exit(1);
    }
}

/// Collapse clap's multi-line usage error into one line.
fn usage_error_line(rendered: &str) -> String {
    rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Usage:") && !line.starts_with("For more information"))
        .map(|line| line.strip_prefix("error: ").unwrap_or(line))
        .collect::<Vec<_>>()
        .join(" ")
}
