//! `murmur` command-line entry point.
//!
//! Drives the feed cache against a posts API from the terminal. Command output
//! is JSON on stdout; logs go to stderr.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use murmur_core::AppConfig;

mod commands;
mod error;

use commands::{App, Command};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "murmur")]
#[command(about = "Browse and like posts through the murmur feed cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting murmur");

    match run(cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{e}");
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

async fn run(command: Command) -> Result<serde_json::Value, CliError> {
    let config = AppConfig::load()?;
    let app = App::new(config)?;
    app.run(command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_feed_commands() {
        let cli = Cli::try_parse_from(["murmur", "user", "u1", "--pages", "3"]).unwrap();
        assert!(matches!(cli.command, Command::User { ref user_id, pages: 3 } if user_id == "u1"));

        let cli = Cli::try_parse_from(["murmur", "search", ""]).unwrap();
        assert!(matches!(cli.command, Command::Search { ref text, pages: 1 } if text.is_empty()));
    }

    #[test]
    fn test_pages_must_be_positive() {
        assert!(Cli::try_parse_from(["murmur", "timeline", "--pages", "0"]).is_err());
    }

    #[test]
    fn test_parse_like_commands() {
        let cli = Cli::try_parse_from(["murmur", "unlike", "p1"]).unwrap();
        assert!(matches!(cli.command, Command::Unlike { ref post_id } if post_id == "p1"));
    }
}
