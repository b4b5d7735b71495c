//! Yubi CLI - resize and re-encode batches of images.
//!
//! Each image is scaled to fit the configured bounds (800x600 by default),
//! encoded as PNG or JPEG, and saved as `yubi-<name>.<ext>`.
//!
//! # Usage
//!
//! ```bash
//! # Optimize a few images into ./out as JPEG
//! yubi optimize a.png b.jpg --format jpg --out-dir ./out
//!
//! # Check which files would be accepted
//! yubi inspect ./photos/*
//!
//! # View configuration
//! yubi config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Yubi - resize and re-encode batches of images.
#[derive(Parser, Debug)]
#[command(name = "yubi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "YUBI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Optimize images and save the results
    Optimize(cli::optimize::OptimizeArgs),

    /// Run intake checks only and show what would be accepted
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `yubi config path`."
            );
            yubi_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Yubi v{}", yubi_core::VERSION);

    match cli.command {
        Commands::Optimize(args) => cli::optimize::execute(args, config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optimize_with_global_flags() {
        let cli = Cli::try_parse_from([
            "yubi",
            "optimize",
            "a.png",
            "b.png",
            "--format",
            "jpg",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Optimize(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert!(matches!(args.format, cli::optimize::FormatArg::Jpg));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn optimize_requires_inputs() {
        assert!(Cli::try_parse_from(["yubi", "optimize"]).is_err());
    }

    #[test]
    fn parses_config_init_force() {
        let cli = Cli::try_parse_from(["yubi", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(cli::config::ConfigArgs {
                command: cli::config::ConfigCommand::Init { force: true }
            })
        ));
    }
}
