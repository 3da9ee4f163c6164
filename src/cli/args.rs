//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Gust front-end asset pipeline CLI
///
/// Without a subcommand, runs the development pipeline (`gust dev`).
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: gust.toml, searched upward)
    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = "gust.toml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build into the preview directory, then watch and serve it with live reload
    #[command(visible_alias = "d")]
    Dev {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Produce the optimized production output from the preview directory
    #[command(visible_alias = "b")]
    Build,

    /// Run the named tasks one after another
    #[command(visible_alias = "r")]
    Run {
        /// Task names (see `gust list`)
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
    },

    /// List registered tasks and pipelines
    #[command(visible_alias = "l")]
    List,

    /// Remove the preview directory
    Clean {
        /// Also remove the production directory
        #[arg(short, long)]
        all: bool,
    },
}

impl Cli {
    /// Subcommand to run, `dev` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Dev {
            interface: None,
            port: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_definition_is_consistent() {
        <Cli as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_short_flags_are_distinct() {
        let err = Cli::try_parse_from(["gust", "-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);

        let cli = Cli::parse_from(["gust", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_no_subcommand_is_dev() {
        let cli = Cli::parse_from(["gust"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.command(), Commands::Dev { port: None, .. }));
    }

    #[test]
    fn test_dev_overrides() {
        let cli = Cli::parse_from(["gust", "dev", "--port", "8080", "-i", "0.0.0.0"]);
        match cli.command() {
            Commands::Dev { interface, port } => {
                assert_eq!(port, Some(8080));
                assert_eq!(interface, Some("0.0.0.0".parse().unwrap()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_tasks() {
        assert!(Cli::try_parse_from(["gust", "run"]).is_err());
        let cli = Cli::parse_from(["gust", "run", "styles", "scripts"]);
        assert!(matches!(cli.command(), Commands::Run { tasks } if tasks == ["styles", "scripts"]));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["gust", "build", "-v", "-C", "site/gust.toml"]);
        assert!(matches!(cli.command(), Commands::Build));
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site/gust.toml"));
    }
}
