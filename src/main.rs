//! Gust - a front-end asset pipeline with a live-reloading dev server.

mod cli;
mod config;
mod core;
mod embed;
mod freshness;
mod logger;
mod pipeline;
mod reload;
mod scheduler;
mod serve;
mod task;
mod transform;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::GustConfig;
use core::Lifecycle;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Before any blocking work, so Ctrl+C during the first build exits at once.
    let lifecycle = Lifecycle::new();
    lifecycle.install_ctrlc_handler()?;

    let config = Arc::new(GustConfig::load(&cli)?);
    if let Some(path) = &config.config_path {
        debug!("config"; "using {}", path.display());
    }

    match cli.command() {
        Commands::Dev { .. } => cli::dev::start(config, lifecycle),
        Commands::Build => cli::build::build(config, lifecycle),
        Commands::Run { tasks } => cli::run::run_tasks(config, lifecycle, &tasks),
        Commands::List => cli::list::list_tasks(&config),
        Commands::Clean { all } => cli::clean::clean(&config, all),
    }
}
