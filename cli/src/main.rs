//! # aichatconf CLI
//!
//! Command-line interface for aichatconf - keeps the models of an aichat
//! client in sync with an Ollama server.
//!
//! ## Usage
//!
//! - `aichatconf` - Sync the `ollama` client of the default aichat config, print to stdout
//! - `aichatconf -c config.yaml -o config.yaml` - Sync a file in place
//! - `aichatconf -n local -e embed,vision -m qwen` - Pick the client, drop models, set the default model
//!
//! Logs go to stderr; stdout only ever carries the document.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::sync_command;
use config::CliConfigLoader;
use output::OutputTarget;

/// aichatconf - A simple configuration tool for aichat
#[derive(Parser)]
#[command(name = "aichatconf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sync the models of an aichat client with an Ollama server")]
#[command(long_about = None)]
struct Cli {
    /// Config file of aichat (default: the aichat config directory's config.yaml)
    #[arg(short, long, env = "AICHATCONF_CONFIG")]
    config: Option<PathBuf>,

    /// Output file, default is stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Client name
    #[arg(short = 'n', long = "client", env = "AICHATCONF_CLIENT")]
    client: Option<String>,

    /// Models to exclude, matched by substring, split by comma
    #[arg(short, long, env = "AICHATCONF_EXCLUDE", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Default model, the first model whose name contains this text
    #[arg(short, long)]
    model: Option<String>,

    /// Keep the existing order of the models and append new ones
    #[arg(long)]
    no_sort: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "debug")]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new()
        .with_exclude(cli.exclude.clone())
        .with_sort(!cli.no_sort);

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(client) = &cli.client {
        loader = loader.with_client_override(client.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_default_model(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    aichatconf_core::init_tracing(filter);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loader = build_config_loader(&cli);
    let target = OutputTarget::from_path(cli.output);
    sync_command(loader, target).await
}
