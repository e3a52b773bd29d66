//! # Gremlin Harness CLI (`gremlin-harness`)
//!
//! ## Usage
//!
//! ```bash
//! gremlin-harness --config ./config/harness.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gremlin-harness labels` | Test the source and list its vertex labels |
//! | `gremlin-harness reverse` | Sample labels and emit schema packages as JSON |
//! | `gremlin-harness forward --model <file>` | Generate a Gremlin script from a model |
//!
//! On failure the command prints `{"message": ..., "stack": ...}` to stderr
//! and exits with status 1.

use clap::{Parser, Subcommand};
use gremlin_harness::config::{self, Config};
use gremlin_harness::error::ErrorReport;
use gremlin_harness::{forward, labels, logging, reverse};
use std::path::PathBuf;

/// Gremlin Harness: schema reverse engineering and script generation for
/// Gremlin property graphs.
#[derive(Parser)]
#[command(
    name = "gremlin-harness",
    about = "Schema reverse engineering and script generation for Gremlin property graphs",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/harness.toml`. Sampling, inference,
    /// concurrency, source and logging settings are read from this file.
    #[arg(long, global = true, default_value = "./config/harness.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test the graph source and list its vertex labels.
    Labels {
        /// JSON snapshot to read instead of `[source].dump`.
        #[arg(long)]
        dump: Option<PathBuf>,
    },

    /// Reverse-engineer labels and relationships into schema packages.
    ///
    /// Writes `{collections, relationships}` as JSON.
    Reverse {
        /// JSON snapshot to read instead of `[source].dump`.
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Comma-separated labels to sample. Defaults to every label.
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,

        /// Output file path. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate a Gremlin script from a container model.
    ///
    /// Does not read the configuration file.
    Forward {
        /// Container model JSON (`collections`, `relationships`, `jsonData`).
        #[arg(long)]
        model: PathBuf,

        /// Output file path. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        log::error!("{:#}", err);
        let report = ErrorReport::from(&err);
        let json = serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.message.clone());
        eprintln!("{}", json);
        logging::shutdown();
        std::process::exit(1);
    }

    logging::shutdown();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that don't require config
    if let Commands::Forward { model, output } = &cli.command {
        logging::init(&Config::default().log)?;
        return forward::run_forward(model, output.as_deref());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.log)?;

    match cli.command {
        Commands::Labels { dump } => {
            labels::list_labels(&cfg, dump.as_deref()).await?;
        }
        Commands::Reverse {
            dump,
            labels,
            output,
        } => {
            reverse::run_reverse(&cfg, dump.as_deref(), labels, output.as_deref()).await?;
        }
        Commands::Forward { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
