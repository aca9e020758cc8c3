//! Command-line interface for readygate.
//!
//! Provides commands for evaluating the readiness gate, probing store
//! connectivity, running the full gate-then-transform pipeline, and
//! inspecting resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::ResolvedConfig;
use crate::domain::Precondition;
use crate::gate::{Manifest, ReadinessGate};
use crate::runner::TransformRunner;
use crate::stores::build_stores;

/// readygate - pre-flight data-readiness gate for analytics pipelines
#[derive(Parser, Debug)]
#[command(name = "readygate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the store config file (overrides discovery)
    #[arg(short, long, global = true, env = crate::config::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the readiness gate for a manifest
    Check {
        /// Path to the gate manifest (YAML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Print the result as JSON instead of diagnostic lines
        #[arg(long)]
        json: bool,
    },

    /// Probe connectivity of configured stores (no data assertions)
    Probe {
        /// Probe a single store (all configured stores if omitted)
        store: Option<String>,
    },

    /// Evaluate the gate, then run the manifest's transform stage on pass
    Run {
        /// Path to the gate manifest (YAML)
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Show resolved configuration (passwords redacted)
    Config,
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        let config = ResolvedConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Check { manifest, json } => check(&config, &manifest, json).await,
            Commands::Probe { store } => probe(&config, store.as_deref()).await,
            Commands::Run { manifest } => run(&config, &manifest).await,
            Commands::Config => {
                println!("{}", config.describe());
                Ok(())
            }
        }
    }
}

/// Evaluate the gate and report; non-pass propagates as a hard error
async fn check(config: &ResolvedConfig, manifest_path: &PathBuf, json: bool) -> Result<()> {
    let manifest = Manifest::from_file(manifest_path)?;
    manifest.validate(config)?;
    let preconditions = manifest.compile();

    let gate = ReadinessGate::new(build_stores(config), config.default_timeout);
    let result = gate.evaluate(&preconditions).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize gate result")?
        );
    } else {
        println!("{}", result.render());
    }

    result.into_outcome()?;
    Ok(())
}

/// Connectivity probes only: the degenerate gate of one Reachable
/// precondition per store
async fn probe(config: &ResolvedConfig, store: Option<&str>) -> Result<()> {
    let mut names: Vec<String> = match store {
        Some(name) => {
            if !config.stores.contains_key(name) {
                anyhow::bail!("Unknown store '{}'", name);
            }
            vec![name.to_string()]
        }
        None => config.stores.keys().cloned().collect(),
    };
    names.sort();

    let preconditions: Vec<Precondition> = names.into_iter().map(Precondition::probe).collect();

    let gate = ReadinessGate::new(build_stores(config), config.default_timeout);
    let result = gate.evaluate(&preconditions).await;

    println!("{}", result.render());
    result.into_outcome()?;
    Ok(())
}

/// Full pipeline: gate first, transform stage only on pass
async fn run(config: &ResolvedConfig, manifest_path: &PathBuf) -> Result<()> {
    let manifest = Manifest::from_file(manifest_path)?;
    manifest.validate(config)?;
    let preconditions = manifest.compile();

    let gate = ReadinessGate::new(build_stores(config), config.default_timeout);
    let result = gate.evaluate(&preconditions).await;

    println!("{}", result.render());

    // Abort before any downstream work on a failed gate
    result.into_outcome()?;

    let transform = manifest
        .transform
        .as_ref()
        .context("Manifest has no transform stage to run")?;

    let runner = TransformRunner::from_spec(transform);
    let output = runner.run(transform.timeout()).await?;

    println!("transform completed in {}ms", output.duration_ms);
    Ok(())
}
