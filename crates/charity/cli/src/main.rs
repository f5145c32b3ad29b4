//! charityctl - operator tooling for charity pools
//!
//! - `simulate` replays a JSON script of donations, proposals and approvals
//!   against a fresh factory and prints one JSON outcome per step
//! - `show-config` prints the effective configuration

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod script;

use config::CliConfig;
use script::Simulator;

/// Charity pool CLI
#[derive(Parser)]
#[command(name = "charityctl")]
#[command(about = "Charity pools - scripted simulation and configuration", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CHARITY_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (overrides the configured level)
    #[arg(long, env = "CHARITY_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "CHARITY_LOG_JSON", global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON operation script against an in-memory ledger
    Simulate {
        /// Script file
        script: PathBuf,
    },

    /// Print the effective configuration
    ShowConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json {
        config.logging.json = true;
    }

    // Initialize tracing; stdout is reserved for command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Simulate { script } => simulate(&config, &script),
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn simulate(config: &CliConfig, path: &std::path::Path) -> anyhow::Result<()> {
    let ops = script::load_script(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    info!(steps = ops.len(), script = %path.display(), "Starting simulation");

    let mut simulator = Simulator::new(config)?;
    let outcomes = simulator.run(&ops);
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    let failed = outcomes.iter().filter(|o| !o.ok).count();
    let summaries = simulator.summaries()?;
    println!(
        "{}",
        serde_json::to_string(&serde_json::json!({
            "steps": outcomes.len(),
            "failed": failed,
            "pools": summaries,
            "factory_events": simulator.factory().events(),
        }))?
    );
    Ok(())
}
