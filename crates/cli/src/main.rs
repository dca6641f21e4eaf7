//! Zombie Container Detector CLI
//!
//! A command-line tool for sweeping a cluster for zombie containers,
//! inspecting individual containers, and evaluating detection quality
//! against labeled fixtures.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{detect, evaluate, inspect};

/// Zombie Container Detector CLI
#[derive(Parser)]
#[command(name = "zd")]
#[command(author, version, about = "Detect zombie containers in Kubernetes clusters", long_about = None)]
pub struct Cli {
    /// Prometheus base URL (can also be set via ZD_PROMETHEUS_URL env var)
    #[arg(
        long,
        env = "ZD_PROMETHEUS_URL",
        default_value = "http://prometheus.monitoring:9090"
    )]
    pub prometheus_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a detection sweep across the cluster
    Detect {
        /// Minutes of metrics history to analyze
        #[arg(long, default_value_t = 60)]
        duration: u64,

        /// Composite score required to report a container
        #[arg(long, default_value_t = 70.0)]
        threshold: f64,

        /// Comma-separated namespaces to exclude
        #[arg(long, default_value = "kube-system,monitoring")]
        exclude_namespaces: String,

        /// Show per-rule scores and evidence for each detection
        #[arg(long)]
        details: bool,
    },

    /// Analyze a single container in detail
    Inspect {
        /// Kubernetes namespace
        namespace: String,

        /// Pod name
        pod: String,

        /// Container name
        container: String,

        /// Minutes of metrics history to analyze
        #[arg(long, default_value_t = 120)]
        duration: u64,
    },

    /// Evaluate detection quality against labeled fixtures
    Evaluate {
        /// Directory of labeled fixture JSON files
        #[arg(long)]
        fixtures: PathBuf,

        /// Composite score treated as a zombie prediction
        #[arg(long, default_value_t = 70.0)]
        threshold: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            duration,
            threshold,
            exclude_namespaces,
            details,
        } => {
            detect::run(
                &cli.prometheus_url,
                duration,
                threshold,
                &exclude_namespaces,
                details,
                cli.format,
            )
            .await?;
        }
        Commands::Inspect {
            namespace,
            pod,
            container,
            duration,
        } => {
            inspect::run(
                &cli.prometheus_url,
                &namespace,
                &pod,
                &container,
                duration,
                cli.format,
            )
            .await?;
        }
        Commands::Evaluate {
            fixtures,
            threshold,
        } => {
            evaluate::run(&fixtures, threshold, cli.format)?;
        }
    }

    Ok(())
}
