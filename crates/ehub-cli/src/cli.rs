use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ehub", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a model file and report configuration warnings and errors
    Validate {
        /// Path to the model file (YAML or JSON)
        model: PathBuf,
    },
    /// Build the constraint blocks of every technology
    Build {
        /// Path to the model file (YAML or JSON)
        model: PathBuf,
        /// Write a JSON report of the built blocks
        #[arg(long)]
        json: Option<PathBuf>,
        /// Keep disjunctions in logical form instead of relaxing them
        #[arg(long)]
        no_relax: bool,
    },
    /// Size one technology for a total output over the horizon (LP relaxation)
    Solve {
        /// Path to the model file (YAML or JSON)
        model: PathBuf,
        /// Technology to size
        #[arg(long)]
        technology: String,
        /// Output carrier the demand applies to
        #[arg(long)]
        carrier: String,
        /// Total output required over the horizon
        #[arg(long)]
        demand: f64,
        /// Write the solution as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}
