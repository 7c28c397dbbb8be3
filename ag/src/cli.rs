//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// assetgen - debounced render job scheduler
#[derive(Parser)]
#[command(
    name = "ag",
    about = "Schedule component renders under a concurrency cap and debounce window",
    version,
    after_help = "Logs are written to: ~/.local/share/assetgen/logs/assetgen.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log level for assetgen's own targets; RUST_LOG overrides it
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<tracing::Level>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Default filter directive when RUST_LOG is unset
    ///
    /// Only assetgen's targets are raised; dependencies stay at warn.
    pub fn log_directive(&self) -> String {
        let level = match self.log_level {
            Some(level) => level,
            None if self.verbose => tracing::Level::DEBUG,
            None => tracing::Level::INFO,
        };
        format!("warn,assetgen={},ag={}", level, level).to_lowercase()
    }
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Drive the scheduler with synthetic components and renderers
    Simulate {
        /// Number of components to submit
        #[arg(short = 'n', long, default_value = "16")]
        components: usize,

        /// Number of documents the components are spread over
        #[arg(short, long, default_value = "1")]
        documents: usize,

        /// Make every Nth component a vector (svg) component; 0 for none
        #[arg(long, default_value = "4")]
        vector_every: usize,

        /// Override the concurrency cap
        #[arg(short = 'j', long)]
        max_jobs: Option<usize>,

        /// Override the debounce quiet period in milliseconds
        #[arg(short, long)]
        quiet_period_ms: Option<u64>,

        /// Cancel every Nth component right after submitting it; 0 for none
        #[arg(long, default_value = "0")]
        cancel_every: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Output format for simulate results
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("assetgen")
        .join("logs")
        .join("assetgen.log")
}
