//! CLI argument parsing for blabber
//!
//! Global flags: --config, --db, --format, --quiet, --verbose, --log-level, --log-json

pub mod args;
pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

pub use args::SessionArgs;
pub use commands::Commands;
pub use output::OutputFormat;

/// Blabber - post short messages, browse them by #tags and @mentions
#[derive(Parser, Debug)]
#[command(name = "blabber")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (blabber.toml)
    #[arg(long, global = true, env = "BLABBER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overrides the configured store path
    #[arg(long, global = true, env = "BLABBER_DB")]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log filter (level or tracing directives), overrides --verbose
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
