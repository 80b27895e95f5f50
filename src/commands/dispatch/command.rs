//! Command trait and context for dispatching commands

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use blabber_core::config::BlabberConfig;
use blabber_core::db::Database;
use blabber_core::error::Result;

use super::macros::trace_command;
use crate::cli::Cli;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: BlabberConfig,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, config: BlabberConfig, start: Instant) -> Self {
        Self { cli, config, start }
    }

    /// Database path: `--db` first, then the configuration
    pub fn db_path(&self) -> PathBuf {
        self.cli
            .db
            .clone()
            .unwrap_or_else(|| self.config.db_path())
    }

    /// Open a fresh handle on the configured database
    pub fn open_database(&self) -> Result<Arc<Database>> {
        let db = Database::open(&self.db_path())?;
        trace_command!(self.cli, self.start, "open_database");
        Ok(Arc::new(db))
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("blabber {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Post short messages and browse them by #tags and @mentions.");
        println!();
        println!("Run `blabber --help` for usage information.");
        Ok(())
    }
}
