//! Command dispatch logic for blabber

use std::time::Instant;

use blabber_core::config::BlabberConfig;
use blabber_core::error::Result;
use tracing::debug;

use crate::cli::{Cli, Commands};

mod command;
mod macros;

pub use command::CommandContext;
use command::{Command, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let config = BlabberConfig::load_or_default(cli.config.as_deref())?;

    debug!(elapsed = ?start.elapsed(), "load_config");

    let ctx = CommandContext::new(cli, config, start);

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Post { user, text } => crate::commands::post::execute(ctx, user, text),
            Commands::Tags => crate::commands::query::execute_tags(ctx),
            Commands::WithTag { tag } => crate::commands::query::execute_with_tag(ctx, tag),
            Commands::Mentions { user } => crate::commands::query::execute_mentions(ctx, user),
            Commands::Aggregate => crate::commands::aggregate::execute(ctx),
            Commands::Session(args) => crate::commands::session::execute(ctx, args),
        }
    }
}
