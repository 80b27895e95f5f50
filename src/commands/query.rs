//! `blabber tags`, `blabber with-tag` and `blabber mentions` commands

use std::io;

use blabber_core::error::Result;
use blabber_core::query::QueryFacade;

use super::dispatch::CommandContext;
use super::output::{self, strip_marker};

fn facade(ctx: &CommandContext) -> Result<QueryFacade> {
    let db = ctx.open_database()?;
    Ok(QueryFacade::new(db.clone(), db))
}

/// Execute the tags command
pub fn execute_tags(ctx: &CommandContext) -> Result<()> {
    let counts = facade(ctx)?.tag_counts()?;
    output::write_tag_counts(&mut io::stdout().lock(), ctx.cli.format, &counts)
}

/// Execute the with-tag command
pub fn execute_with_tag(ctx: &CommandContext, tag: &str) -> Result<()> {
    let posts = facade(ctx)?.posts_with_tag(strip_marker(tag, '#'))?;
    output::write_posts(&mut io::stdout().lock(), ctx.cli.format, &posts)
}

/// Execute the mentions command
pub fn execute_mentions(ctx: &CommandContext, user: &str) -> Result<()> {
    let posts = facade(ctx)?.posts_mentioning(strip_marker(user, '@'))?;
    output::write_posts(&mut io::stdout().lock(), ctx.cli.format, &posts)
}
