//! `blabber post` command - annotate and store a message

use std::io;

use tracing::debug;

use blabber_core::error::Result;
use blabber_core::post::Post;
use blabber_core::store::PostStore;

use super::dispatch::CommandContext;
use super::output;

/// Execute the post command
pub fn execute(ctx: &CommandContext, user: &str, text: &str) -> Result<()> {
    let db = ctx.open_database()?;
    let post = publish(db.as_ref(), user, text)?;

    if ctx.cli.verbose {
        debug!(
            tags = post.tags.len(),
            mentions = post.mentions.len(),
            elapsed = ?ctx.start.elapsed(),
            "post"
        );
    }

    if ctx.cli.quiet {
        return Ok(());
    }
    output::write_created(&mut io::stdout().lock(), ctx.cli.format, &post)
}

/// Compose a post and append it, returning it with its assigned id
pub fn publish(store: &dyn PostStore, user: &str, text: &str) -> Result<Post> {
    let mut post = Post::compose(user, text);
    let id = store.append(post.clone())?;
    post.id = Some(id);
    Ok(post)
}
