//! Rendering of posts and tag counts in human or JSON form

use std::io::Write;

use blabber_core::error::Result;
use blabber_core::post::Post;
use blabber_core::store::TagCount;

use crate::cli::OutputFormat;

/// Strip a leading marker so `#rust` and `rust` name the same tag
pub fn strip_marker(value: &str, marker: char) -> &str {
    value.trim().strip_prefix(marker).unwrap_or(value.trim())
}

pub fn write_posts(out: &mut dyn Write, format: OutputFormat, posts: &[Post]) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for post in posts {
                writeln!(out, "{}", post)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(posts)?)?;
        }
    }
    Ok(())
}

pub fn write_tag_counts(
    out: &mut dyn Write,
    format: OutputFormat,
    counts: &[TagCount],
) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for entry in counts {
                writeln!(out, "{}: {}", entry.tag, entry.count)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(counts)?)?;
        }
    }
    Ok(())
}

/// Confirmation for a newly stored post
pub fn write_created(out: &mut dyn Write, format: OutputFormat, post: &Post) -> Result<()> {
    match format {
        OutputFormat::Human => writeln!(out, "{}", post)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(post)?)?,
    }
    Ok(())
}
