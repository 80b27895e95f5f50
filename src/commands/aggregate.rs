//! `blabber aggregate` command - one aggregation cycle in the foreground

use serde::Serialize;
use tracing::debug;

use blabber_core::aggregate::Aggregator;
use blabber_core::error::Result;

use super::dispatch::CommandContext;
use crate::cli::OutputFormat;

#[derive(Serialize)]
struct AggregateOutput {
    posts_scanned: u64,
    tags_merged: usize,
    elapsed_ms: u64,
}

/// Execute the aggregate command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let db = ctx.open_database()?;
    let report = Aggregator::new(db.clone(), db).run_cycle()?;

    if ctx.cli.verbose {
        debug!(elapsed = ?ctx.start.elapsed(), "aggregate");
    }

    match ctx.cli.format {
        OutputFormat::Json => {
            let output = AggregateOutput {
                posts_scanned: report.posts_scanned,
                tags_merged: report.tags_merged,
                elapsed_ms: report.elapsed.as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !ctx.cli.quiet {
                println!(
                    "Aggregated {} tag(s) from {} post(s)",
                    report.tags_merged, report.posts_scanned
                );
            }
        }
    }

    Ok(())
}
