//! Tag popularity aggregation
//!
//! Each cycle scans the whole post corpus, counts how many posts carry each
//! tag and merges the result into the tag count store. Merging overwrites
//! or inserts; tags missing from the current corpus keep their last count.
//! Counts are recomputed from scratch every cycle, never incremented per post.

mod cycle;
mod worker;

pub use cycle::{count_tags, merge_counts, CyclePhase, CycleReport, TagTally};
pub use worker::{
    Aggregator, AggregatorHandle, AggregatorState, AggregatorStats, CancellationToken,
};

#[cfg(test)]
mod tests;
