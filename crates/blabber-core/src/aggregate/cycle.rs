use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::store::{PostStore, TagCountStore};

/// Step of a cycle, used to label aborted cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Scan,
    Merge,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Scan => write!(f, "scan"),
            CyclePhase::Merge => write!(f, "merge"),
        }
    }
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Posts visited by the scan
    pub posts_scanned: u64,
    /// Tag entries written to the count store
    pub tags_merged: usize,
    pub elapsed: Duration,
}

/// Per-tag post counts from one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTally {
    pub counts: BTreeMap<String, u64>,
    pub posts_scanned: u64,
}

/// Map phase: number of posts carrying each tag.
///
/// A post contributes at most one to a tag however often the tag appears in
/// its text, since its tag set is already deduplicated.
pub fn count_tags(posts: &dyn PostStore) -> Result<TagTally> {
    let mut tally = TagTally::default();

    posts.scan_all(&mut |post| {
        tally.posts_scanned += 1;
        for tag in &post.tags {
            *tally.counts.entry(tag.clone()).or_insert(0) += 1;
        }
    })?;

    Ok(tally)
}

/// Merge phase: write every nonzero count, leave other stored tags alone
pub fn merge_counts(store: &dyn TagCountStore, counts: &BTreeMap<String, u64>) -> Result<usize> {
    let nonzero: BTreeMap<String, u64> = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(tag, count)| (tag.clone(), *count))
        .collect();

    if nonzero.is_empty() {
        return Ok(0);
    }

    store.upsert_many(&nonzero)?;
    Ok(nonzero.len())
}
