//! Store contracts shared by the foreground session and the aggregator
//!
//! Both traits take `&self` and require `Send + Sync`: implementations
//! serialize concurrent access internally, callers never lock around them.

pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::post::{Post, PostId};

/// Number of posts carrying a tag, as of the last completed aggregation cycle
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

impl TagCount {
    pub fn new(tag: impl Into<String>, count: u64) -> Self {
        TagCount {
            tag: tag.into(),
            count,
        }
    }
}

/// Append-only post storage with membership queries
pub trait PostStore: Send + Sync {
    /// Persist a post, assigning an id if it has none. Existing posts are never touched.
    fn append(&self, post: Post) -> Result<PostId>;

    /// Stream every stored post to `visit`, in no particular order.
    ///
    /// Each call is an independent scan over the posts visible when it starts.
    /// No internal lock is held while `visit` runs, so other callers (and
    /// `visit` itself) may use the store during a scan.
    fn scan_all(&self, visit: &mut dyn FnMut(&Post)) -> Result<()>;

    /// Posts whose tag set contains `tag`
    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>>;

    /// Posts whose mention set contains `user`
    fn find_by_mention(&self, user: &str) -> Result<Vec<Post>>;

    /// Number of stored posts
    fn count(&self) -> Result<u64>;
}

/// Keyed tag -> count storage
pub trait TagCountStore: Send + Sync {
    /// Insert or overwrite the count for `tag`. Idempotent.
    fn upsert(&self, tag: &str, count: u64) -> Result<()>;

    /// Upsert a batch of counts. Stores that can apply the batch atomically should.
    fn upsert_many(&self, counts: &BTreeMap<String, u64>) -> Result<()> {
        for (tag, count) in counts {
            self.upsert(tag, *count)?;
        }
        Ok(())
    }

    /// Every stored entry, sorted by tag
    fn list_all(&self) -> Result<Vec<TagCount>>;

    /// The entry for a single tag
    fn get(&self, tag: &str) -> Result<Option<TagCount>> {
        Ok(self.list_all()?.into_iter().find(|entry| entry.tag == tag))
    }
}
