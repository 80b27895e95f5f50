//! Read-side facade over the post and tag count stores

use std::sync::Arc;

use crate::error::Result;
use crate::post::Post;
use crate::store::{PostStore, TagCount, TagCountStore};

/// Delegates the three user-facing queries to the stores. No caching.
#[derive(Clone)]
pub struct QueryFacade {
    posts: Arc<dyn PostStore>,
    counts: Arc<dyn TagCountStore>,
}

impl QueryFacade {
    pub fn new(posts: Arc<dyn PostStore>, counts: Arc<dyn TagCountStore>) -> Self {
        QueryFacade { posts, counts }
    }

    /// Every tag count as of the last completed aggregation cycle, sorted by tag
    pub fn tag_counts(&self) -> Result<Vec<TagCount>> {
        self.counts.list_all()
    }

    pub fn posts_with_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.posts.find_by_tag(tag)
    }

    pub fn posts_mentioning(&self, user: &str) -> Result<Vec<Post>> {
        self.posts.find_by_mention(user)
    }
}
