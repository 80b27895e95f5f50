//! In-process store backing both contracts
//!
//! Used for tests and ephemeral runs. A fault switch makes every operation
//! fail with `StoreUnavailable`, standing in for an unreachable backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{BlabberError, Result};
use crate::post::{Post, PostId};

use super::{PostStore, TagCount, TagCountStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RwLock<Vec<Post>>,
    counts: RwLock<BTreeMap<String, u64>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent operations fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BlabberError::store_operation(
                operation,
                "memory store marked unavailable",
            ));
        }
        Ok(())
    }

    fn posts_read(&self, operation: &str) -> Result<RwLockReadGuard<'_, Vec<Post>>> {
        self.check_available(operation)?;
        self.posts
            .read()
            .map_err(|e| BlabberError::store_operation(operation, e))
    }

    fn posts_write(&self, operation: &str) -> Result<RwLockWriteGuard<'_, Vec<Post>>> {
        self.check_available(operation)?;
        self.posts
            .write()
            .map_err(|e| BlabberError::store_operation(operation, e))
    }

    fn counts_read(&self, operation: &str) -> Result<RwLockReadGuard<'_, BTreeMap<String, u64>>> {
        self.check_available(operation)?;
        self.counts
            .read()
            .map_err(|e| BlabberError::store_operation(operation, e))
    }

    fn counts_write(
        &self,
        operation: &str,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<String, u64>>> {
        self.check_available(operation)?;
        self.counts
            .write()
            .map_err(|e| BlabberError::store_operation(operation, e))
    }

    fn filter_posts(&self, operation: &str, keep: impl Fn(&Post) -> bool) -> Result<Vec<Post>> {
        Ok(self
            .posts_read(operation)?
            .iter()
            .filter(|post| keep(post))
            .cloned()
            .collect())
    }
}

impl PostStore for MemoryStore {
    fn append(&self, mut post: Post) -> Result<PostId> {
        let id = post.id.get_or_insert_with(PostId::generate).clone();
        self.posts_write("append post")?.push(post);
        Ok(id)
    }

    fn scan_all(&self, visit: &mut dyn FnMut(&Post)) -> Result<()> {
        // Snapshot under the lock, visit without it so appends are not blocked.
        let snapshot = self.posts_read("scan posts")?.clone();
        for post in &snapshot {
            visit(post);
        }
        Ok(())
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.filter_posts("find posts by tag", |post| post.has_tag(tag))
    }

    fn find_by_mention(&self, user: &str) -> Result<Vec<Post>> {
        self.filter_posts("find posts by mention", |post| post.mentions_user(user))
    }

    fn count(&self) -> Result<u64> {
        Ok(self.posts_read("count posts")?.len() as u64)
    }
}

impl TagCountStore for MemoryStore {
    fn upsert(&self, tag: &str, count: u64) -> Result<()> {
        self.counts_write("upsert tag count")?
            .insert(tag.to_string(), count);
        Ok(())
    }

    fn upsert_many(&self, counts: &BTreeMap<String, u64>) -> Result<()> {
        let mut stored = self.counts_write("merge tag counts")?;
        for (tag, count) in counts {
            stored.insert(tag.clone(), *count);
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<TagCount>> {
        Ok(self
            .counts_read("list tag counts")?
            .iter()
            .map(|(tag, count)| TagCount::new(tag.clone(), *count))
            .collect())
    }

    fn get(&self, tag: &str) -> Result<Option<TagCount>> {
        Ok(self
            .counts_read("get tag count")?
            .get(tag)
            .map(|count| TagCount::new(tag, *count)))
    }
}
