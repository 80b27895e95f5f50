//! Post model
//!
//! A post is an immutable message with the tags and mentions extracted from
//! its text and the name of the user who wrote it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::annotate;

/// Opaque post identifier (a ULID rendered as text)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        PostId(Ulid::new().to_string())
    }

    /// Wrap an identifier read back from a store
    pub fn from_stored(id: impl Into<String>) -> Self {
        PostId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Assigned by the post store on append when absent
    pub id: Option<PostId>,
    pub text: String,
    pub tags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Build a new, not yet stored post by running `text` through the annotator
    pub fn compose(author: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let annotations = annotate::extract(&text);
        Post {
            id: None,
            tags: annotations.tags,
            mentions: annotations.mentions,
            text,
            author: author.into(),
            created_at: Utc::now(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn mentions_user(&self, user: &str) -> bool {
        self.mentions.contains(user)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\"", self.author, self.text)
    }
}
