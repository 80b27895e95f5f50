use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::{BlabberError, Result};
use crate::post::{Post, PostId};
use crate::store::PostStore;

use super::Database;

/// Posts with their tag and mention sets folded into JSON arrays, one row per post
const SELECT_POSTS: &str = r#"
    SELECT p.id, p.text, p.author, p.created,
        (SELECT json_group_array(tag) FROM post_tags WHERE post_id = p.id),
        (SELECT json_group_array(mention) FROM post_mentions WHERE post_id = p.id)
    FROM posts p
"#;

struct PostRow {
    id: String,
    text: String,
    author: String,
    created: String,
    tags_json: String,
    mentions_json: String,
}

fn extract_post_row(row: &Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        text: row.get(1)?,
        author: row.get(2)?,
        created: row.get(3)?,
        tags_json: row.get(4)?,
        mentions_json: row.get(5)?,
    })
}

impl PostRow {
    fn into_post(self) -> Result<Post> {
        let created_at = DateTime::parse_from_rfc3339(&self.created)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                BlabberError::Other(format!("invalid timestamp on post {}: {}", self.id, e))
            })?;
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags_json)?;
        let mentions: BTreeSet<String> = serde_json::from_str(&self.mentions_json)?;

        Ok(Post {
            id: Some(PostId::from_stored(self.id)),
            text: self.text,
            tags,
            mentions,
            author: self.author,
            created_at,
        })
    }
}

fn query_posts(
    conn: &Connection,
    operation: &str,
    filter: &str,
    param: &str,
) -> Result<Vec<Post>> {
    let sql = format!("{} {} ORDER BY p.created, p.id", SELECT_POSTS, filter);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| BlabberError::store_operation(operation, e))?;

    let rows = stmt
        .query_map(params![param], extract_post_row)
        .map_err(|e| BlabberError::store_operation(operation, e))?;

    let mut posts = Vec::new();
    for row in rows {
        let row = row.map_err(|e| BlabberError::store_operation(operation, e))?;
        posts.push(row.into_post()?);
    }
    Ok(posts)
}

impl PostStore for Database {
    fn append(&self, mut post: Post) -> Result<PostId> {
        let id = post.id.get_or_insert_with(PostId::generate).clone();
        let mut conn = self.lock("append post")?;

        let tx = conn
            .transaction()
            .map_err(|e| BlabberError::store_operation("begin append transaction", e))?;

        tx.execute(
            "INSERT INTO posts (id, text, author, created) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.as_str(),
                &post.text,
                &post.author,
                post.created_at.to_rfc3339()
            ],
        )
        .map_err(|e| BlabberError::store_operation(&format!("insert post {}", id), e))?;

        for tag in &post.tags {
            tx.execute(
                "INSERT INTO post_tags (post_id, tag) VALUES (?1, ?2)",
                params![id.as_str(), tag],
            )
            .map_err(|e| {
                BlabberError::store_operation(&format!("insert tag '{}' for post {}", tag, id), e)
            })?;
        }

        for mention in &post.mentions {
            tx.execute(
                "INSERT INTO post_mentions (post_id, mention) VALUES (?1, ?2)",
                params![id.as_str(), mention],
            )
            .map_err(|e| {
                BlabberError::store_operation(
                    &format!("insert mention '{}' for post {}", mention, id),
                    e,
                )
            })?;
        }

        tx.commit()
            .map_err(|e| BlabberError::store_operation("commit append transaction", e))?;

        tracing::debug!(post_id = %id, tags = post.tags.len(), mentions = post.mentions.len(), "appended post");
        Ok(id)
    }

    fn scan_all(&self, visit: &mut dyn FnMut(&Post)) -> Result<()> {
        // One statement reads one consistent snapshot. The lock is released
        // before any post is visited, so appends on this handle never wait
        // on the visitor.
        let rows = {
            let conn = self.lock("scan posts")?;
            let mut stmt = conn
                .prepare(SELECT_POSTS)
                .map_err(|e| BlabberError::store_operation("scan posts", e))?;
            let rows = stmt
                .query_map([], extract_post_row)
                .map_err(|e| BlabberError::store_operation("scan posts", e))?
                .collect::<rusqlite::Result<Vec<PostRow>>>()
                .map_err(|e| BlabberError::store_operation("scan posts", e))?;
            rows
        };

        for row in rows {
            visit(&row.into_post()?);
        }

        Ok(())
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        let conn = self.lock("find posts by tag")?;
        query_posts(
            &conn,
            "find posts by tag",
            "WHERE EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag = ?1)",
            tag,
        )
    }

    fn find_by_mention(&self, user: &str) -> Result<Vec<Post>> {
        let conn = self.lock("find posts by mention")?;
        query_posts(
            &conn,
            "find posts by mention",
            "WHERE EXISTS (SELECT 1 FROM post_mentions m WHERE m.post_id = p.id AND m.mention = ?1)",
            user,
        )
    }

    fn count(&self) -> Result<u64> {
        let conn = self.lock("count posts")?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))
            .map_err(|e| BlabberError::store_operation("count posts", e))?;
        Ok(count.max(0) as u64)
    }
}
