//! SQLite database schema for blabber

use rusqlite::{Connection, OptionalExtension};

use crate::error::{BlabberError, Result};

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
-- Posts are append-only
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    author TEXT NOT NULL,
    created TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author);

-- Tag set of each post
CREATE TABLE IF NOT EXISTS post_tags (
    post_id TEXT NOT NULL REFERENCES posts(id),
    tag TEXT NOT NULL,
    PRIMARY KEY (post_id, tag)
);
CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag);

-- Mention set of each post
CREATE TABLE IF NOT EXISTS post_mentions (
    post_id TEXT NOT NULL REFERENCES posts(id),
    mention TEXT NOT NULL,
    PRIMARY KEY (post_id, mention)
);
CREATE INDEX IF NOT EXISTS idx_post_mentions_mention ON post_mentions(mention);

-- Aggregated tag popularity, rewritten by the aggregator
CREATE TABLE IF NOT EXISTS tag_counts (
    tag TEXT PRIMARY KEY,
    count INTEGER NOT NULL CHECK (count >= 0)
);

-- Store metadata
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;

pub(super) fn stored_version(conn: &Connection) -> Result<Option<i64>> {
    let has_meta: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'store_meta'",
            [],
            |r| r.get::<_, i64>(0).map(|n| n > 0),
        )
        .map_err(|e| BlabberError::store_operation("inspect schema", e))?;

    if !has_meta {
        return Ok(None);
    }

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| BlabberError::store_operation("read schema version", e))?;

    Ok(value.and_then(|v| v.parse().ok()))
}

/// Create the schema if missing. Refuses databases written by a newer version.
pub fn create_schema(conn: &Connection) -> Result<()> {
    match stored_version(conn)? {
        None => {
            conn.execute_batch(SCHEMA_SQL)
                .map_err(|e| BlabberError::store_operation("create database schema", e))?;
            conn.execute(
                "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('schema_version', ?1)",
                [CURRENT_SCHEMA_VERSION.to_string()],
            )
            .map_err(|e| BlabberError::store_operation("record schema version", e))?;
            tracing::debug!(version = CURRENT_SCHEMA_VERSION, "created database schema");
        }
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) if v < CURRENT_SCHEMA_VERSION => {
            // No older versions have shipped yet; tables are created idempotently.
            conn.execute_batch(SCHEMA_SQL)
                .map_err(|e| BlabberError::store_operation("upgrade database schema", e))?;
            conn.execute(
                "UPDATE store_meta SET value = ?1 WHERE key = 'schema_version'",
                [CURRENT_SCHEMA_VERSION.to_string()],
            )
            .map_err(|e| BlabberError::store_operation("record schema version", e))?;
            tracing::info!(
                "Database schema updated from version {} to {}",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        Some(v) => {
            return Err(BlabberError::invalid_value(
                "database schema version",
                format!("{} (newest supported is {})", v, CURRENT_SCHEMA_VERSION),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
pub fn force_set_schema_version(conn: &Connection, version: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('schema_version', ?1)",
        [version.to_string()],
    )?;
    Ok(())
}
