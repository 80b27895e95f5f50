use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{BlabberError, Result};
use crate::store::{TagCount, TagCountStore};

use super::Database;

const UPSERT_SQL: &str = "INSERT INTO tag_counts (tag, count) VALUES (?1, ?2) \
     ON CONFLICT(tag) DO UPDATE SET count = excluded.count";

fn to_sql_count(tag: &str, count: u64) -> Result<i64> {
    i64::try_from(count).map_err(|_| BlabberError::invalid_value("tag count", format!("{}={}", tag, count)))
}

fn upsert_internal(conn: &Connection, tag: &str, count: u64) -> Result<()> {
    let count = to_sql_count(tag, count)?;
    conn.execute(UPSERT_SQL, params![tag, count])
        .map_err(|e| BlabberError::store_operation(&format!("upsert count for tag '{}'", tag), e))?;
    Ok(())
}

impl TagCountStore for Database {
    fn upsert(&self, tag: &str, count: u64) -> Result<()> {
        let conn = self.lock("upsert tag count")?;
        upsert_internal(&conn, tag, count)
    }

    fn upsert_many(&self, counts: &BTreeMap<String, u64>) -> Result<()> {
        let mut conn = self.lock("merge tag counts")?;
        let tx = conn
            .transaction()
            .map_err(|e| BlabberError::store_operation("begin merge transaction", e))?;

        for (tag, count) in counts {
            upsert_internal(&tx, tag, *count)?;
        }

        tx.commit()
            .map_err(|e| BlabberError::store_operation("commit merge transaction", e))?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<TagCount>> {
        let conn = self.lock("list tag counts")?;
        let mut stmt = conn
            .prepare("SELECT tag, count FROM tag_counts ORDER BY tag")
            .map_err(|e| BlabberError::store_operation("list tag counts", e))?;

        let rows = stmt
            .query_map([], |row| {
                let tag: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok(TagCount::new(tag, count.max(0) as u64))
            })
            .map_err(|e| BlabberError::store_operation("list tag counts", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| BlabberError::store_operation("list tag counts", e))
    }

    fn get(&self, tag: &str) -> Result<Option<TagCount>> {
        let conn = self.lock("get tag count")?;
        conn.query_row(
            "SELECT count FROM tag_counts WHERE tag = ?1",
            params![tag],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map(|count| count.map(|c| TagCount::new(tag, c.max(0) as u64)))
        .map_err(|e| BlabberError::store_operation("get tag count", e))
    }
}
