use crate::db::schema::force_set_schema_version;
use crate::db::*;
use crate::error::BlabberError;
use crate::post::Post;
use crate::store::PostStore;
use tempfile::tempdir;

#[test]
fn test_database_open_creates_tables() {
    let dir = tempdir().unwrap();
    let db = Database::open(&dir.path().join("blabber.db")).unwrap();

    let count: i64 = db
        .lock("test")
        .unwrap()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
            [],
            |row| row.get(0),
        )
        .unwrap();

    assert_eq!(count, 5);
    assert_eq!(db.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_database_open_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("blabber.db");

    let db = Database::open(&path).unwrap();
    assert_eq!(db.path(), Some(path.as_path()));
    assert!(path.exists());
}

#[test]
fn test_reopen_keeps_posts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blabber.db");

    {
        let db = Database::open(&path).unwrap();
        db.append(Post::compose("alice", "persist #me")).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.count().unwrap(), 1);
    assert_eq!(db.find_by_tag("me").unwrap().len(), 1);
}

#[test]
fn test_newer_schema_version_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blabber.db");

    {
        let db = Database::open(&path).unwrap();
        let conn = db.lock("test").unwrap();
        force_set_schema_version(&conn, CURRENT_SCHEMA_VERSION + 1).unwrap();
    }

    let err = Database::open(&path).unwrap_err();
    assert!(matches!(err, BlabberError::InvalidValue { .. }));
}

#[test]
fn test_open_unreachable_path_is_store_unavailable() {
    let dir = tempdir().unwrap();
    // A regular file where a directory is expected
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = Database::open(&blocker.join("blabber.db")).unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn test_in_memory_database_has_no_path() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.path().is_none());
    assert_eq!(db.count().unwrap(), 0);
}
