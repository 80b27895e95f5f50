use std::collections::BTreeMap;

use crate::db::*;
use crate::store::{TagCount, TagCountStore};

#[test]
fn test_upsert_inserts_then_overwrites() {
    let db = Database::open_in_memory().unwrap();
    db.upsert("x", 1).unwrap();
    db.upsert("x", 7).unwrap();

    assert_eq!(db.get("x").unwrap(), Some(TagCount::new("x", 7)));
}

#[test]
fn test_upsert_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    db.upsert("x", 2).unwrap();
    db.upsert("x", 2).unwrap();

    assert_eq!(db.list_all().unwrap(), vec![TagCount::new("x", 2)]);
}

#[test]
fn test_upsert_many_merges_without_removing() {
    let db = Database::open_in_memory().unwrap();
    db.upsert("z", 5).unwrap();
    db.upsert("x", 1).unwrap();

    let counts: BTreeMap<String, u64> = [("x".to_string(), 2), ("y".to_string(), 1)]
        .into_iter()
        .collect();
    db.upsert_many(&counts).unwrap();

    assert_eq!(
        db.list_all().unwrap(),
        vec![
            TagCount::new("x", 2),
            TagCount::new("y", 1),
            TagCount::new("z", 5),
        ]
    );
}

#[test]
fn test_get_missing_tag_is_none() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.get("absent").unwrap(), None);
}

#[test]
fn test_count_beyond_i64_rejected() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.upsert("huge", u64::MAX).is_err());
    assert!(db.list_all().unwrap().is_empty());
}
