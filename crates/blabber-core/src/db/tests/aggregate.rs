use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::aggregate::Aggregator;
use crate::db::*;
use crate::post::Post;
use crate::store::{PostStore, TagCountStore};
use tempfile::tempdir;

const WRITERS: usize = 3;
const POSTS_PER_WRITER: usize = 40;

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn test_background_aggregator_alongside_foreground_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blabber.db");
    let foreground = Arc::new(Database::open(&path).unwrap());
    let background = Arc::new(Database::open(&path).unwrap());

    let handle = Aggregator::new(background.clone(), background)
        .with_interval(Duration::from_millis(5))
        .spawn()
        .unwrap();

    let writers: Vec<_> = (0..WRITERS)
        .map(|i| {
            let db = Arc::clone(&foreground);
            thread::spawn(move || {
                for j in 0..POSTS_PER_WRITER {
                    db.append(Post::compose(format!("user{i}"), format!("#load {j}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let expected = (WRITERS * POSTS_PER_WRITER) as u64;
    assert_eq!(foreground.count().unwrap(), expected);

    // Every append has committed, so a later full cycle sees all of them.
    assert!(wait_until(Duration::from_secs(10), || {
        foreground
            .get("load")
            .unwrap()
            .is_some_and(|entry| entry.count == expected)
    }));

    let stats = handle.shutdown().unwrap();
    assert_eq!(stats.cycles_failed, 0);
    assert!(stats.cycles_completed >= 1);
}
