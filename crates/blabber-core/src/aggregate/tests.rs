use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::error::{BlabberError, Result};
use crate::post::{Post, PostId};
use crate::store::memory::MemoryStore;
use crate::store::{PostStore, TagCount, TagCountStore};

const FAST: Duration = Duration::from_millis(10);

fn post_with_tags(tags: &[&str]) -> Post {
    let mut post = Post::compose("tester", "seeded");
    post.tags = tags.iter().map(|t| t.to_string()).collect();
    post
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn counts_of(store: &dyn TagCountStore) -> BTreeMap<String, u64> {
    store
        .list_all()
        .unwrap()
        .into_iter()
        .map(|entry| (entry.tag, entry.count))
        .collect()
}

/// Post store whose first scan blocks until the test lets it continue
struct GatedStore {
    inner: MemoryStore,
    started: Mutex<Option<Sender<()>>>,
    release: Mutex<Option<Receiver<()>>>,
}

impl GatedStore {
    fn new(inner: MemoryStore) -> (Self, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = GatedStore {
            inner,
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        };
        (store, started_rx, release_tx)
    }
}

impl PostStore for GatedStore {
    fn append(&self, post: Post) -> Result<PostId> {
        self.inner.append(post)
    }

    fn scan_all(&self, visit: &mut dyn FnMut(&Post)) -> Result<()> {
        if let Some(started) = self.started.lock().unwrap().take() {
            let _ = started.send(());
        }
        if let Some(release) = self.release.lock().unwrap().take() {
            let _ = release.recv();
        }
        self.inner.scan_all(visit)
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.inner.find_by_tag(tag)
    }

    fn find_by_mention(&self, user: &str) -> Result<Vec<Post>> {
        self.inner.find_by_mention(user)
    }

    fn count(&self) -> Result<u64> {
        self.inner.count()
    }
}

#[test]
fn test_count_tags_counts_posts_not_occurrences() {
    let store = MemoryStore::new();
    store.append(Post::compose("a", "#x #x #x")).unwrap();
    store.append(Post::compose("b", "#x #y")).unwrap();

    let tally = count_tags(&store).unwrap();
    assert_eq!(tally.posts_scanned, 2);
    assert_eq!(tally.counts.get("x"), Some(&2));
    assert_eq!(tally.counts.get("y"), Some(&1));
}

#[test]
fn test_cycle_computes_counts_from_corpus() {
    let store = Arc::new(MemoryStore::new());
    store.append(post_with_tags(&["x"])).unwrap();
    store.append(post_with_tags(&["x", "y"])).unwrap();
    store.append(post_with_tags(&[])).unwrap();

    let aggregator = Aggregator::new(store.clone(), store.clone());
    let report = aggregator.run_cycle().unwrap();

    assert_eq!(report.posts_scanned, 3);
    assert_eq!(report.tags_merged, 2);
    assert_eq!(
        store.list_all().unwrap(),
        vec![TagCount::new("x", 2), TagCount::new("y", 1)]
    );
}

#[test]
fn test_cycle_merges_without_removing_stale_tags() {
    let store = Arc::new(MemoryStore::new());
    store.upsert("z", 5).unwrap();
    store.append(post_with_tags(&["x"])).unwrap();

    Aggregator::new(store.clone(), store.clone())
        .run_cycle()
        .unwrap();

    let counts = counts_of(&*store);
    assert_eq!(counts.get("z"), Some(&5));
    assert_eq!(counts.get("x"), Some(&1));
}

#[test]
fn test_repeated_cycles_are_idempotent() {
    let store = Arc::new(MemoryStore::new());
    store.append(post_with_tags(&["x", "y"])).unwrap();
    let aggregator = Aggregator::new(store.clone(), store.clone());

    aggregator.run_cycle().unwrap();
    let first = counts_of(&*store);
    aggregator.run_cycle().unwrap();

    assert_eq!(counts_of(&*store), first);
}

#[test]
fn test_recompute_overwrites_previous_count() {
    let store = Arc::new(MemoryStore::new());
    store.upsert("x", 99).unwrap();
    store.append(post_with_tags(&["x"])).unwrap();

    Aggregator::new(store.clone(), store.clone())
        .run_cycle()
        .unwrap();

    assert_eq!(store.get("x").unwrap(), Some(TagCount::new("x", 1)));
}

#[test]
fn test_empty_corpus_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let report = Aggregator::new(store.clone(), store.clone())
        .run_cycle()
        .unwrap();

    assert_eq!(report.tags_merged, 0);
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn test_scan_failure_aborts_cycle_without_merging() {
    let posts = Arc::new(MemoryStore::new());
    let counts = Arc::new(MemoryStore::new());
    posts.append(post_with_tags(&["x"])).unwrap();
    posts.set_unavailable(true);

    let err = Aggregator::new(posts, counts.clone())
        .run_cycle()
        .unwrap_err();

    assert!(matches!(
        err,
        BlabberError::CycleAborted { ref phase, .. } if phase == "scan"
    ));
    assert!(counts.list_all().unwrap().is_empty());
}

#[test]
fn test_merge_failure_reports_merge_phase() {
    let posts = Arc::new(MemoryStore::new());
    let counts = Arc::new(MemoryStore::new());
    posts.append(post_with_tags(&["x"])).unwrap();
    counts.set_unavailable(true);

    let aggregator = Aggregator::new(posts, counts);
    let err = aggregator.run_cycle().unwrap_err();

    assert!(matches!(
        err,
        BlabberError::CycleAborted { ref phase, .. } if phase == "merge"
    ));
}

#[test]
fn test_worker_refreshes_counts_in_background() {
    let store = Arc::new(MemoryStore::new());
    store.append(post_with_tags(&["x"])).unwrap();

    let handle = Aggregator::new(store.clone(), store.clone())
        .with_interval(FAST)
        .spawn()
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        store.get("x").unwrap() == Some(TagCount::new("x", 1))
    }));

    // A post appended later shows up in a following cycle
    store.append(post_with_tags(&["x"])).unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        store.get("x").unwrap() == Some(TagCount::new("x", 2))
    }));

    let stats = handle.shutdown().unwrap();
    assert!(stats.cycles_completed >= 2);
    assert_eq!(stats.cycles_failed, 0);
}

#[test]
fn test_worker_survives_failed_cycles() {
    let store = Arc::new(MemoryStore::new());
    store.append(post_with_tags(&["x"])).unwrap();
    store.set_unavailable(true);

    let handle = Aggregator::new(store.clone(), store.clone())
        .with_interval(FAST)
        .spawn()
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        handle.cycles_failed() >= 2
    }));

    store.set_unavailable(false);
    assert!(wait_until(Duration::from_secs(5), || {
        handle.cycles_completed() >= 1
    }));

    let stats = handle.shutdown().unwrap();
    assert!(stats.cycles_failed >= 2);
    assert_eq!(store.get("x").unwrap(), Some(TagCount::new("x", 1)));
}

#[test]
fn test_cancel_before_start_runs_no_cycle() {
    let store = Arc::new(MemoryStore::new());
    store.append(post_with_tags(&["x"])).unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let handle = Aggregator::new(store.clone(), store.clone())
        .with_cancellation(token)
        .spawn()
        .unwrap();
    let stats = handle.join().unwrap();

    assert_eq!(stats, AggregatorStats::default());
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn test_cancel_lets_in_flight_cycle_finish_and_merge() {
    let inner = MemoryStore::new();
    inner.append(post_with_tags(&["x"])).unwrap();
    inner.append(post_with_tags(&["x", "y"])).unwrap();
    let (gated, started, release) = GatedStore::new(inner);
    let counts = Arc::new(MemoryStore::new());

    let handle = Aggregator::new(Arc::new(gated), counts.clone())
        .with_interval(FAST)
        .spawn()
        .unwrap();

    started.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(handle.state(), AggregatorState::Scanning);

    handle.cancel();
    assert!(handle.is_cancelled());
    release.send(()).unwrap();

    let stats = handle.join().unwrap();
    assert_eq!(stats.cycles_completed, 1);
    assert_eq!(
        counts.list_all().unwrap(),
        vec![TagCount::new("x", 2), TagCount::new("y", 1)]
    );
}

#[test]
fn test_state_reaches_stopped_after_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let handle = Aggregator::new(store.clone(), store.clone())
        .with_interval(FAST)
        .spawn()
        .unwrap();
    let token = handle.cancellation_token();

    assert!(wait_until(Duration::from_secs(5), || {
        handle.stats().cycles_completed >= 1
    }));

    token.cancel();
    assert!(wait_until(Duration::from_secs(5), || {
        handle.state() == AggregatorState::Stopped
    }));
    handle.join().unwrap();
}

#[test]
fn test_shutdown_waits_out_the_current_sleep() {
    let store = Arc::new(MemoryStore::new());
    let interval = Duration::from_millis(300);
    let handle = Aggregator::new(store.clone(), store.clone())
        .with_interval(interval)
        .spawn()
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        handle.cycles_completed() >= 1
    }));

    // The first cycle just finished, so the worker is early in its sleep.
    let start = Instant::now();
    let stats = handle.shutdown().unwrap();
    assert!(start.elapsed() >= interval / 3);
    assert_eq!(stats.cycles_completed, 1);
}
