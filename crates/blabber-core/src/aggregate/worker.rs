//! Background aggregation worker
//!
//! The worker runs cycles back to back on a dedicated thread, sleeping a
//! fixed interval between them. Cancellation is cooperative and only looked
//! at between cycles: a cycle in flight always finishes and merges, and the
//! sleep is not interrupted, so stopping can take up to one interval plus one
//! cycle.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::DEFAULT_INTERVAL_MS;
use crate::error::{BlabberError, Result};
use crate::store::{PostStore, TagCountStore};
use crate::trace_time;

use super::cycle::{count_tags, merge_counts, CyclePhase, CycleReport};

/// Shared cancellation flag, checked at cycle boundaries
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the aggregator is in its lifecycle
///
/// `Idle -> Scanning -> Merging -> Idle` per cycle; once cancellation is
/// requested the worker moves to `Cancelling` at the next boundary and then
/// to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AggregatorState {
    Idle = 0,
    Scanning = 1,
    Merging = 2,
    Cancelling = 3,
    Stopped = 4,
}

impl AggregatorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => AggregatorState::Idle,
            1 => AggregatorState::Scanning,
            2 => AggregatorState::Merging,
            3 => AggregatorState::Cancelling,
            _ => AggregatorState::Stopped,
        }
    }
}

/// Totals reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
}

#[derive(Debug)]
struct Status {
    state: AtomicU8,
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
}

impl Status {
    fn new() -> Self {
        Status {
            state: AtomicU8::new(AggregatorState::Idle as u8),
            cycles_completed: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
        }
    }

    fn state(&self) -> AggregatorState {
        AggregatorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: AggregatorState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            cycles_completed: self.cycles_completed.load(Ordering::SeqCst),
            cycles_failed: self.cycles_failed.load(Ordering::SeqCst),
        }
    }
}

/// Recompute-and-merge tag aggregator over injected stores
pub struct Aggregator {
    posts: Arc<dyn PostStore>,
    counts: Arc<dyn TagCountStore>,
    interval: Duration,
    cancel: CancellationToken,
    status: Arc<Status>,
}

impl Aggregator {
    pub fn new(posts: Arc<dyn PostStore>, counts: Arc<dyn TagCountStore>) -> Self {
        Aggregator {
            posts,
            counts,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            cancel: CancellationToken::new(),
            status: Arc::new(Status::new()),
        }
    }

    /// Pause between the end of one cycle and the start of the next
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> AggregatorState {
        self.status.state()
    }

    /// Run one scan-count-merge cycle on the calling thread.
    ///
    /// Failures come back as `CycleAborted` naming the phase; nothing is
    /// merged when the scan fails.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let start = Instant::now();

        self.status.set_state(AggregatorState::Scanning);
        let tally = count_tags(self.posts.as_ref())
            .map_err(|e| BlabberError::cycle_aborted(CyclePhase::Scan, e))?;
        trace_time!(start, "aggregate_scan", posts = tally.posts_scanned);

        self.status.set_state(AggregatorState::Merging);
        let tags_merged = merge_counts(self.counts.as_ref(), &tally.counts)
            .map_err(|e| BlabberError::cycle_aborted(CyclePhase::Merge, e))?;

        Ok(CycleReport {
            posts_scanned: tally.posts_scanned,
            tags_merged,
            elapsed: start.elapsed(),
        })
    }

    /// Start the cycle loop on a background thread
    pub fn spawn(self) -> Result<AggregatorHandle> {
        let cancel = self.cancel.clone();
        let status = Arc::clone(&self.status);

        let thread = thread::Builder::new()
            .name("blabber-aggregator".to_string())
            .spawn(move || self.run_loop())?;

        Ok(AggregatorHandle {
            cancel,
            status,
            thread: Some(thread),
        })
    }

    fn run_loop(self) -> AggregatorStats {
        tracing::info!(interval = ?self.interval, "aggregator started");
        let mut cycle = 0u64;

        while !self.cancel.is_cancelled() {
            cycle += 1;

            match self.run_cycle() {
                Ok(report) => {
                    self.status.cycles_completed.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(
                        cycle,
                        posts = report.posts_scanned,
                        tags = report.tags_merged,
                        elapsed = ?report.elapsed,
                        "aggregation cycle complete"
                    );
                }
                Err(e) => {
                    // One bad cycle never stops the worker; the next starts fresh.
                    self.status.cycles_failed.fetch_add(1, Ordering::SeqCst);
                    tracing::error!(cycle, error = %e, "aggregation cycle abandoned");
                }
            }

            if self.cancel.is_cancelled() {
                self.status.set_state(AggregatorState::Cancelling);
            } else {
                self.status.set_state(AggregatorState::Idle);
            }

            // Runs in full even once cancelled; stopping waits out this interval.
            thread::sleep(self.interval);
        }

        self.status.set_state(AggregatorState::Cancelling);
        let stats = self.status.stats();
        self.status.set_state(AggregatorState::Stopped);
        tracing::info!(
            completed = stats.cycles_completed,
            failed = stats.cycles_failed,
            "aggregator stopped"
        );
        stats
    }
}

/// Control handle for a running aggregator
pub struct AggregatorHandle {
    cancel: CancellationToken,
    status: Arc<Status>,
    thread: Option<JoinHandle<AggregatorStats>>,
}

impl AggregatorHandle {
    /// Ask the worker to stop at the next cycle boundary. Does not block.
    pub fn cancel(&self) {
        self.cancel.cancel();
        // An idle worker is only sleeping, so it is already between cycles.
        let _ = self.status.state.compare_exchange(
            AggregatorState::Idle as u8,
            AggregatorState::Cancelling as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> AggregatorState {
        self.status.state()
    }

    /// Counters so far; the worker keeps updating them while it runs
    pub fn stats(&self) -> AggregatorStats {
        self.status.stats()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.status.cycles_completed.load(Ordering::SeqCst)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.status.cycles_failed.load(Ordering::SeqCst)
    }

    /// Cancel and wait for the worker to finish its current cycle
    pub fn shutdown(mut self) -> Result<AggregatorStats> {
        self.cancel();
        self.wait()
    }

    /// Wait for the worker to stop on its own (after `cancel`)
    pub fn join(mut self) -> Result<AggregatorStats> {
        self.wait()
    }

    fn wait(&mut self) -> Result<AggregatorStats> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| BlabberError::Other("aggregator thread panicked".to_string())),
            None => Ok(self.status.stats()),
        }
    }
}

impl Drop for AggregatorHandle {
    fn drop(&mut self) {
        // Signal only; a dropped handle never blocks its owner.
        if self.thread.is_some() {
            self.cancel.cancel();
        }
    }
}
