use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::time::Instant;
use tracing::warn;

use crate::error::FatalError;
use crate::system::shutdown::{ShutdownReceiver, ShutdownSender, shutdown_channel};

use super::outcome::WorkerResult;

/// Running totals across merged workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTotals {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub success_count: u64,
    pub connect_error_count: u64,
    pub merged_workers: usize,
    pub fatal_error: Option<FatalError>,
}

impl AggregateTotals {
    /// Adds a worker's counters. The first fatal error seen is kept.
    pub fn absorb(&mut self, result: &WorkerResult) {
        self.bytes_sent = self.bytes_sent.saturating_add(result.bytes_sent);
        self.bytes_received = self.bytes_received.saturating_add(result.bytes_received);
        self.success_count = self.success_count.saturating_add(result.success_count);
        self.connect_error_count = self
            .connect_error_count
            .saturating_add(result.connect_error_count);
        self.merged_workers = self.merged_workers.saturating_add(1);
        if self.fatal_error.is_none() {
            self.fatal_error.clone_from(&result.fatal_error);
        }
    }
}

/// Snapshot handed to report assembly once the run is over.
#[derive(Debug, Clone)]
pub struct AggregateStats {
    pub totals: AggregateTotals,
    pub start_time: Instant,
    pub first_byte_time: Option<Instant>,
    pub end_time: Instant,
}

/// The only state shared between workers.
///
/// `merge` takes the lock, so concurrent merges never lose updates, and a
/// fatal error is stored before the abort signal is raised.
#[derive(Debug)]
pub struct Aggregator {
    totals: Mutex<AggregateTotals>,
    aborted: AtomicBool,
    abort_tx: ShutdownSender,
    completed: AtomicU64,
    progress_interval: u64,
    first_byte: OnceLock<Instant>,
}

impl Aggregator {
    #[must_use]
    pub fn new(progress_interval: u64) -> Self {
        let (abort_tx, _) = shutdown_channel();
        Self {
            totals: Mutex::new(AggregateTotals::default()),
            aborted: AtomicBool::new(false),
            abort_tx,
            completed: AtomicU64::new(0),
            progress_interval: progress_interval.max(1),
            first_byte: OnceLock::new(),
        }
    }

    pub fn merge(&self, result: &WorkerResult) {
        self.lock_totals().absorb(result);
        if result.is_fatal() {
            self.raise_abort();
        }
    }

    /// Records a fatal error that did not come from a worker result.
    pub fn abort(&self, error: FatalError) {
        {
            let mut totals = self.lock_totals();
            if totals.fatal_error.is_none() {
                totals.fatal_error = Some(error);
            }
        }
        self.raise_abort();
    }

    fn raise_abort(&self) {
        if !self.aborted.swap(true, Ordering::SeqCst) {
            drop(self.abort_tx.send(()));
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn subscribe_abort(&self) -> ShutdownReceiver {
        self.abort_tx.subscribe()
    }

    /// Stamps the moment the first worker starts sending. Later calls are no-ops.
    pub fn record_first_byte(&self) {
        self.first_byte.get_or_init(Instant::now);
    }

    #[must_use]
    pub fn first_byte_time(&self) -> Option<Instant> {
        self.first_byte.get().copied()
    }

    /// Counts one completed cycle; returns the new count when it lands on a
    /// progress milestone.
    pub fn record_completed(&self) -> Option<u64> {
        let done = self
            .completed
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1);
        let milestone = done.checked_rem(self.progress_interval).unwrap_or(1) == 0;
        milestone.then_some(done)
    }

    #[must_use]
    pub fn totals(&self) -> AggregateTotals {
        self.lock_totals().clone()
    }

    #[must_use]
    pub fn fatal_error(&self) -> Option<FatalError> {
        self.lock_totals().fatal_error.clone()
    }

    #[must_use]
    pub fn stats(&self, start_time: Instant, end_time: Instant) -> AggregateStats {
        AggregateStats {
            totals: self.totals(),
            start_time,
            first_byte_time: self.first_byte_time(),
            end_time,
        }
    }

    fn lock_totals(&self) -> MutexGuard<'_, AggregateTotals> {
        self.totals.lock().unwrap_or_else(|poisoned| {
            warn!("Aggregator lock poisoned; continuing with recorded totals");
            PoisonError::into_inner(poisoned)
        })
    }
}
