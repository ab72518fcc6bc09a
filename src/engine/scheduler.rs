use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::BenchmarkConfig;
use crate::driver::DriverFactory;
use crate::error::{AppError, AppResult, FatalError, ValidationError};
use crate::report::{AbortReport, FinalReport};
use crate::system::shutdown::ShutdownSender;

use super::aggregator::Aggregator;
use super::progress::{ProgressObserver, TracingProgress};
use super::worker::run_worker;

/// Lifecycle of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Terminal result of a run: statistics, or the fatal error that ended it.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(FinalReport),
    Aborted(AbortReport),
}

/// Splits the requested work across `concurrency` workers, runs them and
/// assembles the report.
///
/// Each worker gets `total_requests / concurrency` cycles; the remainder is
/// never sent. The first fatal error (from a worker, a panicking worker task
/// or an external shutdown) ends the wait: workers still in flight are
/// detached and finish their current cycle on their own.
pub struct Scheduler<F> {
    config: Arc<BenchmarkConfig>,
    factory: F,
    observer: Option<Arc<dyn ProgressObserver>>,
    state: RunState,
}

impl<F> Scheduler<F>
where
    F: DriverFactory,
{
    /// Verbose configs get the `tracing` progress observer.
    #[must_use]
    pub fn new(config: Arc<BenchmarkConfig>, factory: F) -> Self {
        let observer: Option<Arc<dyn ProgressObserver>> = if config.verbose {
            Some(Arc::new(TracingProgress))
        } else {
            None
        };
        Self {
            config,
            factory,
            observer,
            state: RunState::Idle,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Runs the benchmark once.
    ///
    /// A notification on `shutdown_tx` aborts the run with
    /// [`FatalError::Interrupted`].
    ///
    /// # Errors
    ///
    /// Returns an error when the run was already started or when a driver
    /// cannot be created. Fatal protocol errors are not errors here; they
    /// come back as [`RunOutcome::Aborted`].
    pub async fn run(&mut self, shutdown_tx: &ShutdownSender) -> AppResult<RunOutcome> {
        if self.state != RunState::Idle {
            return Err(AppError::validation(ValidationError::RunAlreadyStarted));
        }

        let config = Arc::clone(&self.config);
        let workers = config.concurrency.get();
        let cycles = config.cycles_per_worker();
        let dropped = config.dropped_cycles();
        if dropped > 0 {
            warn!(
                "{} requests do not divide evenly across {} workers; {} requests will not be sent",
                config.total_requests, workers, dropped
            );
        }

        let mut drivers = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            drivers.push(self.factory.create(worker_id)?);
        }

        let aggregator = Arc::new(Aggregator::new(config.progress_interval()));
        let mut abort_rx = aggregator.subscribe_abort();
        let mut shutdown_rx = shutdown_tx.subscribe();
        let mut shutdown_open = true;

        info!(
            "Benchmarking {} ({} workers, {} requests each)",
            config.target, workers, cycles
        );
        self.state = RunState::Running;
        let start_time = Instant::now();

        let mut pending = FuturesUnordered::new();
        for (worker_id, driver) in drivers.into_iter().enumerate() {
            let handle = tokio::spawn(run_worker(
                worker_id,
                driver,
                cycles,
                Arc::clone(&aggregator),
                self.observer.clone(),
            ));
            pending.push(handle.map(move |joined| (worker_id, joined)));
        }

        loop {
            tokio::select! {
                joined = pending.next() => match joined {
                    Some((worker_id, Ok(result))) => {
                        debug!(
                            "Worker {} finished: {} ok, {} connect errors",
                            worker_id, result.success_count, result.connect_error_count
                        );
                    }
                    Some((worker_id, Err(err))) => {
                        debug!("Worker {} task failed: {}", worker_id, err);
                        aggregator.abort(FatalError::WorkerFailed {
                            worker: worker_id,
                            detail: err.to_string(),
                        });
                        break;
                    }
                    None => break,
                },
                _ = abort_rx.recv() => break,
                received = shutdown_rx.recv(), if shutdown_open => match received {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        aggregator.abort(FatalError::Interrupted);
                        break;
                    }
                    Err(RecvError::Closed) => shutdown_open = false,
                },
            }
        }
        let end_time = Instant::now();
        if !pending.is_empty() {
            debug!("Detaching {} workers still in flight", pending.len());
        }
        drop(pending);

        let stats = aggregator.stats(start_time, end_time);
        match stats.totals.fatal_error {
            Some(ref error) => {
                self.state = RunState::Aborted;
                Ok(RunOutcome::Aborted(AbortReport::new(error)))
            }
            None => {
                self.state = RunState::Completed;
                Ok(RunOutcome::Completed(FinalReport::from_stats(&config, &stats)))
            }
        }
    }
}
