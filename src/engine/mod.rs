//! Concurrent run engine: workers, shared aggregator and the scheduler that
//! drives them.
mod aggregator;
mod classify;
mod outcome;
mod progress;
mod scheduler;
mod worker;


pub use aggregator::{AggregateStats, AggregateTotals, Aggregator};
pub use classify::{ErrorClass, Failure, classify};
pub use outcome::{CycleBytes, CycleOutcome, WorkerResult};
pub use progress::{ProgressObserver, TracingProgress};
pub use scheduler::{RunOutcome, RunState, Scheduler};
pub use worker::run_worker;
