use std::sync::Arc;

use tracing::debug;

use crate::driver::ProtocolDriver;

use super::aggregator::Aggregator;
use super::outcome::{CycleOutcome, WorkerResult};
use super::progress::ProgressObserver;

/// Runs one worker to completion: connect, `cycles` request/response cycles,
/// disconnect, then a single merge into `aggregator`.
///
/// The worker stops early when its own cycle turns fatal or when another
/// worker has already aborted the run. A connect attempt that fails without
/// being fatal counts one connect error and ends the worker.
pub async fn run_worker<D>(
    worker_id: usize,
    mut driver: D,
    cycles: u64,
    aggregator: Arc<Aggregator>,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> WorkerResult
where
    D: ProtocolDriver,
{
    let protocol = driver.protocol();
    let target = driver.target().clone();
    let mut result = WorkerResult::default();

    if let Err(failure) = driver.connect().await {
        let outcome = CycleOutcome::from_failure(protocol, &target, failure);
        debug!("Worker {} failed to connect: {:?}", worker_id, outcome);
        report_error(observer.as_deref(), &outcome);
        result.record(outcome);
        driver.disconnect().await;
        aggregator.merge(&result);
        return result;
    }

    for _ in 0..cycles {
        if aggregator.is_aborted() {
            debug!("Worker {} stopping: run aborted", worker_id);
            break;
        }
        aggregator.record_first_byte();

        let cycle = driver.cycle().await;
        let outcome = CycleOutcome::from_cycle(protocol, &target, cycle);
        if outcome.is_success() {
            if let Some(completed) = aggregator.record_completed()
                && let Some(observer) = observer.as_deref()
            {
                observer.on_progress(completed);
            }
        } else {
            report_error(observer.as_deref(), &outcome);
        }

        let fatal = matches!(outcome, CycleOutcome::Fatal { .. });
        result.record(outcome);
        if fatal {
            break;
        }
    }

    driver.disconnect().await;
    aggregator.merge(&result);
    result
}

fn report_error(observer: Option<&dyn ProgressObserver>, outcome: &CycleOutcome) {
    if let Some(observer) = observer
        && let Some(detail) = outcome.error_detail()
    {
        observer.on_error(&detail);
    }
}
