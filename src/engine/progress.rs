use tracing::{debug, info};

/// Observational sink for verbose runs. Must not block.
pub trait ProgressObserver: Send + Sync {
    /// Called each time the run-wide completed count crosses a milestone.
    fn on_progress(&self, completed: u64);
    /// Called with the detail of every non-successful cycle.
    fn on_error(&self, detail: &str);
}

/// Default observer: forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_progress(&self, completed: u64) {
        info!("Completed {} requests", completed);
    }

    fn on_error(&self, detail: &str) {
        debug!("{}", detail);
    }
}
