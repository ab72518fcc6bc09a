use thiserror::Error;

/// Run-terminating failures. Any of these raises the abort signal and the run
/// ends without throughput statistics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FatalError {
    #[error("Connection refused by {target} ({detail})")]
    ConnectionRefused { target: String, detail: String },
    #[error("The URL [{url}] is non-existent")]
    NotFound { url: String },
    #[error("WebSocket handshake with {target} failed: {detail}")]
    HandshakeFailed { target: String, detail: String },
    #[error("WebSocket connect to {target} timed out")]
    HandshakeTimeout { target: String },
    #[error("WebSocket protocol violation: {detail}")]
    ProtocolViolation { detail: String },
    #[error("Benchmark interrupted by signal")]
    Interrupted,
    #[error("Worker {worker} failed: {detail}")]
    WorkerFailed { worker: usize, detail: String },
}
