use crate::domain::{Protocol, Target};
use crate::error::FatalError;

use super::classify::{ErrorClass, Failure, classify};

/// Bytes moved by one successful cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleBytes {
    pub sent: u64,
    pub received: u64,
}

impl CycleBytes {
    #[must_use]
    pub const fn new(sent: u64, received: u64) -> Self {
        Self { sent, received }
    }
}

/// Classified result of one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Success { bytes_sent: u64, bytes_received: u64 },
    ConnectError { code: Option<i32> },
    Timeout,
    ProtocolError { detail: String },
    Fatal { error: FatalError },
}

impl CycleOutcome {
    #[must_use]
    pub fn from_cycle(protocol: Protocol, target: &Target, cycle: Result<CycleBytes, Failure>) -> Self {
        match cycle {
            Ok(bytes) => CycleOutcome::Success {
                bytes_sent: bytes.sent,
                bytes_received: bytes.received,
            },
            Err(failure) => Self::from_failure(protocol, target, failure),
        }
    }

    #[must_use]
    pub fn from_failure(protocol: Protocol, target: &Target, failure: Failure) -> Self {
        match classify(protocol, &failure) {
            ErrorClass::Fatal => CycleOutcome::Fatal {
                error: failure.into_fatal(target),
            },
            ErrorClass::ConnectError => CycleOutcome::ConnectError {
                code: failure.os_code(),
            },
            ErrorClass::Transient => {
                if failure == Failure::RequestTimeout {
                    CycleOutcome::Timeout
                } else {
                    CycleOutcome::ProtocolError {
                        detail: failure.to_string(),
                    }
                }
            }
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Success { .. })
    }

    /// Human-readable detail for the verbose observer; `None` for successes.
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        match self {
            CycleOutcome::Success { .. } => None,
            CycleOutcome::ConnectError { code: Some(code) } => {
                Some(format!("connect error (os error {})", code))
            }
            CycleOutcome::ConnectError { code: None } => Some("connection timed out".to_owned()),
            CycleOutcome::Timeout => Some("request timed out".to_owned()),
            CycleOutcome::ProtocolError { detail } => Some(detail.clone()),
            CycleOutcome::Fatal { error } => Some(error.to_string()),
        }
    }
}

/// Per-worker tally. Owned by one worker and merged into the aggregator once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerResult {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub success_count: u64,
    pub connect_error_count: u64,
    pub fatal_error: Option<FatalError>,
}

impl WorkerResult {
    #[must_use]
    pub fn fatal(error: FatalError) -> Self {
        Self {
            fatal_error: Some(error),
            ..Self::default()
        }
    }

    /// Applies one outcome. Transient outcomes leave the counters untouched.
    pub fn record(&mut self, outcome: CycleOutcome) {
        match outcome {
            CycleOutcome::Success {
                bytes_sent,
                bytes_received,
            } => {
                self.success_count = self.success_count.saturating_add(1);
                self.bytes_sent = self.bytes_sent.saturating_add(bytes_sent);
                self.bytes_received = self.bytes_received.saturating_add(bytes_received);
            }
            CycleOutcome::ConnectError { .. } => {
                self.connect_error_count = self.connect_error_count.saturating_add(1);
            }
            CycleOutcome::Timeout | CycleOutcome::ProtocolError { .. } => {}
            CycleOutcome::Fatal { error } => {
                if self.fatal_error.is_none() {
                    self.fatal_error = Some(error);
                }
            }
        }
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.fatal_error.is_some()
    }
}
