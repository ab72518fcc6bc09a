//! Fatal / connect-error / transient policy for driver failures.
use std::io;

use thiserror::Error;

use crate::domain::{Protocol, Target};
use crate::error::FatalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalidates the whole run.
    Fatal,
    /// Counted, worker carries on (or gives up when it never connected).
    ConnectError,
    /// Not counted; only surfaced to the verbose observer.
    Transient,
}

/// One failed step reported by a driver, before classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Failure {
    #[error("connection refused: {detail}")]
    ConnectRefused { detail: String },
    #[error("connection timed out")]
    ConnectTimeout,
    #[error("connect failed: {detail}")]
    ConnectFailed { code: Option<i32>, detail: String },
    #[error("send failed: {detail}")]
    SendFailed { detail: String },
    #[error("receive failed: {detail}")]
    ReceiveFailed { detail: String },
    #[error("empty response")]
    EmptyResponse,
    #[error("request timed out")]
    RequestTimeout,
    #[error("the URL [{url}] is non-existent")]
    NotFound { url: String },
    #[error("handshake failed: {detail}")]
    HandshakeFailed { detail: String },
    #[error("protocol violation: {detail}")]
    ProtocolViolation { detail: String },
}

impl Failure {
    /// Maps a failed connect attempt onto refused / timed out / other.
    #[must_use]
    pub fn from_connect_io(err: &io::Error) -> Self {
        let kind = err.kind();
        if kind == io::ErrorKind::ConnectionRefused {
            Failure::ConnectRefused {
                detail: err.to_string(),
            }
        } else if kind == io::ErrorKind::TimedOut {
            Failure::ConnectTimeout
        } else {
            Failure::ConnectFailed {
                code: err.raw_os_error(),
                detail: err.to_string(),
            }
        }
    }

    #[must_use]
    pub const fn os_code(&self) -> Option<i32> {
        match self {
            Failure::ConnectFailed { code, .. } => *code,
            Failure::ConnectRefused { .. }
            | Failure::ConnectTimeout
            | Failure::SendFailed { .. }
            | Failure::ReceiveFailed { .. }
            | Failure::EmptyResponse
            | Failure::RequestTimeout
            | Failure::NotFound { .. }
            | Failure::HandshakeFailed { .. }
            | Failure::ProtocolViolation { .. } => None,
        }
    }

    /// Converts a failure classified as fatal into the run-level error.
    #[must_use]
    pub fn into_fatal(self, target: &Target) -> FatalError {
        match self {
            Failure::ConnectRefused { detail } => FatalError::ConnectionRefused {
                target: target.authority(),
                detail,
            },
            Failure::NotFound { url } => FatalError::NotFound { url },
            Failure::ConnectTimeout => FatalError::HandshakeTimeout {
                target: target.url(),
            },
            Failure::ConnectFailed { detail, .. } | Failure::HandshakeFailed { detail } => {
                FatalError::HandshakeFailed {
                    target: target.url(),
                    detail,
                }
            }
            Failure::SendFailed { detail } | Failure::ProtocolViolation { detail } => {
                FatalError::ProtocolViolation { detail }
            }
            other @ (Failure::ReceiveFailed { .. }
            | Failure::EmptyResponse
            | Failure::RequestTimeout) => FatalError::ProtocolViolation {
                detail: other.to_string(),
            },
        }
    }
}

/// Labels a driver failure for the given protocol.
///
/// Refused connections and protocol-level violations abort the run. Connect
/// timeouts are counted, except during a WebSocket handshake where any
/// failure is fatal. WebSocket pushes that fail are fatal too; everything else
/// is transient.
#[must_use]
pub const fn classify(protocol: Protocol, failure: &Failure) -> ErrorClass {
    match failure {
        Failure::ConnectRefused { .. }
        | Failure::NotFound { .. }
        | Failure::HandshakeFailed { .. }
        | Failure::ProtocolViolation { .. } => ErrorClass::Fatal,
        Failure::ConnectTimeout | Failure::ConnectFailed { .. } => match protocol {
            Protocol::WebSocket => ErrorClass::Fatal,
            Protocol::Tcp | Protocol::Http => ErrorClass::ConnectError,
        },
        Failure::SendFailed { .. } => match protocol {
            Protocol::WebSocket => ErrorClass::Fatal,
            Protocol::Tcp | Protocol::Http => ErrorClass::Transient,
        },
        Failure::ReceiveFailed { .. } | Failure::EmptyResponse | Failure::RequestTimeout => {
            ErrorClass::Transient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Scheme;
    use crate::error::{AppError, AppResult};

    const ALL_PROTOCOLS: [Protocol; 3] = [Protocol::Tcp, Protocol::Http, Protocol::WebSocket];

    fn refused() -> Failure {
        Failure::ConnectRefused {
            detail: "Connection refused".to_owned(),
        }
    }

    #[test]
    fn refused_is_fatal_for_every_protocol() -> AppResult<()> {
        for protocol in ALL_PROTOCOLS {
            if classify(protocol, &refused()) != ErrorClass::Fatal {
                return Err(AppError::validation(format!(
                    "Expected refused to be fatal for {}",
                    protocol.as_str()
                )));
            }
        }
        Ok(())
    }

    #[test]
    fn connect_timeout_is_counted_except_for_websocket() -> AppResult<()> {
        if classify(Protocol::Tcp, &Failure::ConnectTimeout) != ErrorClass::ConnectError {
            return Err(AppError::validation("Expected tcp connect timeout to count"));
        }
        if classify(Protocol::Http, &Failure::ConnectTimeout) != ErrorClass::ConnectError {
            return Err(AppError::validation("Expected http connect timeout to count"));
        }
        if classify(Protocol::WebSocket, &Failure::ConnectTimeout) != ErrorClass::Fatal {
            return Err(AppError::validation("Expected websocket connect timeout fatal"));
        }
        Ok(())
    }

    #[test]
    fn protocol_violations_are_fatal() -> AppResult<()> {
        let not_found = Failure::NotFound {
            url: "http://127.0.0.1:80/missing".to_owned(),
        };
        let handshake = Failure::HandshakeFailed {
            detail: "HTTP error: 400 Bad Request".to_owned(),
        };
        let violation = Failure::ProtocolViolation {
            detail: "bad opcode".to_owned(),
        };
        for failure in [not_found, handshake, violation] {
            if classify(Protocol::Http, &failure) != ErrorClass::Fatal {
                return Err(AppError::validation(format!("Expected fatal: {}", failure)));
            }
        }
        Ok(())
    }

    #[test]
    fn receive_hiccups_are_transient() -> AppResult<()> {
        let cases = [
            Failure::EmptyResponse,
            Failure::RequestTimeout,
            Failure::ReceiveFailed {
                detail: "reset".to_owned(),
            },
        ];
        for protocol in ALL_PROTOCOLS {
            for failure in &cases {
                if classify(protocol, failure) != ErrorClass::Transient {
                    return Err(AppError::validation(format!(
                        "Expected transient for {} on {}",
                        failure,
                        protocol.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn send_failure_depends_on_protocol() -> AppResult<()> {
        let failure = Failure::SendFailed {
            detail: "broken pipe".to_owned(),
        };
        if classify(Protocol::Tcp, &failure) != ErrorClass::Transient {
            return Err(AppError::validation("Expected tcp send failure transient"));
        }
        if classify(Protocol::WebSocket, &failure) != ErrorClass::Fatal {
            return Err(AppError::validation("Expected websocket push failure fatal"));
        }
        Ok(())
    }

    #[test]
    fn connect_io_errors_map_by_kind() -> AppResult<()> {
        let refused_err = io::Error::from(io::ErrorKind::ConnectionRefused);
        if !matches!(
            Failure::from_connect_io(&refused_err),
            Failure::ConnectRefused { .. }
        ) {
            return Err(AppError::validation("Expected ConnectRefused"));
        }
        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        if Failure::from_connect_io(&timed_out) != Failure::ConnectTimeout {
            return Err(AppError::validation("Expected ConnectTimeout"));
        }
        let unreachable = io::Error::from_raw_os_error(113);
        let mapped = Failure::from_connect_io(&unreachable);
        if mapped.os_code() != Some(113) {
            return Err(AppError::validation(format!(
                "Expected os code 113, got {:?}",
                mapped
            )));
        }
        Ok(())
    }

    #[test]
    fn refused_becomes_fatal_with_authority() -> AppResult<()> {
        let target = Target::new(Scheme::Tcp, "127.0.0.1", 9501);
        let fatal = refused().into_fatal(&target);
        match fatal {
            FatalError::ConnectionRefused { target, .. } if target == "127.0.0.1:9501" => Ok(()),
            other => Err(AppError::validation(format!(
                "Unexpected fatal error: {}",
                other
            ))),
        }
    }
}
