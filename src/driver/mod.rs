//! Protocol drivers: one connection lifecycle per worker.
//!
//! A driver owns its transport exclusively. Dropping it (normal completion,
//! fatal abort or task cancellation) closes the connection; `disconnect`
//! additionally performs the protocol's graceful close.
mod http;
mod tcp;
mod websocket;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::domain::{BenchmarkConfig, Protocol, Target};
use crate::engine::{CycleBytes, Failure};
use crate::error::AppResult;

pub use http::HttpDriver;
pub use tcp::TcpDriver;
pub use websocket::WebSocketDriver;

#[async_trait]
pub trait ProtocolDriver: Send {
    fn protocol(&self) -> Protocol;

    fn target(&self) -> &Target;

    /// Establishes the transport (and performs the handshake where the
    /// protocol has one).
    ///
    /// # Errors
    ///
    /// Returns the unclassified failure when no usable connection exists.
    async fn connect(&mut self) -> Result<(), Failure>;

    /// Runs one request/response cycle.
    ///
    /// # Errors
    ///
    /// Returns the unclassified failure of the send or the receive half.
    async fn cycle(&mut self) -> Result<CycleBytes, Failure>;

    async fn disconnect(&mut self);
}

/// Builds one driver per worker before the run starts.
pub trait DriverFactory: Send + Sync {
    type Driver: ProtocolDriver + 'static;

    /// # Errors
    ///
    /// Returns an error when the driver cannot be configured (for example
    /// when the HTTP client fails to build).
    fn create(&self, worker_id: usize) -> AppResult<Self::Driver>;
}

/// Protocol-specific driver, picked once from the configured scheme.
pub enum Driver {
    Tcp(TcpDriver),
    Http(HttpDriver),
    WebSocket(Box<WebSocketDriver>),
}

impl Driver {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: &Arc<BenchmarkConfig>) -> AppResult<Self> {
        let config = Arc::clone(config);
        Ok(match config.protocol() {
            Protocol::Tcp => Driver::Tcp(TcpDriver::new(config)),
            Protocol::Http => Driver::Http(HttpDriver::new(config)?),
            Protocol::WebSocket => Driver::WebSocket(Box::new(WebSocketDriver::new(config))),
        })
    }
}

#[async_trait]
impl ProtocolDriver for Driver {
    fn protocol(&self) -> Protocol {
        match self {
            Driver::Tcp(driver) => driver.protocol(),
            Driver::Http(driver) => driver.protocol(),
            Driver::WebSocket(driver) => driver.protocol(),
        }
    }

    fn target(&self) -> &Target {
        match self {
            Driver::Tcp(driver) => driver.target(),
            Driver::Http(driver) => driver.target(),
            Driver::WebSocket(driver) => driver.target(),
        }
    }

    async fn connect(&mut self) -> Result<(), Failure> {
        match self {
            Driver::Tcp(driver) => driver.connect().await,
            Driver::Http(driver) => driver.connect().await,
            Driver::WebSocket(driver) => driver.connect().await,
        }
    }

    async fn cycle(&mut self) -> Result<CycleBytes, Failure> {
        match self {
            Driver::Tcp(driver) => driver.cycle().await,
            Driver::Http(driver) => driver.cycle().await,
            Driver::WebSocket(driver) => driver.cycle().await,
        }
    }

    async fn disconnect(&mut self) {
        match self {
            Driver::Tcp(driver) => driver.disconnect().await,
            Driver::Http(driver) => driver.disconnect().await,
            Driver::WebSocket(driver) => driver.disconnect().await,
        }
    }
}

/// Factory for the real network drivers.
#[derive(Debug, Clone)]
pub struct ProtocolDriverFactory {
    config: Arc<BenchmarkConfig>,
}

impl ProtocolDriverFactory {
    #[must_use]
    pub const fn new(config: Arc<BenchmarkConfig>) -> Self {
        Self { config }
    }
}

impl DriverFactory for ProtocolDriverFactory {
    type Driver = Driver;

    fn create(&self, _worker_id: usize) -> AppResult<Driver> {
        Driver::new(&self.config)
    }
}

/// Awaits `future`, giving up after `limit` when one is set.
pub(crate) async fn bounded<F>(limit: Option<Duration>, future: F) -> Option<F::Output>
where
    F: Future,
{
    match limit {
        Some(limit) => timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

pub(crate) fn byte_len(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
