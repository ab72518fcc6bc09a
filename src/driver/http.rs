use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header, redirect};

use crate::args::DEFAULT_USER_AGENT;
use crate::domain::{BenchmarkConfig, Protocol, Target};
use crate::engine::{CycleBytes, Failure};
use crate::error::{AppError, AppResult, ValidationError};

use super::{ProtocolDriver, byte_len};

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml";
const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP(S) driver. Each worker owns its own client and therefore its own
/// connection pool; without keep-alive no idle connection is retained, so
/// every cycle reconnects.
pub struct HttpDriver {
    config: Arc<BenchmarkConfig>,
    client: Client,
    url: String,
    host: String,
}

impl HttpDriver {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: Arc<BenchmarkConfig>) -> AppResult<Self> {
        let client = build_client(&config)?;
        let url = config.target.url();
        let host = config.target.authority();
        Ok(Self {
            config,
            client,
            url,
            host,
        })
    }
}

fn build_client(config: &BenchmarkConfig) -> AppResult<Client> {
    let mut builder = Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .redirect(redirect::Policy::none());

    if let Some(limit) = config.timeout {
        builder = builder.timeout(limit).connect_timeout(limit);
    }

    builder = if config.keep_alive {
        builder.pool_max_idle_per_host(1)
    } else {
        builder
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Some(Duration::from_secs(0)))
    };

    if config.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|source| AppError::validation(ValidationError::BuildHttpClient { source }))
}

#[async_trait]
impl ProtocolDriver for HttpDriver {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn target(&self) -> &Target {
        &self.config.target
    }

    /// Connections are opened lazily by the client on the first request.
    async fn connect(&mut self) -> Result<(), Failure> {
        Ok(())
    }

    async fn cycle(&mut self) -> Result<CycleBytes, Failure> {
        let payload = &self.config.payload;
        let request = if payload.is_empty() {
            self.client.get(&self.url)
        } else {
            self.client.post(&self.url).body(payload.to_vec())
        };
        let response = request
            .header(header::HOST, self.host.as_str())
            .header(header::ACCEPT, ACCEPT)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .send()
            .await
            .map_err(|err| failure_from_reqwest(&err))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Failure::NotFound {
                url: self.url.clone(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| failure_from_reqwest(&err))?;
        Ok(CycleBytes::new(byte_len(payload.len()), byte_len(body.len())))
    }

    async fn disconnect(&mut self) {}
}

/// Maps a client error onto the connect / timeout / receive failures.
pub(crate) fn failure_from_reqwest(err: &reqwest::Error) -> Failure {
    if err.is_connect() {
        if let Some(io_err) = find_io_error(err) {
            return Failure::from_connect_io(io_err);
        }
        if err.is_timeout() {
            return Failure::ConnectTimeout;
        }
        return Failure::ConnectFailed {
            code: None,
            detail: err.to_string(),
        };
    }
    if err.is_timeout() {
        return Failure::RequestTimeout;
    }
    Failure::ReceiveFailed {
        detail: err.to_string(),
    }
}

fn find_io_error<'err>(err: &'err (dyn StdError + 'static)) -> Option<&'err io::Error> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        source = inner.source();
    }
    None
}
