use clap::Parser;

use crate::domain::{BenchmarkConfig, DEFAULT_PAYLOAD_LEN, Protocol, filled_payload};
use crate::error::{AppError, AppResult, ValidationError};

use super::defaults::{DEFAULT_CONCURRENCY, DEFAULT_REQUESTS, DEFAULT_TIMEOUT_SECS};
use super::parsers::{
    parse_bool_env, parse_positive_u64, parse_positive_usize, parse_target, parse_timeout,
};
use super::types::{FramingArg, OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent load generator for TCP, HTTP(S) and WebSocket servers.",
    after_help = "Examples:\n  wirebench -c 100 -n 10000 tcp://127.0.0.1:9501\n  wirebench -c 50 -n 5000 -k http://127.0.0.1:8080/index.html\n  wirebench -n 1000 -l 512 ws://127.0.0.1:9502"
)]
pub struct BenchArgs {
    /// Server URL: tcp://, http://, https:// or ws://
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Number of concurrent clients
    #[arg(
        long,
        short = 'c',
        default_value = DEFAULT_CONCURRENCY,
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// Total number of requests, split evenly across clients
    #[arg(
        long,
        short = 'n',
        default_value = DEFAULT_REQUESTS,
        value_parser = parse_positive_u64
    )]
    pub requests: PositiveU64,

    /// Payload length in bytes for TCP and WebSocket (defaults to the --data length, then 1024)
    #[arg(long, short = 'l', value_parser = parse_positive_usize)]
    pub length: Option<PositiveUsize>,

    /// Per-request timeout in seconds; -1 disables it
    #[arg(
        long,
        short = 't',
        default_value = DEFAULT_TIMEOUT_SECS,
        allow_negative_numbers = true
    )]
    pub timeout: i64,

    /// Reuse HTTP connections between requests
    #[arg(long = "keep-alive", short = 'k')]
    pub keep_alive: bool,

    /// Request data; sent as an HTTP POST body, or sets the TCP/WebSocket payload length
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Report progress and request errors (sets log level to debug unless overridden by WIREBENCH_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// TCP message framing
    #[arg(long, value_enum, default_value_t = FramingArg::Raw)]
    pub framing: FramingArg,

    /// Skip TLS certificate verification for https targets
    #[arg(long)]
    pub insecure: bool,

    /// Report format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./wirebench.toml or ./wirebench.json if present.
    #[arg(long)]
    pub config: Option<String>,
}

impl BenchArgs {
    /// Validates the arguments into the immutable run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or invalid, or when the
    /// timeout is out of range.
    pub fn to_config(&self) -> AppResult<BenchmarkConfig> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
        let target = parse_target(url)?;
        let timeout = parse_timeout(self.timeout)?;
        let payload = self.payload_for(target.scheme.protocol());

        Ok(BenchmarkConfig::new(
            target,
            self.concurrency.non_zero(),
            self.requests.non_zero(),
        )
        .with_payload(payload)
        .with_timeout(timeout)
        .with_keep_alive(self.keep_alive)
        .with_verbose(self.verbose)
        .with_tcp_framing(self.framing.into())
        .with_insecure(self.insecure))
    }

    fn payload_for(&self, protocol: Protocol) -> Vec<u8> {
        let data = self.data.as_deref().unwrap_or_default();
        match protocol {
            Protocol::Http => data.as_bytes().to_vec(),
            Protocol::Tcp | Protocol::WebSocket => {
                let len = self.length.map_or_else(
                    || {
                        if data.is_empty() {
                            DEFAULT_PAYLOAD_LEN
                        } else {
                            data.len()
                        }
                    },
                    PositiveUsize::get,
                );
                filled_payload(len)
            }
        }
    }
}
