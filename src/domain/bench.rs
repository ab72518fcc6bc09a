use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::Arc;
use std::time::Duration;

/// Bytes sent per TCP/WebSocket cycle when no length is configured.
pub const DEFAULT_PAYLOAD_LEN: usize = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
const PAYLOAD_FILL: u8 = b'A';
/// Progress is reported this many times over a full run.
const PROGRESS_STEPS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Tcp,
    Http,
    Https,
    Ws,
}

impl Scheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Scheme::Tcp => "tcp",
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Ws => "ws",
        }
    }

    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Scheme::Tcp => 9501,
            Scheme::Http | Scheme::Ws => 80,
            Scheme::Https => 443,
        }
    }

    #[must_use]
    pub const fn protocol(self) -> Protocol {
        match self {
            Scheme::Tcp => Protocol::Tcp,
            Scheme::Http | Scheme::Https => Protocol::Http,
            Scheme::Ws => Protocol::WebSocket,
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Scheme::Tcp),
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "ws" => Ok(Scheme::Ws),
            other => Err(other.to_owned()),
        }
    }
}

/// Wire protocol family driven by a worker. `http` and `https` share a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Http,
    WebSocket,
}

impl Protocol {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Http => "http",
            Protocol::WebSocket => "websocket",
        }
    }
}

/// How a TCP cycle wraps the payload and finds the end of the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TcpFraming {
    /// Payload as-is; one read is one response.
    #[default]
    Raw,
    /// Payload followed by `\r\n\r\n`; the response ends with the same marker.
    Eof,
    /// 4-byte big-endian length followed by the payload, both directions.
    LengthPrefixed,
}

impl TcpFraming {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TcpFraming::Raw => "raw",
            TcpFraming::Eof => "eof",
            TcpFraming::LengthPrefixed => "length",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub query: Option<String>,
}

impl Target {
    /// Target at `/` with no query string.
    #[must_use]
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            path: "/".to_owned(),
            query: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|value| !value.is_empty());
        self
    }

    /// `host:port`, with IPv6 literals bracketed.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.query.as_deref() {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}://{}{}",
            self.scheme.as_str(),
            self.authority(),
            self.path_and_query()
        )
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

/// Fully validated benchmark settings. Built once and shared read-only by
/// every worker.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub concurrency: NonZeroUsize,
    pub total_requests: NonZeroU64,
    pub target: Target,
    /// Bytes written per cycle. For HTTP an empty payload means a bodiless GET.
    pub payload: Arc<[u8]>,
    /// Per-cycle bound; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub keep_alive: bool,
    pub verbose: bool,
    pub tcp_framing: TcpFraming,
    pub insecure: bool,
}

impl BenchmarkConfig {
    #[must_use]
    pub fn new(target: Target, concurrency: NonZeroUsize, total_requests: NonZeroU64) -> Self {
        let payload: Arc<[u8]> = match target.scheme.protocol() {
            Protocol::Http => Arc::from(Vec::new()),
            Protocol::Tcp | Protocol::WebSocket => Arc::from(filled_payload(DEFAULT_PAYLOAD_LEN)),
        };
        Self {
            concurrency,
            total_requests,
            target,
            payload,
            timeout: Some(DEFAULT_TIMEOUT),
            keep_alive: false,
            verbose: false,
            tcp_framing: TcpFraming::Raw,
            insecure: false,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Arc<[u8]>>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn with_tcp_framing(mut self, framing: TcpFraming) -> Self {
        self.tcp_framing = framing;
        self
    }

    #[must_use]
    pub const fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.target.scheme.protocol()
    }

    /// Cycles each worker runs. The remainder of the division is dropped.
    #[must_use]
    pub fn cycles_per_worker(&self) -> u64 {
        let workers = u64::try_from(self.concurrency.get()).unwrap_or(u64::MAX);
        self.total_requests.get().checked_div(workers).unwrap_or(0)
    }

    /// Cycles that no worker runs because of integer division.
    #[must_use]
    pub fn dropped_cycles(&self) -> u64 {
        let workers = u64::try_from(self.concurrency.get()).unwrap_or(u64::MAX);
        self.total_requests.get().checked_rem(workers).unwrap_or(0)
    }

    /// Completed-cycle interval between progress notifications.
    #[must_use]
    pub fn progress_interval(&self) -> u64 {
        self.total_requests
            .get()
            .checked_div(PROGRESS_STEPS)
            .unwrap_or(0)
            .max(1)
    }
}

/// `A` repeated `len` times.
#[must_use]
pub fn filled_payload(len: usize) -> Vec<u8> {
    vec![PAYLOAD_FILL; len]
}
