use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Timeout must be -1 (disabled) or a positive number of seconds, got {value}.")]
    InvalidTimeout { value: i64 },
    #[error("Missing server URL (e.g. tcp://127.0.0.1:9501).")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL is missing host.")]
    UrlMissingHost,
    #[error("Unsupported URL scheme '{scheme}'. Use tcp, http, https or ws.")]
    UnsupportedScheme { scheme: String },
    #[error("Failed to build HTTP client: {source}")]
    BuildHttpClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Benchmark run has already been started.")]
    RunAlreadyStarted,
    #[cfg(test)]
    #[error("{message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("{message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
