use std::time::Duration;

use url::Url;

use super::defaults::DISABLED_TIMEOUT;
use super::types::{PositiveU64, PositiveUsize};
use crate::domain::{Scheme, Target};
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("Invalid boolean value '{}'", other)),
    }
}

/// Parses a benchmark URL (`tcp://`, `http://`, `https://` or `ws://`).
///
/// Missing ports fall back to the scheme default and a missing path to `/`.
///
/// # Errors
///
/// Returns an error when the URL does not parse, uses another scheme or has
/// no host.
pub fn parse_target(raw: &str) -> Result<Target, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|source| ValidationError::InvalidUrl {
        url: raw.to_owned(),
        source,
    })?;
    let scheme: Scheme = url
        .scheme()
        .parse()
        .map_err(|scheme| ValidationError::UnsupportedScheme { scheme })?;
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or(ValidationError::UrlMissingHost)?;
    let port = url.port().unwrap_or_else(|| scheme.default_port());
    let path = match url.path() {
        "" => "/",
        path => path,
    };

    Ok(Target::new(scheme, host, port)
        .with_path(path)
        .with_query(url.query().map(str::to_owned)))
}

/// Maps the `-t` seconds value: `-1` disables the timeout.
///
/// # Errors
///
/// Returns an error for zero and for negative values other than `-1`.
pub fn parse_timeout(seconds: i64) -> Result<Option<Duration>, ValidationError> {
    if seconds == DISABLED_TIMEOUT {
        return Ok(None);
    }
    u64::try_from(seconds)
        .ok()
        .filter(|value| *value > 0)
        .map(|value| Some(Duration::from_secs(value)))
        .ok_or(ValidationError::InvalidTimeout { value: seconds })
}
