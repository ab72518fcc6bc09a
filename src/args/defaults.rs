pub(crate) const DEFAULT_USER_AGENT: &str = concat!("wirebench/", env!("CARGO_PKG_VERSION"));

pub(super) const DEFAULT_CONCURRENCY: &str = "100";
pub(super) const DEFAULT_REQUESTS: &str = "10000";
/// Seconds; `-1` disables the timeout.
pub(super) const DEFAULT_TIMEOUT_SECS: &str = "3";
pub(super) const DISABLED_TIMEOUT: i64 = -1;
