//! Final report assembly and rendering.
mod format;

#[cfg(test)]
mod tests;

use std::time::Duration;

use serde::Serialize;

use crate::domain::BenchmarkConfig;
use crate::engine::AggregateStats;
use crate::error::{AppResult, FatalError};

pub use format::{group_thousands, round_seconds};

/// Statistics of a run that completed without a fatal error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub target_url: String,
    pub concurrency: usize,
    pub cost_time_seconds: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub connect_error_count: u64,
    /// Bytes written by successful cycles. For TCP and WebSocket this is the
    /// full framed payload; for HTTP it is the request body only, headers are
    /// not counted.
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    /// `successful_requests / cost_time_seconds`, using the rounded seconds.
    pub requests_per_second: f64,
    pub connect_time_seconds: f64,
}

impl FinalReport {
    /// Builds the report from the merged totals.
    ///
    /// `failed_requests` is everything requested that did not succeed,
    /// including remainder cycles that were never run.
    #[must_use]
    pub fn from_stats(config: &BenchmarkConfig, stats: &AggregateStats) -> Self {
        let totals = &stats.totals;
        let total_requests = config.total_requests.get();
        let cost_time = stats.end_time.saturating_duration_since(stats.start_time);
        let connect_time = stats
            .first_byte_time
            .map_or(Duration::ZERO, |first| first.saturating_duration_since(stats.start_time));
        let cost_time_seconds = round_seconds(cost_time);

        Self {
            target_url: config.target.url(),
            concurrency: config.concurrency.get(),
            cost_time_seconds,
            total_requests,
            successful_requests: totals.success_count,
            failed_requests: total_requests.saturating_sub(totals.success_count),
            connect_error_count: totals.connect_error_count,
            total_bytes_sent: totals.bytes_sent,
            total_bytes_received: totals.bytes_received,
            requests_per_second: format::per_second(totals.success_count, cost_time_seconds),
            connect_time_seconds: round_seconds(connect_time),
        }
    }

    /// Renders the plain-text block printed at the end of a run.
    #[must_use]
    pub fn render_text(&self) -> String {
        let lines = [
            format!("Benchmark testing for {}", self.target_url),
            String::new(),
            format!("Concurrency Level:      {}", self.concurrency),
            format!("Time taken for tests:   {} seconds", self.cost_time_seconds),
            format!(
                "Complete requests:      {}",
                group_thousands(self.total_requests)
            ),
            format!(
                "Failed requests:        {}",
                group_thousands(self.failed_requests)
            ),
            format!(
                "Connect failed:         {}",
                group_thousands(self.connect_error_count)
            ),
            format!(
                "Total send:             {} bytes",
                group_thousands(self.total_bytes_sent)
            ),
            format!(
                "Total receive:          {} bytes",
                group_thousands(self.total_bytes_received)
            ),
            format!("Requests per second:    {}", self.requests_per_second),
            format!("Connection time:        {} seconds", self.connect_time_seconds),
        ];
        lines.join("\n")
    }

    /// # Errors
    ///
    /// Returns an error when the report cannot be serialized.
    pub fn render_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What an aborted run reports instead of statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortReport {
    pub fatal_error_message: String,
    #[serde(skip)]
    pub error: FatalError,
}

impl AbortReport {
    #[must_use]
    pub fn new(error: &FatalError) -> Self {
        Self {
            fatal_error_message: error.to_string(),
            error: error.clone(),
        }
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        self.fatal_error_message.clone()
    }

    /// # Errors
    ///
    /// Returns an error when the report cannot be serialized.
    pub fn render_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
