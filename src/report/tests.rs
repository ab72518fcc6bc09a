use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::domain::{Scheme, Target};
use crate::engine::AggregateTotals;
use crate::error::{AppError, AppResult};

fn config(concurrency: usize, total: u64) -> AppResult<BenchmarkConfig> {
    let concurrency = NonZeroUsize::new(concurrency)
        .ok_or_else(|| AppError::validation("Expected non-zero concurrency"))?;
    let total =
        NonZeroU64::new(total).ok_or_else(|| AppError::validation("Expected non-zero total"))?;
    Ok(BenchmarkConfig::new(
        Target::new(Scheme::Http, "127.0.0.1", 8080).with_path("/bench"),
        concurrency,
        total,
    ))
}

fn stats(
    totals: AggregateTotals,
    first_byte_after: Option<Duration>,
    elapsed: Duration,
) -> AggregateStats {
    let start_time = Instant::now();
    let after = |offset: Duration| start_time.checked_add(offset).unwrap_or(start_time);
    AggregateStats {
        totals,
        start_time,
        first_byte_time: first_byte_after.map(after),
        end_time: after(elapsed),
    }
}

#[test]
fn failed_requests_include_dropped_cycles() -> AppResult<()> {
    let config = config(4, 10)?;
    let totals = AggregateTotals {
        success_count: 8,
        bytes_sent: 80,
        bytes_received: 40,
        merged_workers: 4,
        ..AggregateTotals::default()
    };
    let report = FinalReport::from_stats(
        &config,
        &stats(totals, Some(Duration::from_millis(5)), Duration::from_secs(2)),
    );
    if report.failed_requests != 2 || report.successful_requests != 8 {
        return Err(AppError::validation(format!(
            "Unexpected request counts: {:?}",
            report
        )));
    }
    if report.total_bytes_sent != 80 || report.total_bytes_received != 40 {
        return Err(AppError::validation("Unexpected byte totals"));
    }
    if report.target_url != "http://127.0.0.1:8080/bench" {
        return Err(AppError::validation(format!(
            "Unexpected url {}",
            report.target_url
        )));
    }
    Ok(())
}

#[test]
fn rates_and_times_are_rounded() -> AppResult<()> {
    let config = config(1, 100)?;
    let totals = AggregateTotals {
        success_count: 100,
        ..AggregateTotals::default()
    };
    let report = FinalReport::from_stats(
        &config,
        &stats(
            totals,
            Some(Duration::from_micros(1_234_567)),
            Duration::from_secs(4),
        ),
    );
    if report.connect_time_seconds.to_string() != "1.2346" {
        return Err(AppError::validation(format!(
            "Expected connect time 1.2346, got {}",
            report.connect_time_seconds
        )));
    }
    if report.cost_time_seconds.to_string() != "4" {
        return Err(AppError::validation("Expected cost time of 4 seconds"));
    }
    if report.requests_per_second.to_string() != "25" {
        return Err(AppError::validation(format!(
            "Expected 25 requests per second, got {}",
            report.requests_per_second
        )));
    }
    Ok(())
}

#[test]
#[expect(clippy::float_arithmetic, reason = "Recomputes the rate independently.")]
fn rate_divides_successes_by_reported_cost_time() -> AppResult<()> {
    let config = config(1, 100)?;
    let totals = AggregateTotals {
        success_count: 100,
        ..AggregateTotals::default()
    };
    let report = FinalReport::from_stats(
        &config,
        &stats(
            totals,
            Some(Duration::from_micros(20)),
            Duration::from_micros(1_234_560),
        ),
    );
    if report.cost_time_seconds.to_string() != "1.2346" {
        return Err(AppError::validation(format!(
            "Expected cost time 1.2346, got {}",
            report.cost_time_seconds
        )));
    }
    let expected = 100.0 / report.cost_time_seconds;
    if report.requests_per_second.to_bits() != expected.to_bits() {
        return Err(AppError::validation(format!(
            "Expected {} requests per second, got {}",
            expected, report.requests_per_second
        )));
    }
    if report.connect_time_seconds >= report.cost_time_seconds {
        return Err(AppError::validation("Connect time must be below cost time"));
    }
    Ok(())
}

#[test]
fn connect_time_is_zero_without_first_byte() -> AppResult<()> {
    let config = config(2, 2)?;
    let report = FinalReport::from_stats(
        &config,
        &stats(AggregateTotals::default(), None, Duration::ZERO),
    );
    if report.connect_time_seconds.to_string() != "0" {
        return Err(AppError::validation("Expected zero connect time"));
    }
    if report.requests_per_second.to_string() != "0" {
        return Err(AppError::validation("Expected zero throughput for zero time"));
    }
    Ok(())
}

#[test]
fn text_report_uses_thousands_separators() -> AppResult<()> {
    let config = config(100, 10_000)?;
    let totals = AggregateTotals {
        success_count: 9_000,
        connect_error_count: 1_500,
        bytes_sent: 9_216_000,
        bytes_received: 1_234,
        ..AggregateTotals::default()
    };
    let text = FinalReport::from_stats(
        &config,
        &stats(totals, Some(Duration::ZERO), Duration::from_secs(1)),
    )
    .render_text();

    for expected in [
        "Benchmark testing for http://127.0.0.1:8080/bench",
        "Concurrency Level:      100",
        "Complete requests:      10,000",
        "Failed requests:        1,000",
        "Connect failed:         1,500",
        "Total send:             9,216,000 bytes",
        "Total receive:          1,234 bytes",
        "Requests per second:    9000",
    ] {
        if !text.contains(expected) {
            return Err(AppError::validation(format!(
                "Missing line {:?} in:\n{}",
                expected, text
            )));
        }
    }
    Ok(())
}

#[test]
fn json_report_exposes_all_fields() -> AppResult<()> {
    let config = config(1, 1)?;
    let report = FinalReport::from_stats(
        &config,
        &stats(AggregateTotals::default(), None, Duration::from_secs(1)),
    );
    let value: serde_json::Value = serde_json::from_str(&report.render_json()?)?;
    for field in [
        "target_url",
        "concurrency",
        "cost_time_seconds",
        "total_requests",
        "successful_requests",
        "failed_requests",
        "connect_error_count",
        "total_bytes_sent",
        "total_bytes_received",
        "requests_per_second",
        "connect_time_seconds",
    ] {
        if value.get(field).is_none() {
            return Err(AppError::validation(format!("Missing field {}", field)));
        }
    }
    Ok(())
}

#[test]
fn abort_report_carries_fatal_message() -> AppResult<()> {
    let report = AbortReport::new(&FatalError::NotFound {
        url: "http://127.0.0.1:8080/missing".to_owned(),
    });
    if report.render_text() != "The URL [http://127.0.0.1:8080/missing] is non-existent" {
        return Err(AppError::validation(format!(
            "Unexpected abort message {}",
            report.render_text()
        )));
    }
    Ok(())
}

#[test]
fn group_thousands_handles_short_and_long_values() -> AppResult<()> {
    let cases = [(0, "0"), (999, "999"), (1_000, "1,000"), (123_456_789, "123,456,789")];
    for (value, expected) in cases {
        let grouped = group_thousands(value);
        if grouped != expected {
            return Err(AppError::validation(format!(
                "Expected {} for {}, got {}",
                expected, value, grouped
            )));
        }
    }
    Ok(())
}
