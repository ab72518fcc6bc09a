use std::time::Duration;

const MICROS_PER_TICK: u128 = 100;
const HALF_TICK_MICROS: u128 = 50;
const TICKS_PER_SECOND: u32 = 10_000;

/// Seconds rounded half-up to four decimal places.
#[must_use]
pub fn round_seconds(duration: Duration) -> f64 {
    let ticks = duration
        .as_micros()
        .saturating_add(HALF_TICK_MICROS)
        .checked_div(MICROS_PER_TICK)
        .unwrap_or(0);
    ticks_to_seconds(u32::try_from(ticks).unwrap_or(u32::MAX))
}

#[expect(
    clippy::float_arithmetic,
    reason = "Report values are presented as decimal seconds."
)]
fn ticks_to_seconds(ticks: u32) -> f64 {
    f64::from(ticks) / f64::from(TICKS_PER_SECOND)
}

/// `count / seconds`, or 0 when no time elapsed. Takes the rounded seconds
/// so the rate matches the reported cost time exactly.
#[expect(clippy::float_arithmetic, reason = "Throughput is a rate.")]
pub(super) fn per_second(count: u64, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    count as f64 / seconds
}

/// Formats `value` with `,` between groups of three digits.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let separators = digits.len().checked_div(3).unwrap_or(0);
    let mut grouped = String::with_capacity(digits.len().saturating_add(separators));
    for (index, digit) in digits.chars().enumerate() {
        let remaining = digits.len().saturating_sub(index);
        if index > 0 && remaining.checked_rem(3) == Some(0) {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
