//! Delay computation: server hint (`Retry-After`) or exponential schedule.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

/// `min_timeout * factor^(attempt - 1)`, capped at `max_timeout`.
///
/// `attempt` is 1-based (1 = first failure).
pub fn exponential(
    attempt: u32,
    min_timeout: Duration,
    max_timeout: Duration,
    factor: f64,
) -> Duration {
    let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let ms = min_timeout.as_millis() as f64 * factor.powi(exp);
    let cap = max_timeout.as_millis() as f64;
    if !ms.is_finite() || ms >= cap {
        return max_timeout;
    }
    Duration::from_millis(ms.max(0.0) as u64)
}

/// Parse a `Retry-After` value into a positive delay.
///
/// Accepts a number of seconds (fractions allowed) or an HTTP date, taken
/// relative to `now`. Zero, negative, past and unparsable values yield `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let ms: f64 = match value.parse::<f64>() {
        Ok(secs) => secs * 1000.0,
        Err(_) => match parse_http_date(value) {
            Some(date) => (date - now).num_milliseconds() as f64,
            None => {
                tracing::debug!("ignoring unparsable Retry-After {:?}", value);
                return None;
            }
        },
    };
    if ms.is_nan() || ms <= 0.0 {
        return None;
    }
    if ms.is_infinite() || ms >= u64::MAX as f64 {
        return Some(Duration::MAX);
    }
    Some(Duration::from_millis(ms as u64))
}

/// HTTP-date in any of the three forms HTTP/1.1 allows (IMF-fixdate, the
/// obsolete RFC 850 form, asctime), plus RFC 3339.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    // "Sunday, 06-Nov-94 08:49:37 GMT" and "Sun Nov  6 08:49:37 1994"; both UTC.
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Delay before the next attempt: a positive `Retry-After` hint capped at
/// `max_timeout`, otherwise the exponential schedule.
pub fn delay_for(
    attempt: u32,
    retry_after: Option<&str>,
    min_timeout: Duration,
    max_timeout: Duration,
    factor: f64,
    now: DateTime<Utc>,
) -> Duration {
    match retry_after.and_then(|v| parse_retry_after(v, now)) {
        Some(hint) => hint.min(max_timeout),
        None => exponential(attempt, min_timeout, max_timeout, factor),
    }
}
