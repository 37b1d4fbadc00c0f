// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parsing helpers for command-line values.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::Error;

lazy_static! {
    /// A single `<number><unit>` term of a duration such as `1h30m` or `1.5s`.
    static ref DURATION_TERM_REGEX: Regex =
        Regex::new(r"([0-9]+(?:\.[0-9]*)?|\.[0-9]+)(ns|us|µs|μs|ms|s|m|h)")
            .expect("failed creating regex");
}

const NANOS_PER_SECOND: u128 = 1_000_000_000;

// fraction digits beyond this are below a nanosecond even for hours
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SECOND,
        "m" => 60 * NANOS_PER_SECOND,
        _ => 3_600 * NANOS_PER_SECOND,
    }
}

/// Exact nanoseconds for one `<number><unit>` term, `None` on overflow.
fn term_nanos(number: &str, unit: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    let fraction_nanos = if fraction.is_empty() {
        0
    } else {
        let digits: u128 = fraction.parse().ok()?;
        digits * unit / 10u128.pow(fraction.len() as u32)
    };
    whole.checked_mul(unit)?.checked_add(fraction_nanos)
}

/// Parses a duration written as a sequence of decimal numbers with unit
/// suffixes, e.g. `10s`, `1m30s`, `1.5h` or `250ms`. A bare `0` is accepted.
///
/// # Examples
///
/// ```
/// use apache2metric::util::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert!(parse_duration("ten seconds").is_err());
/// ```
pub fn parse_duration(value: &str) -> Result<Duration, Error> {
    let trimmed = value.trim();
    let invalid = || Error::InvalidConfig(format!("invalid duration '{value}'"));

    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut consumed = 0;
    let mut nanos: u128 = 0;
    for captures in DURATION_TERM_REGEX.captures_iter(trimmed) {
        let (Some(term), Some(number), Some(unit)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            return Err(invalid());
        };
        // terms must be contiguous and cover the whole input
        if term.start() != consumed {
            return Err(invalid());
        }
        consumed = term.end();
        nanos = term_nanos(number.as_str(), unit_nanos(unit.as_str()))
            .and_then(|term| nanos.checked_add(term))
            .ok_or_else(invalid)?;
    }
    if consumed != trimmed.len() {
        return Err(invalid());
    }

    let secs = u64::try_from(nanos / NANOS_PER_SECOND).map_err(|_| invalid())?;
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    Ok(Duration::new(secs, subsec))
}

/// Parses and validates a metric name for the output series.
///
/// Whitespace around the name is trimmed. The name must be non-empty and must
/// not contain whitespace, since fields in the output are space separated.
///
/// # Examples
///
/// ```
/// use apache2metric::util::parse_metric_name;
///
/// assert_eq!(parse_metric_name(" reqcount "), Some("reqcount".to_string()));
/// assert_eq!(parse_metric_name("req count"), None);
/// ```
pub fn parse_metric_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }

    Some(trimmed.to_string())
}
