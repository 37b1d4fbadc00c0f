// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Request time extraction for Apache access log lines.
//!
//! A typical common/combined log format entry looks like:
//!
//! ```text
//! 127.0.0.1 - - [10/Oct/2000:13:55:36 -0700] "GET / HTTP/1.0" 200 232
//! ```
//!
//! The request time is the text between the first `[` and the first `]`. It is
//! parsed strictly: any deviation from `DD/Mon/YYYY:HH:MM:SS +ZZZZ` is an error.

use chrono::{DateTime, FixedOffset, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{ExtractError, TimestampError};

/// chrono format matching the Apache `%t` directive
pub const REQUEST_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

lazy_static! {
    /// chrono accepts unpadded numbers and any month casing, so the shape is
    /// checked up front.
    static ref REQUEST_TIME_REGEX: Regex = Regex::new(
        r"^[0-9]{2}/(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)/[0-9]{4}:[0-9]{2}:[0-9]{2}:[0-9]{2} [+-][0-9]{4}$"
    )
    .expect("failed creating regex");
}

/// A single parsed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Builds an event from an already trimmed log line.
    pub fn from_line(line: &str) -> Result<Self, ExtractError> {
        let timestamp = extract_request_time(line)?;
        Ok(Self {
            timestamp: timestamp.with_timezone(&Utc),
        })
    }
}

/// Parses the request time out of an Apache log entry.
///
/// The zone offset is kept on the returned value so callers can normalize to
/// an absolute instant.
///
/// # Examples
///
/// ```
/// use apache2metric::timestamp::extract_request_time;
///
/// let t = extract_request_time(r#"127.0.0.1 - - [10/Oct/2000:13:55:36 -0700] "GET / HTTP/1.0" 200 232"#)
///     .unwrap();
/// assert_eq!(t.timestamp(), 971211336);
/// ```
pub fn extract_request_time(line: &str) -> Result<DateTime<FixedOffset>, ExtractError> {
    let (Some(start), Some(end)) = (line.find('['), line.find(']')) else {
        return Err(ExtractError::MalformedLine {
            line: line.to_string(),
        });
    };
    if start > end {
        return Err(ExtractError::MalformedLine {
            line: line.to_string(),
        });
    }

    let value = &line[start + 1..end];
    parse_request_time(value).map_err(|source| ExtractError::TimestampParse {
        value: value.to_string(),
        source,
    })
}

fn parse_request_time(value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    if !REQUEST_TIME_REGEX.is_match(value) {
        return Err(TimestampError::Shape);
    }
    Ok(DateTime::parse_from_str(value, REQUEST_TIME_FORMAT)?)
}
