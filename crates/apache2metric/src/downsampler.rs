// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Downsampling of request events into a cumulative count series.
//!
//! The first event anchors the series. From then on, whenever an event arrives
//! more than one sampling interval after the last sample point, a sample is
//! emitted one interval after that point carrying the number of events seen
//! before the current one. Events are assumed to arrive in non-decreasing time
//! order.
//!
//! A single event advances the sample point by at most one interval. After a
//! gap spanning several intervals the skipped points are not backfilled; the
//! series catches up one interval per subsequent event. Events counted after
//! the last emitted sample are never flushed.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::timestamp::LogEvent;

/// One point of the output series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub sample_time: DateTime<Utc>,
    pub metric_name: String,
    pub value: u64,
}

impl fmt::Display for SampleRecord {
    /// `2012-12-31T23:00:10Z  reqcount  3`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  {}",
            self.sample_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.metric_name,
            self.value
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Running { last_sample_time: DateTime<Utc> },
}

#[derive(Debug)]
pub struct Downsampler {
    metric_name: String,
    sampling_interval: TimeDelta,
    request_count: u64,
    last_emitted_count: u64,
    state: State,
}

impl Downsampler {
    pub fn new(metric_name: impl Into<String>, sampling_interval: TimeDelta) -> Self {
        Self {
            metric_name: metric_name.into(),
            sampling_interval,
            request_count: 0,
            last_emitted_count: 0,
            state: State::Uninitialized,
        }
    }

    /// Counts `event` and returns the sample it completes, if any.
    pub fn observe(&mut self, event: &LogEvent) -> Option<SampleRecord> {
        let last_sample_time = match self.state {
            State::Uninitialized => {
                debug!(anchor = %event.timestamp, "Anchoring sample series on first request");
                self.state = State::Running {
                    last_sample_time: event.timestamp,
                };
                event.timestamp
            }
            State::Running { last_sample_time } => last_sample_time,
        };

        let elapsed = event.timestamp - last_sample_time;
        let record = if elapsed > self.sampling_interval {
            self.warn_on_skipped_boundaries(elapsed, last_sample_time);
            let sample_time = last_sample_time + self.sampling_interval;
            self.state = State::Running {
                last_sample_time: sample_time,
            };
            self.last_emitted_count = self.request_count;
            Some(SampleRecord {
                sample_time,
                metric_name: self.metric_name.clone(),
                value: self.request_count,
            })
        } else {
            None
        };

        self.request_count += 1;
        record
    }

    fn warn_on_skipped_boundaries(&self, elapsed: TimeDelta, last_sample_time: DateTime<Utc>) {
        let interval = self.sampling_interval.num_seconds();
        if interval <= 0 {
            return;
        }
        // boundaries strictly before the event, beyond the one being emitted
        let skipped = (elapsed.num_seconds() - 1) / interval - 1;
        if skipped > 0 {
            warn!(
                skipped,
                last_sample_time = %last_sample_time,
                elapsed_secs = elapsed.num_seconds(),
                "Gap between requests spans several sampling intervals, only one sample emitted"
            );
        }
    }

    /// Total number of events observed so far.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Time of the last emitted sample, or of the first event if none was emitted yet.
    pub fn last_sample_time(&self) -> Option<DateTime<Utc>> {
        match self.state {
            State::Uninitialized => None,
            State::Running { last_sample_time } => Some(last_sample_time),
        }
    }

    /// Events counted since the last emitted sample.
    pub fn unsampled_count(&self) -> u64 {
        self.request_count - self.last_emitted_count
    }
}
