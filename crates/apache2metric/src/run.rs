// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Drives a downsampling run from input files to the sample sink.

use std::io::Write;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::downsampler::Downsampler;
use crate::errors::{Error, Result};
use crate::input::LogStream;
use crate::output::SampleWriter;
use crate::timestamp::LogEvent;

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Lines read and parsed
    pub lines: usize,
    /// Records written to the sink
    pub samples: usize,
    /// Final cumulative request count
    pub request_count: u64,
    /// Requests counted after the last emitted sample, not reported in the output
    pub unsampled: u64,
}

/// Opens the configured files and downsamples them into `out`.
pub fn run<W: Write>(config: &Config, out: W) -> Result<RunSummary> {
    config.validate()?;
    info!(
        files = config.files.len(),
        metric_name = %config.metric_name,
        sampling_interval = ?config.sampling_interval,
        "Starting downsampling run"
    );
    let lines = LogStream::open(config.files.as_slice())?;
    downsample(config, lines, out)
}

/// Downsamples an already opened stream into `out`.
///
/// Records written before a failure are flushed to `out` before the error is
/// returned.
pub fn downsample<W: Write>(config: &Config, lines: LogStream, out: W) -> Result<RunSummary> {
    let mut downsampler = Downsampler::new(
        config.metric_name.clone(),
        config.sampling_interval_delta()?,
    );
    let mut writer = SampleWriter::new(out);

    let result = process(lines, &mut downsampler, &mut writer);
    let flushed = writer.flush();

    let lines = match result {
        Ok(lines) => lines,
        Err(e) => {
            if let Err(flush_err) = flushed {
                error!("Failed to flush samples after aborting run: {flush_err}");
            }
            return Err(e);
        }
    };
    flushed?;

    let summary = RunSummary {
        lines,
        samples: writer.written(),
        request_count: downsampler.request_count(),
        unsampled: downsampler.unsampled_count(),
    };
    info!(
        lines = summary.lines,
        samples = summary.samples,
        request_count = summary.request_count,
        unsampled = summary.unsampled,
        "Downsampling run complete"
    );
    Ok(summary)
}

fn process<W: Write>(
    lines: LogStream,
    downsampler: &mut Downsampler,
    writer: &mut SampleWriter<W>,
) -> Result<usize> {
    let mut processed = 0;
    for line in lines {
        let line = line?;
        let event = LogEvent::from_line(&line.text).map_err(|source| Error::Line {
            stream_line: line.stream_line,
            path: line.path.clone(),
            file_line: line.file_line,
            source,
        })?;

        if let Some(record) = downsampler.observe(&event) {
            debug!(
                sample_time = %record.sample_time,
                value = record.value,
                "Emitting sample"
            );
            writer.write_record(&record)?;
        }
        processed += 1;
    }
    Ok(processed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::errors::ExtractError;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config() -> Config {
        Config {
            files: vec![PathBuf::from("memory.log")],
            ..Default::default()
        }
    }

    fn stream(body: &str) -> LogStream {
        LogStream::from_readers(vec![(
            PathBuf::from("memory.log"),
            Cursor::new(body.as_bytes().to_vec()),
        )])
    }

    fn line_at(second: u32) -> String {
        format!(
            "127.0.0.1 - - [31/Dec/2012:23:{:02}:{:02} +0000] \"GET / HTTP/1.1\" 200 17\n",
            second / 60,
            second % 60
        )
    }

    #[test]
    fn test_reference_scenario() {
        let body: String = [0, 5, 9, 11, 15, 25].into_iter().map(line_at).collect();
        let mut out = Vec::new();

        let summary = downsample(&config(), stream(&body), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2012-12-31T23:00:10Z  reqcount  3\n2012-12-31T23:00:20Z  reqcount  4\n"
        );
        assert_eq!(
            summary,
            RunSummary {
                lines: 6,
                samples: 2,
                request_count: 6,
                unsampled: 2,
            }
        );
    }

    #[test]
    fn test_custom_metric_and_interval() {
        let body: String = [0, 30, 61, 125].into_iter().map(line_at).collect();
        let config = Config {
            metric_name: "hits".to_string(),
            sampling_interval: Duration::from_secs(60),
            ..config()
        };
        let mut out = Vec::new();

        downsample(&config, stream(&body), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2012-12-31T23:01:00Z  hits  2\n2012-12-31T23:02:00Z  hits  3\n"
        );
    }

    #[test]
    fn test_empty_input() {
        let mut out = Vec::new();
        let summary = downsample(&config(), stream(""), &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_bad_line_halts_and_keeps_earlier_output() {
        let mut body: String = [0, 11].into_iter().map(line_at).collect();
        body.push_str("this line has no timestamp\n");
        body.push_str(&line_at(40));
        let mut out = Vec::new();

        let err = downsample(&config(), stream(&body), &mut out).unwrap_err();

        match err {
            Error::Line {
                stream_line,
                file_line,
                source: ExtractError::MalformedLine { .. },
                ..
            } => {
                assert_eq!(stream_line, 3);
                assert_eq!(file_line, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2012-12-31T23:00:10Z  reqcount  1\n"
        );
    }

    #[test]
    fn test_bad_timestamp_reports_parse_error() {
        let body = format!("{}[31/Dec/2012 23:00:05]\n", line_at(0));
        let err = downsample(&config(), stream(&body), Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Line {
                stream_line: 2,
                source: ExtractError::TimestampParse { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let err = run(&Config::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }
}
