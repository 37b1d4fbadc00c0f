// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use clap::Parser;

use crate::errors::Error;
use crate::util::{parse_duration, parse_metric_name};

pub const DEFAULT_METRIC_NAME: &str = "reqcount";
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

const DESCRIPTION: &str = "\
Takes a sequence of Apache request log files (in increasing order of time) and
downsamples them. The output, written to stdout, is an increasing request count:
requests are counted over the sampling interval and reported as an accumulated
sum at every sampling point. The output can be ingested into a time-series
database such as InfluxDB.

Each output line looks as follows:

  # time (ISO8601)      metric    value
  2012-12-31T23:00:00Z  reqcount  100
  2012-12-31T23:00:10Z  reqcount  150
  2012-12-31T23:00:20Z  reqcount  210";

/// Command-line arguments. Every option can also be set through the environment.
#[derive(Debug, Parser)]
#[command(name = "apache2metric", version, about = "Downsample Apache request logs into a request count series", long_about = DESCRIPTION)]
pub struct Args {
    /// The metric name to use in the output
    #[arg(long, env = "APACHE2METRIC_METRIC_NAME", default_value = DEFAULT_METRIC_NAME)]
    pub metric_name: String,

    /// The sampling interval between reported request counts (e.g. 10s, 1m, 1h30m)
    #[arg(long, env = "APACHE2METRIC_SAMPLING_INTERVAL", default_value = "10s", value_parser = parse_duration)]
    pub sampling_interval: Duration,

    /// Diagnostic log level, written to stderr (trace, debug, info, warn, error)
    #[arg(long, env = "APACHE2METRIC_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Apache log files, oldest first
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Configuration for a single downsampling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Metric name written in every output record
    pub metric_name: String,
    /// Time between successive sample points; whole seconds only
    pub sampling_interval: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// Input files, read in order as one stream
    pub files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            files: Vec::new(),
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let config = Self {
            metric_name: args.metric_name.trim().to_string(),
            sampling_interval: args.sampling_interval,
            log_level: args.log_level.to_lowercase(),
            files: args.files,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.files.is_empty() {
            return Err(Error::Usage("no apache log files given".to_string()));
        }

        if parse_metric_name(&self.metric_name).as_deref() != Some(self.metric_name.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "Invalid metric name '{}'. Must be non-empty and contain no whitespace",
                self.metric_name
            )));
        }

        self.sampling_interval_delta()?;

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// The sampling interval as a signed time delta, validated to be a positive
    /// whole number of seconds since request times carry second precision.
    pub fn sampling_interval_delta(&self) -> Result<TimeDelta, Error> {
        let interval = self.sampling_interval;
        if interval.subsec_nanos() != 0 || interval.as_secs() == 0 {
            return Err(Error::InvalidConfig(format!(
                "Invalid sampling interval {interval:?}. Must be a positive whole number of seconds"
            )));
        }
        i64::try_from(interval.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                Error::InvalidConfig(format!("Sampling interval {interval:?} is too large"))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config_with_file() -> Config {
        Config {
            files: vec![PathBuf::from("access.log")],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_with_file_is_valid() {
        let config = config_with_file();
        assert!(config.validate().is_ok());
        assert_eq!(config.metric_name, "reqcount");
        assert_eq!(config.sampling_interval_delta().unwrap(), TimeDelta::seconds(10));
    }

    #[test]
    fn test_validate_no_files() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Usage(_))));
    }

    #[test]
    fn test_validate_metric_name() {
        for name in ["", "  ", "req count"] {
            let config = Config {
                metric_name: name.to_string(),
                ..config_with_file()
            };
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_metric_name_message_carries_reason() {
        let config = Config {
            metric_name: "req count".to_string(),
            ..config_with_file()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("'req count'"));
        assert!(message.contains("contain no whitespace"));
    }

    #[test]
    fn test_validate_sampling_interval() {
        for interval in [
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_millis(1500),
            Duration::from_secs(u64::MAX),
        ] {
            let config = Config {
                sampling_interval: interval,
                ..config_with_file()
            };
            assert!(
                config.validate().is_err(),
                "{interval:?} should be rejected"
            );
        }

        let config = Config {
            sampling_interval: Duration::from_secs(90),
            ..config_with_file()
        };
        assert_eq!(config.sampling_interval_delta().unwrap(), TimeDelta::seconds(90));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "verbose".to_string(),
            ..config_with_file()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["apache2metric", "a.log", "b.log"]).unwrap();
        let config = Config::try_from(args).unwrap();
        assert_eq!(
            config,
            Config {
                files: vec![PathBuf::from("a.log"), PathBuf::from("b.log")],
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "apache2metric",
            "--metric-name",
            "hits",
            "--sampling-interval",
            "1m",
            "--log-level",
            "DEBUG",
            "a.log",
        ])
        .unwrap();
        let config = Config::try_from(args).unwrap();
        assert_eq!(config.metric_name, "hits");
        assert_eq!(config.sampling_interval, Duration::from_secs(60));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_args_without_files_is_usage_error() {
        let args = Args::try_parse_from(["apache2metric"]).unwrap();
        assert!(args.files.is_empty());
        assert!(matches!(Config::try_from(args), Err(Error::Usage(_))));
    }

    #[test]
    fn test_args_reject_bad_duration() {
        assert!(
            Args::try_parse_from(["apache2metric", "--sampling-interval", "soon", "a.log"])
                .is_err()
        );
    }
}
