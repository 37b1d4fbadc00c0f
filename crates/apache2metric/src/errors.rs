// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Why a bracketed value could not be read as a request time
#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    #[error("expected the form DD/Mon/YYYY:HH:MM:SS +ZZZZ")]
    Shape,

    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
}

/// Errors raised while extracting the request time from a single log line
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("line does not contain a brace-enclosed timestamp: {line}")]
    MalformedLine { line: String },

    #[error("invalid timestamp '{value}': {source}")]
    TimestampParse {
        value: String,
        #[source]
        source: TimestampError,
    },
}

/// Errors that abort a downsampling run. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot open {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {stream_line}: failed to extract timestamp: {source}")]
    Line {
        stream_line: usize,
        path: PathBuf,
        file_line: usize,
        #[source]
        source: ExtractError,
    },

    #[error("failed writing samples: {0}")]
    Write(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error. Runs either succeed (0) or abort (1).
    pub fn exit_code(&self) -> u8 {
        1
    }
}

pub type Result<T> = std::result::Result<T, Error>;
