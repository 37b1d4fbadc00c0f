// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Reads a sequence of log files as one ordered stream of lines.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Error, Result};

/// One trimmed line of input along with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub path: PathBuf,
    /// 1-based position within `path`
    pub file_line: usize,
    /// 1-based position across all inputs
    pub stream_line: usize,
    pub text: String,
}

struct Source {
    path: PathBuf,
    reader: Box<dyn BufRead>,
}

/// Lines of every input, file after file, in the order the files were given.
pub struct LogStream {
    sources: std::vec::IntoIter<Source>,
    current: Option<Source>,
    file_line: usize,
    stream_line: usize,
    buf: Vec<u8>,
}

impl LogStream {
    /// Opens every path before anything is read, failing on the first one that
    /// cannot be opened.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file = File::open(path).map_err(|source| Error::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "Opened log file");
            sources.push(Source {
                path: path.to_path_buf(),
                reader: Box::new(BufReader::new(file)),
            });
        }
        Ok(Self::from_sources(sources))
    }

    /// Builds a stream over in-memory or otherwise pre-opened readers.
    pub fn from_readers<R>(readers: Vec<(PathBuf, R)>) -> Self
    where
        R: Read + 'static,
    {
        let sources = readers
            .into_iter()
            .map(|(path, reader)| Source {
                path,
                reader: Box::new(BufReader::new(reader)),
            })
            .collect();
        Self::from_sources(sources)
    }

    fn from_sources(sources: Vec<Source>) -> Self {
        let mut sources = sources.into_iter();
        let current = sources.next();
        Self {
            sources,
            current,
            file_line: 0,
            stream_line: 0,
            buf: Vec::new(),
        }
    }
}

impl Iterator for LogStream {
    type Item = Result<LogLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let source = self.current.as_mut()?;
            self.buf.clear();
            match source.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    debug!(path = %source.path.display(), lines = self.file_line, "Finished log file");
                    self.current = self.sources.next();
                    self.file_line = 0;
                }
                Ok(_) => {
                    self.file_line += 1;
                    self.stream_line += 1;
                    return Some(Ok(LogLine {
                        path: source.path.clone(),
                        file_line: self.file_line,
                        stream_line: self.stream_line,
                        text: String::from_utf8_lossy(&self.buf).trim().to_string(),
                    }));
                }
                Err(source_err) => {
                    let path = source.path.clone();
                    // a failed source is not retried
                    self.current = None;
                    self.sources = Vec::new().into_iter();
                    return Some(Err(Error::Read {
                        path,
                        source: source_err,
                    }));
                }
            }
        }
    }
}
