// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io::{BufWriter, Write};

use crate::downsampler::SampleRecord;
use crate::errors::Result;

/// Buffered line sink for sample records.
pub struct SampleWriter<W: Write> {
    writer: BufWriter<W>,
    written: usize,
}

impl<W: Write> SampleWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            written: 0,
        }
    }

    pub fn write_record(&mut self, record: &SampleRecord) -> Result<()> {
        writeln!(self.writer, "{record}")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records handed to the sink so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::errors::Error::Write(e.into_error()))
    }
}
