// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Downsamples Apache access logs into a cumulative request count series.
//!
//! Log lines are read from one or more files in chronological order. The request
//! time of each line is extracted and fed to a [`downsampler::Downsampler`], which
//! emits a [`downsampler::SampleRecord`] each time a sampling boundary is crossed.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod downsampler;
pub mod errors;
pub mod input;
pub mod output;
pub mod run;
pub mod timestamp;
pub mod util;

pub use config::{Args, Config};
pub use errors::{Error, Result};
pub use run::{run, RunSummary};
