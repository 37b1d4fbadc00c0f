// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::io;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use apache2metric::{run, Args, Config, Error};

const USAGE_EXIT_CODE: u8 = 1;

pub fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(USAGE_EXIT_CODE),
            };
        }
    };

    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(e) => return die(&e),
    };

    init_logging(&config.log_level);
    debug!("Logging subsystem enabled");

    match run(&config, io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Downsampling run aborted: {e:?}");
            die(&e)
        }
    }
}

fn init_logging(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {e}");
    }
}

fn die(e: &Error) -> ExitCode {
    eprintln!("error: {e}");
    if matches!(e, Error::Usage(_) | Error::FileOpen { .. }) {
        eprintln!("\n{}", Args::command().render_long_help());
    }
    ExitCode::from(e.exit_code())
}
