// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! taptree: render JSON-encoded TAP token streams as test reports

use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use taptree_cli::{Config, run};
use tracing::debug;

fn main() -> anyhow::Result<ExitCode> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate()?;
    debug!(reporter = %config.reporter, input = ?config.input_path(), "Starting taptree");

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let summary = match config.input_path() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            run(&config, BufReader::new(file), &mut out, &mut err)?
        }
        None => run(&config, io::stdin().lock(), &mut out, &mut err)?,
    };

    Ok(if summary.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
