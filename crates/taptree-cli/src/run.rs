// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Streaming a token source through a reporter

use std::io::{self, BufRead, Write};

use taptree_core::{TapError, TokenReader};
use taptree_format::{Report, Reporter};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    /// The token source could not be read
    #[error("Failed to read tokens: {0}")]
    Read(#[source] TapError),

    /// The report could not be written
    #[error("Failed to write report: {0}")]
    Write(#[from] io::Error),
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passes: usize,
    pub failures: usize,
    pub pending: usize,
    pub bailed_out: bool,
    /// Lines that could not be decoded and were skipped
    pub skipped_lines: usize,
}

impl RunSummary {
    /// Whether the process should exit successfully
    #[must_use]
    pub fn success(&self) -> bool {
        self.failures == 0 && !self.bailed_out
    }

    fn from_report(report: &Report, skipped_lines: usize) -> Self {
        Self {
            passes: report.stats.passes,
            failures: report.stats.failures,
            pending: report.stats.pending,
            bailed_out: report.bailed_out,
            skipped_lines,
        }
    }
}

/// Translate every token from `input`, writing the report to `out` and
/// non-protocol output to `err` as it is produced
///
/// Undecodable lines are logged and skipped.
///
/// # Errors
///
/// Returns an error if reading `input` or writing either output fails.
pub fn run<R, W, E>(config: &Config, input: R, out: &mut W, err: &mut E) -> Result<RunSummary, RunError>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut reporter = Reporter::new(config.reporter, config.format_options());
    let mut skipped_lines = 0;

    for token in TokenReader::new(input) {
        match token {
            Ok(token) => reporter.write(token),
            Err(TapError::InvalidToken { line, source }) => {
                warn!(line, error = %source, "Skipping undecodable token");
                skipped_lines += 1;
                continue;
            }
            Err(e) => return Err(RunError::Read(e)),
        }
        out.write_all(reporter.take_output().as_bytes())?;
        err.write_all(reporter.take_extra().as_bytes())?;
    }

    if !reporter.is_ended() {
        debug!("Token stream ended without a final plan");
    }
    let report = reporter.end();
    out.write_all(report.output.as_bytes())?;
    err.write_all(report.extra.as_bytes())?;
    out.flush()?;
    err.flush()?;

    let summary = RunSummary::from_report(&report, skipped_lines);
    info!(
        passes = summary.passes,
        failures = summary.failures,
        pending = summary.pending,
        bailed_out = summary.bailed_out,
        "Run complete"
    );
    Ok(summary)
}
