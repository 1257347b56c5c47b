// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Command-line configuration for taptree
//!
//! Reporter choice, diff style and logging verbosity.

use std::path::PathBuf;

use clap::Parser;
use taptree_core::model::DEFAULT_SLOW_MS;
use taptree_format::{DiffStyle, FormatOptions, ReporterKind};

/// Render a stream of JSON-encoded TAP tokens as a test report
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "taptree")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File of newline-delimited JSON tokens
    ///
    /// Reads standard input when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Report style
    #[arg(short, long, env = "TAPTREE_REPORTER", default_value = "spec")]
    pub reporter: ReporterKind,

    /// Show failed comparisons as word-level inline diffs
    #[arg(long, default_value = "false")]
    pub inline_diffs: bool,

    /// Threshold in milliseconds above which a passing test is slow
    #[arg(long, env = "TAPTREE_SLOW")]
    pub slow: Option<f64>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs go to stderr so the report on stdout stays clean.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - only errors and warnings are logged
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Config {
    /// Input file, or `None` for standard input
    #[must_use]
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }

    /// Slow threshold, using the default if not specified
    #[must_use]
    pub fn slow_ms(&self) -> f64 {
        self.slow.unwrap_or(DEFAULT_SLOW_MS)
    }

    /// Formatter options derived from the flags
    #[must_use]
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            diff_style: if self.inline_diffs {
                DiffStyle::Inline
            } else {
                DiffStyle::Unified
            },
            slow_ms: self.slow_ms(),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input path is given but doesn't exist or isn't a file
    /// - The slow threshold is negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(input) = self.input_path() {
            if !input.exists() {
                return Err(ConfigError::InputNotFound(input.clone()));
            }
            if !input.is_file() {
                return Err(ConfigError::InputNotFile(input.clone()));
            }
        }

        if let Some(slow) = self.slow {
            if !slow.is_finite() || slow < 0.0 {
                return Err(ConfigError::InvalidSlowThreshold(slow));
            }
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input path not found
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Input path is not a regular file
    #[error("Input path is not a file: {0}")]
    InputNotFile(PathBuf),

    /// Slow threshold out of range
    #[error("Slow threshold must be a non-negative number of milliseconds, got {0}")]
    InvalidSlowThreshold(f64),
}
