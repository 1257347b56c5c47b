// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! taptree command-line library
//!
//! Exposes the argument parser and the streaming run loop for integration
//! tests and embedding.

pub mod config;
pub mod run;

pub use config::{Config, ConfigError};
pub use run::{RunError, RunSummary, run};
