// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for taptree-format

use thiserror::Error;

/// Errors that can occur while selecting or configuring a formatter
#[derive(Debug, Error)]
pub enum FormatError {
    /// No formatter is registered under this name
    #[error("Unknown reporter: {name} (expected one of: spec, summary)")]
    UnknownReporter {
        /// The requested reporter name
        name: String,
    },

    /// Unknown diff style name
    #[error("Unknown diff style: {name} (expected unified or inline)")]
    UnknownDiffStyle {
        /// The requested style name
        name: String,
    },
}
