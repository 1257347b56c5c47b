// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for taptree-core

use thiserror::Error;

/// Errors that can occur while decoding a token stream
///
/// Translation itself never fails; these only arise at the transport edge,
/// where tokens are read and decoded.
#[derive(Debug, Error)]
pub enum TapError {
    /// Error parsing JSON
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Error reading the token stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of the token stream could not be decoded
    #[error("Invalid token on line {line}: {source}")]
    InvalidToken {
        /// 1-based line number in the token stream
        line: usize,
        /// Underlying decode error
        source: serde_json::Error,
    },
}
