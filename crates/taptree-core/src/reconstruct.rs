// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Failure detail reconstruction
//!
//! Turns the diagnostic block of a failed assertion into a
//! [`ReconstructedError`]: a normalized name/message/stack triple plus the
//! comparison values a formatter needs to decide whether to render a diff.
//! Nothing here renders text.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::token::AssertResult;

/// Prefix for every revived stack frame
const FRAME_PREFIX: &str = "    at ";

/// Fallback message when an assertion carries no name
const UNNAMED: &str = "(unnamed error)";

/// Normalized failure description for a failed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedError {
    /// Error class name
    pub name: String,
    /// Error message
    pub message: String,
    /// `"<name>: <message>"` followed by frame lines, if a stack was reported
    pub stack: Option<String>,
    /// Actual value of a failed comparison
    pub actual: Option<Value>,
    /// Expected value of a failed comparison
    pub expected: Option<Value>,
    /// Pre-rendered unified diff
    pub diff: Option<String>,
    /// Whether the consumer should render a comparison view
    pub show_diff: bool,
    /// Whether the failure was an uncaught exception
    pub uncaught: bool,
}

impl fmt::Display for ReconstructedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Build the failure description for an assertion
///
/// Missing fields degrade: no stack gives `stack: None`, no message falls
/// back to the assertion name.
#[must_use]
pub fn reconstruct(result: &AssertResult) -> ReconstructedError {
    let diag = result.diag.as_ref();
    let fallback_message = || {
        if result.name.is_empty() {
            UNNAMED.to_string()
        } else {
            result
                .name
                .strip_prefix("Error: ")
                .unwrap_or(&result.name)
                .to_string()
        }
    };

    let (name, message, raw_stack) = match diag.and_then(|d| d.error.as_ref()) {
        Some(error) => (
            error.name.clone().unwrap_or_else(|| "Error".to_string()),
            error.message.clone().unwrap_or_else(fallback_message),
            error.stack.as_deref(),
        ),
        None => (
            "Error".to_string(),
            fallback_message(),
            diag.and_then(|d| d.stack.as_deref()),
        ),
    };

    let stack = raw_stack
        .and_then(revive_stack)
        .map(|frames| format!("{name}: {message}\n{frames}"));

    let mut error = ReconstructedError {
        name,
        message,
        stack,
        actual: None,
        expected: None,
        diff: None,
        show_diff: false,
        uncaught: false,
    };

    if let Some(diag) = diag {
        error.actual = diag.found.clone();
        error.expected = diag.wanted.clone();
        error.diff = diag.diff_text().map(str::to_string);
        error.show_diff = (diag.found.is_some() && diag.wanted.is_some()) || diag.diff.is_some();
        error.uncaught = diag
            .extra
            .get("tapCaught")
            .and_then(Value::as_str)
            .is_some_and(|caught| caught.starts_with("uncaught"));
    }

    error
}

/// Rewrite each line of a raw stack as a call-frame line
fn revive_stack(stack: &str) -> Option<String> {
    let stack = stack.trim();
    if stack.is_empty() {
        return None;
    }

    Some(
        stack
            .lines()
            .map(|line| format!("{FRAME_PREFIX}{line}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
