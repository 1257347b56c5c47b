// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Comparison rendering for failed assertions
//!
//! The diff algorithm itself comes from `similar`; this module only shapes
//! its output into the indented blocks printed under a failure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::error::FormatError;

/// Indentation of every diff line under a failure header
const INDENT: &str = "      ";

/// How to render a failed comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStyle {
    /// Line-oriented `+`/`-` patch
    #[default]
    Unified,
    /// Word-level diff with `[-removed-]` / `{+added+}` markers
    Inline,
}

impl FromStr for DiffStyle {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unified" => Ok(Self::Unified),
            "inline" => Ok(Self::Inline),
            other => Err(FormatError::UnknownDiffStyle {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DiffStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unified => f.write_str("unified"),
            Self::Inline => f.write_str("inline"),
        }
    }
}

/// Make tabs, carriage returns and line feeds visible
#[must_use]
pub fn escape_invisibles(text: &str) -> String {
    text.replace('\t', "<tab>")
        .replace('\r', "<CR>")
        .replace('\n', "<LF>\n")
}

/// Render a unified diff of `actual` against `expected`
///
/// A producer-supplied `provided` patch is used as-is minus its two header
/// lines; otherwise the patch is computed. Hunk headers and "no newline"
/// markers are dropped. Blank lines inside the patch are kept.
#[must_use]
pub fn unified_diff(actual: &str, expected: &str, provided: Option<&str>, escape: bool) -> String {
    let patch = match provided {
        Some(diff) => diff.split('\n').skip(2).collect::<Vec<_>>().join("\n"),
        None => TextDiff::from_lines(actual, expected)
            .unified_diff()
            .to_string(),
    };

    let body = patch
        .split_terminator('\n')
        .filter_map(|line| clean_up(line, escape))
        .collect::<Vec<_>>()
        .join("\n");

    format!("\n{INDENT}+ expected - actual\n\n{body}")
}

fn clean_up(line: &str, escape: bool) -> Option<String> {
    if line.contains("@@") || line.contains("\\ No newline") {
        return None;
    }
    let line = if escape {
        escape_invisibles(line)
    } else {
        line.to_string()
    };
    Some(format!("{INDENT}{line}"))
}

/// Render a word-level diff of `actual` against `expected`
///
/// Outputs longer than four lines are numbered.
#[must_use]
pub fn inline_diff(actual: &str, expected: &str, escape: bool) -> String {
    let (actual, expected) = if escape {
        (escape_invisibles(actual), escape_invisibles(expected))
    } else {
        (actual.to_string(), expected.to_string())
    };

    let diff = TextDiff::from_words(actual.as_str(), expected.as_str());
    let mut marked = String::new();
    for change in diff.iter_all_changes() {
        let value = change.value();
        match change.tag() {
            ChangeTag::Delete => {
                marked.push_str("[-");
                marked.push_str(value);
                marked.push_str("-]");
            }
            ChangeTag::Insert => {
                marked.push_str("{+");
                marked.push_str(value);
                marked.push_str("+}");
            }
            ChangeTag::Equal => marked.push_str(value),
        }
    }

    let lines: Vec<&str> = marked.split('\n').collect();
    let body = if lines.len() > 4 {
        let width = lines.len().to_string().len();
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>width$} | {line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        marked.clone()
    };

    format!("\n[-actual-] {{+expected+}}\n\n{body}\n")
        .split('\n')
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
