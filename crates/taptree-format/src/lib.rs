// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! taptree-format: human-readable reports for taptree lifecycle events
//!
//! Formatters are [`EventSink`](taptree_core::EventSink)s. Feed them from a
//! [`Translator`](taptree_core::Translator) directly, or let a [`Reporter`]
//! do the wiring.
//!
//! # Example
//!
//! ```
//! use taptree_format::prelude::*;
//! use taptree_core::token::{AssertResult, Results, Token};
//!
//! let report = render(
//!     ReporterKind::Spec,
//!     FormatOptions::default(),
//!     vec![
//!         Token::Assert(AssertResult::pass("parses input")),
//!         Token::Complete(Results::passing(1)),
//!     ],
//! );
//! assert!(report.output.contains("✓ parses input"));
//! assert!(report.success());
//! ```

use std::fmt;
use std::str::FromStr;

pub mod base;
pub mod diff;
pub mod error;
pub mod reporter;
pub mod spec;
pub mod stack_filter;
pub mod summary;

pub use base::{BaseFormatter, FormatOptions, Formatter, format_duration};
pub use diff::DiffStyle;
pub use error::FormatError;
pub use reporter::{Report, Reporter, render};
pub use spec::SpecFormatter;
pub use stack_filter::StackFilter;
pub use summary::SummaryFormatter;

/// Built-in formatters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReporterKind {
    /// Nested suites and tests followed by the epilogue
    #[default]
    Spec,
    /// Epilogue only
    Summary,
}

impl ReporterKind {
    /// All built-in reporter names
    pub const NAMES: &'static [&'static str] = &["spec", "summary"];

    /// Instantiate the formatter
    #[must_use]
    pub fn build(self, options: FormatOptions) -> Box<dyn Formatter> {
        match self {
            Self::Spec => Box::new(SpecFormatter::new(options)),
            Self::Summary => Box::new(SummaryFormatter::new(options)),
        }
    }
}

impl FromStr for ReporterKind {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spec" => Ok(Self::Spec),
            "summary" => Ok(Self::Summary),
            _ => Err(FormatError::UnknownReporter {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spec => f.write_str("spec"),
            Self::Summary => f.write_str("summary"),
        }
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ReporterKind;
    pub use crate::base::{FormatOptions, Formatter};
    pub use crate::diff::DiffStyle;
    pub use crate::error::FormatError;
    pub use crate::reporter::{Report, Reporter, render};
}
