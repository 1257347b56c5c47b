// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Translator and formatter wired together

use taptree_core::{Stats, SuiteTree, Token, Translator};
use tracing::debug;

use crate::ReporterKind;
use crate::base::{FormatOptions, Formatter};

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct Report {
    /// Suites and tests of the run
    pub tree: SuiteTree,
    /// Final counters
    pub stats: Stats,
    /// Report text not yet drained
    pub output: String,
    /// Non-protocol output not yet drained
    pub extra: String,
    /// Whether the stream bailed out
    pub bailed_out: bool,
}

impl Report {
    /// A run succeeds when nothing failed and nothing bailed out
    #[must_use]
    pub fn success(&self) -> bool {
        !self.bailed_out && !self.stats.has_failures()
    }
}

/// Feeds tokens through a [`Translator`] into a [`Formatter`]
pub struct Reporter {
    translator: Translator,
    formatter: Box<dyn Formatter>,
}

impl Reporter {
    /// Create a reporter using a built-in formatter
    #[must_use]
    pub fn new(kind: ReporterKind, options: FormatOptions) -> Self {
        Self::with_formatter(kind.build(options))
    }

    /// Create a reporter around any formatter
    #[must_use]
    pub fn with_formatter(formatter: Box<dyn Formatter>) -> Self {
        Self {
            translator: Translator::new(),
            formatter,
        }
    }

    /// Translate and render one token
    pub fn write(&mut self, token: Token) {
        self.translator.push(token, &mut *self.formatter);
    }

    /// Drain report text rendered so far
    pub fn take_output(&mut self) -> String {
        self.formatter.take_output()
    }

    /// Drain non-protocol output seen so far
    pub fn take_extra(&mut self) -> String {
        self.formatter.take_extra()
    }

    /// Whether the root stream has completed
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.translator.is_ended()
    }

    /// Finish the run, closing anything a truncated stream left open
    pub fn end(self) -> Report {
        let Self {
            translator,
            mut formatter,
        } = self;

        let tree = translator.finish(&mut *formatter);
        let report = Report {
            tree,
            stats: formatter.stats().clone(),
            output: formatter.take_output(),
            extra: formatter.take_extra(),
            bailed_out: formatter.bailed_out(),
        };
        debug!(
            passes = report.stats.passes,
            failures = report.stats.failures,
            pending = report.stats.pending,
            bailed_out = report.bailed_out,
            "Report finished"
        );
        report
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("translator", &self.translator)
            .field("stats", self.formatter.stats())
            .finish_non_exhaustive()
    }
}

/// Render a complete token sequence in one go
#[must_use]
pub fn render(
    kind: ReporterKind,
    options: FormatOptions,
    tokens: impl IntoIterator<Item = Token>,
) -> Report {
    let mut reporter = Reporter::new(kind, options);
    for token in tokens {
        reporter.write(token);
    }
    reporter.end()
}
