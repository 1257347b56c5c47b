// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Shared formatter state and the end-of-run epilogue

use serde_json::Value;
use taptree_core::model::{DEFAULT_SLOW_MS, Speed, Test};
use taptree_core::{Event, EventSink, ReconstructedError, Stats};

use crate::diff::{DiffStyle, inline_diff, unified_diff};
use crate::stack_filter::StackFilter;

/// Symbol printed before a passing test
pub const SYMBOL_OK: &str = "✓";
/// Symbol for a failed test
pub const SYMBOL_ERR: &str = "✖";
/// Progress dot
pub const SYMBOL_DOT: &str = "․";

// ============================================================================
// Options
// ============================================================================

/// Rendering options shared by every formatter
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// How failed comparisons are rendered
    pub diff_style: DiffStyle,
    /// Tests slower than this many milliseconds are reported as slow
    pub slow_ms: f64,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            diff_style: DiffStyle::default(),
            slow_ms: DEFAULT_SLOW_MS,
        }
    }
}

// ============================================================================
// Formatter trait
// ============================================================================

/// An event consumer that renders a human-readable report
///
/// Implementors own a [`BaseFormatter`] and get output buffering, stats and
/// failure bookkeeping through it.
pub trait Formatter: EventSink {
    /// Shared state
    fn base(&self) -> &BaseFormatter;

    /// Shared state, mutably
    fn base_mut(&mut self) -> &mut BaseFormatter;

    /// Drain rendered report text
    fn take_output(&mut self) -> String {
        self.base_mut().take_output()
    }

    /// Drain buffered non-protocol output
    fn take_extra(&mut self) -> String {
        self.base_mut().take_extra()
    }

    /// Counters so far
    fn stats(&self) -> &Stats {
        self.base().stats()
    }

    /// Check if a bailout was seen
    fn bailed_out(&self) -> bool {
        self.base().bailed_out()
    }
}

// ============================================================================
// BaseFormatter
// ============================================================================

/// Stats, failure list and output buffers common to all formatters
#[derive(Debug, Clone)]
pub struct BaseFormatter {
    stats: Stats,
    failures: Vec<Test>,
    output: String,
    extra: String,
    bailout: Option<String>,
    options: FormatOptions,
    stack_filter: StackFilter,
}

impl BaseFormatter {
    /// Create an empty formatter state
    #[must_use]
    pub fn new(options: FormatOptions) -> Self {
        Self {
            stats: Stats::new(),
            failures: Vec::new(),
            output: String::new(),
            extra: String::new(),
            bailout: None,
            options,
            stack_filter: StackFilter::new(),
        }
    }

    /// Replace the stack filter
    #[must_use]
    pub fn with_stack_filter(mut self, stack_filter: StackFilter) -> Self {
        self.stack_filter = stack_filter;
        self
    }

    /// Update bookkeeping for one event
    ///
    /// Formatters call this before rendering so counters are current.
    pub fn record(&mut self, event: &Event) {
        self.stats.record(event);
        match event {
            Event::Fail { test, .. } => self.failures.push(test.clone()),
            Event::Extra { text } => self.extra.push_str(text),
            Event::Bailout { reason, .. } => {
                if self.bailout.is_none() {
                    self.bailout = Some(reason.clone());
                }
            }
            _ => {}
        }
    }

    /// Append one line of output
    pub fn log(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    /// Speed class of a test under the configured threshold
    #[must_use]
    pub fn speed(&self, test: &Test) -> Speed {
        test.speed(self.options.slow_ms)
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    #[must_use]
    pub fn failures(&self) -> &[Test] {
        &self.failures
    }

    #[must_use]
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    #[must_use]
    pub fn bailed_out(&self) -> bool {
        self.bailout.is_some()
    }

    /// Reason of the first bailout, if any
    #[must_use]
    pub fn bailout_reason(&self) -> Option<&str> {
        self.bailout.as_deref()
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn take_extra(&mut self) -> String {
        std::mem::take(&mut self.extra)
    }

    /// Render the pass/pending/fail summary and every failure block
    pub fn epilogue(&mut self) {
        self.log("");
        self.log(format!(
            "  {} passing ({})",
            self.stats.passes,
            format_duration(self.stats.duration_ms())
        ));

        if self.stats.pending > 0 {
            self.log(format!("  {} pending", self.stats.pending));
        }

        if self.stats.failures > 0 {
            self.log(format!("  {} failing\n", self.stats.failures));
            let blocks: Vec<String> = self
                .failures
                .iter()
                .enumerate()
                .map(|(index, test)| self.render_failure(index, test))
                .collect();
            for block in blocks {
                self.log(block);
            }
        }
    }

    fn render_failure(&self, index: usize, test: &Test) -> String {
        let number = index + 1;
        let Some(err) = test.error.as_ref() else {
            return format!("  {number}) {}:\n     \n\n", test.full_title);
        };

        let message = err.message.as_str();
        let stack = err.stack.as_deref().unwrap_or(message);
        let stack_index = stack.find(message).map_or(0, |i| i + message.len());

        let mut msg = stack[..stack_index].to_string();
        if err.uncaught {
            msg = format!("Uncaught {msg}");
        }

        let mut separator = "\n     ";
        if let Some((actual, expected, escape)) = comparable(err) {
            separator = "\n";
            let lead = expected_prefix(message).map_or_else(|| msg.clone(), str::to_string);
            let diff = match (self.options.diff_style, err.actual.is_some()) {
                (DiffStyle::Inline, true) => inline_diff(&actual, &expected, escape),
                _ => unified_diff(&actual, &expected, err.diff.as_deref(), escape),
            };
            msg = format!("\n      {lead}{diff}");
        }

        let rest = if stack_index > 0 {
            stack.get(stack_index + 1..).unwrap_or("")
        } else {
            stack
        };
        let indented = rest
            .split('\n')
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        let trace = self.stack_filter.filter(&indented);

        format!("  {number}) {}:{separator}{msg}\n{trace}\n", test.full_title)
    }
}

impl Default for BaseFormatter {
    fn default() -> Self {
        Self::new(FormatOptions::default())
    }
}

/// Values to diff when the error asks for a diff and the two sides share
/// a JSON type; strings are compared raw with invisibles escaped
fn comparable(err: &ReconstructedError) -> Option<(String, String, bool)> {
    if !err.show_diff {
        return None;
    }
    match (&err.actual, &err.expected) {
        (Some(Value::String(actual)), Some(Value::String(expected))) => {
            Some((actual.clone(), expected.clone(), true))
        }
        (Some(actual), Some(expected)) if same_kind(actual, expected) => {
            Some((actual.to_string(), expected.to_string(), false))
        }
        (None, None) if err.diff.is_some() => Some((String::new(), String::new(), false)),
        _ => None,
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// `"<head>: expected ..."` yields `<head>`
fn expected_prefix(message: &str) -> Option<&str> {
    let (head, tail) = message.split_once(':')?;
    (!head.is_empty() && tail.starts_with(" expected")).then_some(head)
}

/// Humanise a millisecond duration
#[must_use]
pub fn format_duration(ms: f64) -> String {
    const SECOND: f64 = 1000.0;
    const MINUTE: f64 = SECOND * 60.0;
    const HOUR: f64 = MINUTE * 60.0;
    const DAY: f64 = HOUR * 24.0;

    if ms >= DAY {
        format!("{}d", (ms / DAY).round())
    } else if ms >= HOUR {
        format!("{}h", (ms / HOUR).round())
    } else if ms >= MINUTE {
        format!("{}m", (ms / MINUTE).round())
    } else if ms >= SECOND {
        format!("{}s", (ms / SECOND).round())
    } else {
        format!("{ms}ms")
    }
}
