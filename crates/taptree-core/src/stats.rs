// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run statistics

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventSink};

/// `# time=<number><unit?>` with unit `ms` (default) or `s`
fn time_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#\s*time=((?:0|[1-9][0-9]*?)(?:\.[0-9]+)?)(ms|s)?$")
            .expect("time comment pattern is valid")
    })
}

/// Parse a `# time=` comment into milliseconds
#[must_use]
pub fn parse_time_comment(comment: &str) -> Option<f64> {
    let captures = time_comment_re().captures(comment.trim())?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    match captures.get(2).map(|m| m.as_str()) {
        Some("s") => Some(value * 1000.0),
        _ => Some(value),
    }
}

/// Counters accumulated as events are emitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// `suite` events seen
    pub suites: usize,
    /// `test end` events seen
    pub tests: usize,
    /// `pass` events seen
    pub passes: usize,
    /// `pending` events seen
    pub pending: usize,
    /// `fail` events seen
    pub failures: usize,
    /// When the run started
    pub start: Option<DateTime<Utc>>,
    /// When the run ended
    pub end: Option<DateTime<Utc>>,
    /// Run duration in milliseconds
    pub duration: Option<f64>,
}

impl Stats {
    /// Create zeroed stats
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update counters for one event
    pub fn record(&mut self, event: &Event) {
        match event {
            Event::Start => self.start = Some(Utc::now()),
            Event::Suite(_) => self.suites += 1,
            Event::TestEnd(_) => self.tests += 1,
            Event::Pass(_) => self.passes += 1,
            Event::Pending(_) => self.pending += 1,
            Event::Fail { .. } => self.failures += 1,
            Event::Comment { text } => {
                if let Some(ms) = parse_time_comment(text) {
                    self.duration = Some(ms);
                }
            }
            Event::End => {
                let end = Utc::now();
                self.end = Some(end);
                if self.duration.is_none() {
                    self.duration = self
                        .start
                        .map(|start| (end - start).num_milliseconds() as f64);
                }
            }
            _ => {}
        }
    }

    /// Run duration, zero if unknown
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }

    /// Check if any test failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }
}

impl EventSink for Stats {
    fn emit(&mut self, event: &Event) {
        self.record(event);
    }
}
