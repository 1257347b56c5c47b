// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Hierarchical spec-style report

use taptree_core::model::Speed;
use taptree_core::{Event, EventSink};

use crate::base::{BaseFormatter, FormatOptions, Formatter, SYMBOL_OK};

/// Prints each suite title with its tests nested beneath, then the epilogue
#[derive(Debug, Clone, Default)]
pub struct SpecFormatter {
    base: BaseFormatter,
    indents: usize,
}

impl SpecFormatter {
    #[must_use]
    pub fn new(options: FormatOptions) -> Self {
        Self::with_base(BaseFormatter::new(options))
    }

    /// Build on prepared shared state
    #[must_use]
    pub fn with_base(base: BaseFormatter) -> Self {
        Self { base, indents: 0 }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.indents.saturating_sub(1))
    }
}

impl EventSink for SpecFormatter {
    fn emit(&mut self, event: &Event) {
        self.base.record(event);

        match event {
            Event::Start => self.base.log(""),
            Event::Suite(suite) => {
                self.indents += 1;
                let line = format!("{}{}", self.indent(), suite.title);
                self.base.log(line);
            }
            Event::SuiteEnd(_) => {
                self.indents = self.indents.saturating_sub(1);
                if self.indents == 1 {
                    self.base.log("");
                }
            }
            Event::Pending(test) => {
                let line = format!("{}  - {}", self.indent(), test.title);
                self.base.log(line);
            }
            Event::Pass(test) => {
                let line = match self.base.speed(test) {
                    Speed::Fast => format!("{}  {SYMBOL_OK} {}", self.indent(), test.title),
                    _ => format!(
                        "{}  {SYMBOL_OK} {} ({}ms)",
                        self.indent(),
                        test.title,
                        test.duration.unwrap_or(0.0).round()
                    ),
                };
                self.base.log(line);
            }
            Event::Fail { test, .. } => {
                let line = format!(
                    "{}  {}) {}",
                    self.indent(),
                    self.base.stats().failures,
                    test.title
                );
                self.base.log(line);
            }
            Event::Bailout { reason, .. } => {
                let line = format!("{}  Bail out! {reason}", self.indent());
                self.base.log(line);
            }
            Event::End => self.base.epilogue(),
            _ => {}
        }
    }
}

impl Formatter for SpecFormatter {
    fn base(&self) -> &BaseFormatter {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFormatter {
        &mut self.base
    }
}
