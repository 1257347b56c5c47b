// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Epilogue-only report

use taptree_core::{Event, EventSink};

use crate::base::{BaseFormatter, FormatOptions, Formatter};

/// Prints nothing until the run ends, then the pass/pending/fail summary
#[derive(Debug, Clone, Default)]
pub struct SummaryFormatter {
    base: BaseFormatter,
}

impl SummaryFormatter {
    #[must_use]
    pub fn new(options: FormatOptions) -> Self {
        Self::with_base(BaseFormatter::new(options))
    }

    #[must_use]
    pub fn with_base(base: BaseFormatter) -> Self {
        Self { base }
    }
}

impl EventSink for SummaryFormatter {
    fn emit(&mut self, event: &Event) {
        self.base.record(event);
        if matches!(event, Event::End) {
            self.base.epilogue();
        }
    }
}

impl Formatter for SummaryFormatter {
    fn base(&self) -> &BaseFormatter {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFormatter {
        &mut self.base
    }
}
