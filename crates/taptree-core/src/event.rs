// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Lifecycle events emitted by the translator

use serde::Serialize;

use crate::model::{Suite, Test};
use crate::reconstruct::ReconstructedError;

/// A single lifecycle event
///
/// `Suite` and `SuiteEnd` are strictly nested. Suites and tests are
/// snapshots taken at emission time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The run began
    Start,
    /// Root-level `TAP version` line
    Version {
        /// Protocol version
        version: u32,
    },
    /// Root-level raw protocol line
    Line {
        /// The raw line
        text: String,
    },
    /// Root-level comment
    Comment {
        /// Comment text, including the leading `#`
        text: String,
    },
    /// Non-protocol output
    Extra {
        /// The raw text
        text: String,
    },
    /// A suite opened
    Suite(Suite),
    /// A suite closed
    SuiteEnd(Suite),
    /// A test was recorded
    Test(Test),
    /// The test passed
    Pass(Test),
    /// The test failed
    Fail {
        /// The failed test
        test: Test,
        /// Reconstructed failure detail
        error: ReconstructedError,
    },
    /// The test was skipped or marked todo
    Pending(Test),
    /// All events for a test have been emitted
    TestEnd(Test),
    /// The stream bailed out
    Bailout {
        /// Reason given by the producer
        reason: String,
        /// Suite that was open at the bailing level
        suite: Option<Suite>,
    },
    /// The run finished
    End,
}

/// Receiver of lifecycle events
pub trait EventSink {
    /// Handle one event
    fn emit(&mut self, event: &Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: &Event) {
        self.push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &Event) {
        (**self).emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &Event) {
        (**self).emit(event);
    }
}
