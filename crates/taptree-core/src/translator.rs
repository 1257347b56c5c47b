// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! TAP token stream to lifecycle event translation
//!
//! The [`Translator`] keeps one [`Handle`] per nesting level on an explicit
//! stack. The top of the stack receives every token. A [`Token::Child`]
//! pushes a handle; the child's [`Token::Complete`] pops it and parks it on
//! the parent until the parent's next assertion, which is the subtest's
//! closing assertion.
//!
//! Suites are created lazily: a handle only opens a suite once it has a
//! name (from a `# Subtest: <name>` comment) and is certain to produce a
//! test, i.e. on its first child or direct assertion.
//!
//! # Example
//!
//! ```
//! use taptree_core::event::Event;
//! use taptree_core::token::{AssertResult, Results, Token};
//! use taptree_core::translator::Translator;
//!
//! let mut translator = Translator::new();
//! let mut events: Vec<Event> = Vec::new();
//!
//! translator.push(Token::Child, &mut events);
//! translator.push(Token::Comment { text: "# Subtest: math".into() }, &mut events);
//! translator.push(Token::Assert(AssertResult::pass("adds")), &mut events);
//! translator.push(Token::Complete(Results::passing(1)), &mut events);
//! translator.push(Token::Assert(AssertResult::pass("math")), &mut events);
//! translator.push(Token::Complete(Results::passing(1)), &mut events);
//!
//! let tree = translator.finish(&mut events);
//! assert_eq!(tree.suites().len(), 1);
//! assert_eq!(tree.tests().len(), 1);
//! ```

use serde_json::json;
use tracing::{debug, warn};

use crate::event::{Event, EventSink};
use crate::model::{SuiteId, SuiteTree};
use crate::token::{AssertResult, Diagnostic, Results, Token};

/// Comment prefix that names a subtest
pub const SUBTEST_PREFIX: &str = "# Subtest: ";

/// Name of the synthetic test for a plan/count mismatch
pub const COUNT_MISMATCH: &str = "test count !== plan";

/// Name of the synthetic test for a failed stream without a plan
pub const MISSING_PLAN: &str = "missing plan";

/// Per-level translation state
#[derive(Debug, Default)]
struct Handle {
    /// Subtest name; empty until learned
    name: String,
    level: usize,
    /// Open suite
    suite: Option<SuiteId>,
    emitted_suite: bool,
    /// Produced a child or a direct test under its own suite
    did_assert: bool,
    /// Finished child awaiting its closing assertion
    doing_child: Option<Box<Handle>>,
    results: Option<Results>,
    /// Abandoned after a bailout
    bailed: bool,
}

impl Handle {
    fn new(level: usize) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// First `# Subtest:` comment wins
    fn learn_name(&mut self, comment: &str) {
        if !self.name.is_empty() {
            return;
        }
        if let Some(name) = comment.trim().strip_prefix(SUBTEST_PREFIX) {
            self.name = name.trim().to_string();
        }
    }
}

/// Stateful TAP-to-event translator
///
/// Single-threaded and push driven: each token is processed to completion,
/// including every suite open/close it implies, before `push` returns.
#[derive(Debug)]
pub struct Translator {
    stack: Vec<Handle>,
    tree: SuiteTree,
    started: bool,
    ended: bool,
}

impl Translator {
    /// Create a translator positioned at the root stream
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: vec![Handle::new(0)],
            tree: SuiteTree::new(),
            started: false,
            ended: false,
        }
    }

    /// Suites and tests created so far
    #[must_use]
    pub fn tree(&self) -> &SuiteTree {
        &self.tree
    }

    /// Current nesting depth (0 at the root stream)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Whether the root stream has completed
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Final summary of the root stream, once it has completed
    #[must_use]
    pub fn results(&self) -> Option<&Results> {
        self.stack.first().and_then(|root| root.results.as_ref())
    }

    /// Process one token, emitting every resulting event into `sink`
    pub fn push<S: EventSink + ?Sized>(&mut self, token: Token, sink: &mut S) {
        if !self.started {
            self.started = true;
            sink.emit(&Event::Start);
        }
        if self.ended {
            debug!(?token, "Token after end of run, ignoring");
            return;
        }

        let at_root = self.stack.len() == 1;
        let bailed = self.top().bailed;

        match token {
            Token::Version { version } => {
                if at_root {
                    sink.emit(&Event::Version { version });
                }
            }
            Token::Line { text } => {
                if at_root {
                    sink.emit(&Event::Line { text });
                }
            }
            Token::Extra { text } => {
                debug!(len = text.len(), "Non-TAP output");
                sink.emit(&Event::Extra { text });
            }
            Token::Comment { text } => {
                if !bailed {
                    self.top_mut().learn_name(&text);
                }
                if at_root {
                    sink.emit(&Event::Comment { text });
                }
            }
            Token::Child => self.on_child(sink),
            Token::Assert(result) => {
                if !bailed {
                    self.on_assert(&result, sink);
                }
            }
            Token::Bailout { reason } => {
                if !bailed {
                    self.on_bailout(reason, sink);
                }
            }
            Token::Complete(results) => self.on_complete(results, sink),
        }
    }

    /// Close whatever a truncated stream left open and end the run
    ///
    /// Suites are closed innermost first. `end` is emitted unless the root
    /// stream already completed.
    pub fn finish<S: EventSink + ?Sized>(mut self, sink: &mut S) -> SuiteTree {
        if !self.started {
            self.started = true;
            sink.emit(&Event::Start);
        }
        if !self.ended {
            if self.stack.len() > 1 {
                warn!(depth = self.depth(), "Stream ended inside a subtest");
            }
            self.end_run(sink);
        }
        self.tree
    }

    // ========================================================================
    // Token Handlers
    // ========================================================================

    fn on_child<S: EventSink + ?Sized>(&mut self, sink: &mut S) {
        let top = self.stack.len() - 1;
        let level = self.stack[top].level + 1;

        if self.stack[top].bailed {
            self.stack.push(Handle {
                bailed: true,
                ..Handle::new(level)
            });
            return;
        }

        // The child's closing assertion will land on this handle, so a suite
        // here is now certain even if nothing else follows.
        let parent_suite = self.enclosing_suite(top);
        emit_suite(&mut self.tree, sink, &mut self.stack[top], parent_suite);
        self.stack[top].did_assert = true;

        if let Some(stale) = self.stack[top].doing_child.take() {
            debug!(name = %stale.name, "Subtest never received a closing assertion");
            discard_child(&self.tree, sink, *stale);
        }

        debug!(level, "Subtest started");
        self.stack.push(Handle::new(level));
    }

    fn on_assert<S: EventSink + ?Sized>(&mut self, result: &AssertResult, sink: &mut S) {
        let top = self.stack.len() - 1;
        let parent_suite = self.enclosing_suite(top);
        emit_suite(&mut self.tree, sink, &mut self.stack[top], parent_suite);

        let Some(mut child) = self.stack[top].doing_child.take() else {
            self.stack[top].did_assert = true;
            emit_test(&mut self.tree, sink, &self.stack[top], result);
            return;
        };

        // Closing assertion of the child that just completed.
        if child.name == result.name {
            if let Some(suite) = child.suite {
                if let Some(time) = result.time {
                    self.tree.set_duration(suite, time);
                }
                // Every inner assertion passed but the subtest itself failed,
                // e.g. it exited non-zero.
                if self.tree.suite(suite).ok && !result.ok {
                    emit_test(&mut self.tree, sink, &self.stack[top], result);
                }
            }
        }

        if child.did_assert {
            if let Some(suite) = child.suite.take() {
                close_suite(&self.tree, sink, suite);
            }
            debug!(name = %child.name, "Subtest closed");
            return;
        }

        // A leaf subtest never opens a suite of its own: the closing
        // assertion is its only result and files under the enclosing suite.
        emit_test(&mut self.tree, sink, &self.stack[top], result);
        if let Some(suite) = child.suite.take() {
            close_suite(&self.tree, sink, suite);
        }
        debug!(name = %child.name, level = child.level, "Leaf subtest resolved");
    }

    fn on_bailout<S: EventSink + ?Sized>(&mut self, reason: String, sink: &mut S) {
        let top = self.stack.len() - 1;
        let handle = &mut self.stack[top];
        warn!(reason = %reason, level = handle.level, "Bail out");

        let suite = handle.suite.take();
        let pending_child = handle.doing_child.take();
        handle.bailed = true;

        if let Some(child) = pending_child {
            discard_child(&self.tree, sink, *child);
        }
        sink.emit(&Event::Bailout {
            reason,
            suite: suite.map(|id| self.tree.suite(id).clone()),
        });
        if let Some(id) = suite {
            close_suite(&self.tree, sink, id);
        }
    }

    fn on_complete<S: EventSink + ?Sized>(&mut self, results: Results, sink: &mut S) {
        let top = self.stack.len() - 1;

        if !results.ok && !self.stack[top].bailed {
            if let Some(failure) = plan_failure(&results) {
                debug!(name = %failure.name, count = results.count, "Synthesizing plan failure");
                emit_test(&mut self.tree, sink, &self.stack[top], &failure);
            }
        }
        self.stack[top].results = Some(results);

        if top == 0 {
            self.end_run(sink);
            return;
        }

        let child = self.stack.pop();
        if let (Some(child), Some(parent)) = (child, self.stack.last_mut()) {
            if let Some(stale) = parent.doing_child.replace(Box::new(child)) {
                discard_child(&self.tree, sink, *stale);
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn top(&self) -> &Handle {
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Handle {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    /// Nearest open suite strictly above stack position `index`
    fn enclosing_suite(&self, index: usize) -> Option<SuiteId> {
        self.stack[..index].iter().rev().find_map(|h| h.suite)
    }

    fn end_run<S: EventSink + ?Sized>(&mut self, sink: &mut S) {
        for handle in self.stack.iter_mut().rev() {
            if let Some(child) = handle.doing_child.take() {
                discard_child(&self.tree, sink, *child);
            }
            if let Some(suite) = handle.suite.take() {
                close_suite(&self.tree, sink, suite);
            }
        }
        self.stack.truncate(1);
        self.ended = true;
        sink.emit(&Event::End);
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate a complete token sequence in one go
#[must_use]
pub fn translate(tokens: impl IntoIterator<Item = Token>) -> (Vec<Event>, SuiteTree) {
    let mut translator = Translator::new();
    let mut events = Vec::new();
    for token in tokens {
        translator.push(token, &mut events);
    }
    let tree = translator.finish(&mut events);
    (events, tree)
}

/// Open the handle's suite if it is named and has not emitted one yet
fn emit_suite<S: EventSink + ?Sized>(
    tree: &mut SuiteTree,
    sink: &mut S,
    handle: &mut Handle,
    parent: Option<SuiteId>,
) {
    if handle.emitted_suite || handle.name.is_empty() {
        return;
    }

    handle.emitted_suite = true;
    let id = tree.add_suite(&handle.name, parent);
    handle.suite = Some(id);
    sink.emit(&Event::Suite(tree.suite(id).clone()));
}

/// Record a test under the handle's suite and emit its event sequence
fn emit_test<S: EventSink + ?Sized>(
    tree: &mut SuiteTree,
    sink: &mut S,
    handle: &Handle,
    result: &AssertResult,
) {
    let id = tree.add_test(handle.suite, result);
    let test = tree.test(id).clone();

    sink.emit(&Event::Test(test.clone()));
    if result.is_pending() {
        sink.emit(&Event::Pending(test.clone()));
    } else if result.ok {
        sink.emit(&Event::Pass(test.clone()));
    } else if let Some(error) = test.error.clone() {
        sink.emit(&Event::Fail {
            test: test.clone(),
            error,
        });
    }
    sink.emit(&Event::TestEnd(test));
}

fn close_suite<S: EventSink + ?Sized>(tree: &SuiteTree, sink: &mut S, id: SuiteId) {
    sink.emit(&Event::SuiteEnd(tree.suite(id).clone()));
}

/// Close any suites a child left open without resolving its closing assertion
fn discard_child<S: EventSink + ?Sized>(tree: &SuiteTree, sink: &mut S, mut child: Handle) {
    if let Some(grandchild) = child.doing_child.take() {
        discard_child(tree, sink, *grandchild);
    }
    if let Some(suite) = child.suite.take() {
        close_suite(tree, sink, suite);
    }
}

/// Synthetic failure for a failed stream whose plan does not account for it
fn plan_failure(results: &Results) -> Option<AssertResult> {
    let mut diag = Diagnostic::default();
    let name = match results.plan {
        Some(plan) => {
            let wanted = plan.width();
            if results.count as i64 == wanted {
                // Already surfaced by a failing assertion or child.
                return None;
            }
            diag.found = Some(json!(results.count));
            diag.wanted = Some(json!(wanted));
            COUNT_MISMATCH
        }
        None => MISSING_PLAN,
    };

    if let Ok(raw) = serde_json::to_value(results) {
        diag.extra.insert("results".to_string(), raw);
    }
    Some(AssertResult::fail(name).with_diag(diag))
}
