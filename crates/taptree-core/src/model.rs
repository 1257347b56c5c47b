// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Suite and test entities
//!
//! Every [`Suite`] and [`Test`] created during a run lives in a
//! [`SuiteTree`] arena and is addressed by a [`SuiteId`] / [`TestId`].
//! Parent links are ids, never ownership edges.

use serde::{Deserialize, Serialize};

use crate::reconstruct::{ReconstructedError, reconstruct};
use crate::token::AssertResult;

/// Duration (ms) above which a passing test counts as slow
pub const DEFAULT_SLOW_MS: f64 = 75.0;

/// Index of a suite in its [`SuiteTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuiteId(usize);

/// Index of a test in its [`SuiteTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestId(usize);

/// A grouping node, one per named subtest that produced results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// This suite's id
    pub id: SuiteId,
    /// Subtest name
    pub title: String,
    /// Ancestor titles and own title, space separated
    pub full_title: String,
    /// Enclosing suite
    pub parent: Option<SuiteId>,
    /// Child suites, in discovery order
    pub suites: Vec<SuiteId>,
    /// Tests directly under this suite, in discovery order
    pub tests: Vec<TestId>,
    /// False once any descendant test has failed
    pub ok: bool,
    /// True when no enclosing suite exists
    pub root: bool,
    /// Duration reported by the subtest's closing assertion
    pub duration: Option<f64>,
}

/// Final state of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    /// The assertion held
    Passed,
    /// The assertion failed
    Failed,
}

/// Consumer-side speed classification of a passing test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// At most half the slow threshold
    Fast,
    /// Above half the slow threshold
    Medium,
    /// Above the slow threshold
    Slow,
}

impl Speed {
    /// Classify a duration against a slow threshold
    ///
    /// Tests without a duration are fast.
    #[must_use]
    pub fn classify(duration: Option<f64>, slow_ms: f64) -> Self {
        match duration {
            Some(ms) if ms > slow_ms => Self::Slow,
            Some(ms) if ms > slow_ms / 2.0 => Self::Medium,
            _ => Self::Fast,
        }
    }
}

/// A leaf result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    /// This test's id
    pub id: TestId,
    /// Assertion description
    pub title: String,
    /// Ancestor suite titles and own title, space separated
    pub full_title: String,
    /// Owning suite, if the assertion arrived under one
    pub suite: Option<SuiteId>,
    /// Duration in milliseconds
    pub duration: Option<f64>,
    /// Pass/fail state
    pub state: TestState,
    /// Skipped or todo
    pub pending: bool,
    /// Failure detail; present iff `state` is failed
    pub error: Option<ReconstructedError>,
    /// Source snippet reported in the diagnostic
    pub source: Option<String>,
}

impl Test {
    /// Check if the test passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.state == TestState::Passed
    }

    /// Check if the test failed
    #[must_use]
    pub fn failed(&self) -> bool {
        self.state == TestState::Failed
    }

    /// Classify this test's speed
    #[must_use]
    pub fn speed(&self, slow_ms: f64) -> Speed {
        Speed::classify(self.duration, slow_ms)
    }
}

/// Arena holding every suite and test of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteTree {
    suites: Vec<Suite>,
    tests: Vec<Test>,
}

impl SuiteTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a suite
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different tree.
    #[must_use]
    pub fn suite(&self, id: SuiteId) -> &Suite {
        &self.suites[id.0]
    }

    /// Look up a test
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different tree.
    #[must_use]
    pub fn test(&self, id: TestId) -> &Test {
        &self.tests[id.0]
    }

    /// All suites, in creation order
    #[must_use]
    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    /// All tests, in creation order
    #[must_use]
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    /// Suites without an enclosing suite
    pub fn roots(&self) -> impl Iterator<Item = &Suite> {
        self.suites.iter().filter(|s| s.parent.is_none())
    }

    /// Walk from a suite up to its outermost ancestor, starting with itself
    pub fn ancestors(&self, id: SuiteId) -> impl Iterator<Item = &Suite> {
        std::iter::successors(Some(self.suite(id)), |s| s.parent.map(|p| self.suite(p)))
    }

    /// Failing tests, in creation order
    #[must_use]
    pub fn failing_tests(&self) -> Vec<&Test> {
        self.tests.iter().filter(|t| t.failed()).collect()
    }

    /// Whether every test passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.tests.iter().all(Test::passed)
    }

    /// Create a suite under `parent`
    pub(crate) fn add_suite(&mut self, title: &str, parent: Option<SuiteId>) -> SuiteId {
        let id = SuiteId(self.suites.len());
        let full_title = match parent {
            Some(p) => join_title(&self.suite(p).full_title, title),
            None => title.trim().to_string(),
        };

        self.suites.push(Suite {
            id,
            title: title.to_string(),
            full_title,
            parent,
            suites: Vec::new(),
            tests: Vec::new(),
            ok: true,
            root: parent.is_none(),
            duration: None,
        });
        if let Some(p) = parent {
            self.suites[p.0].suites.push(id);
        }
        id
    }

    /// Record a test for an assertion, propagating failure to ancestors
    pub(crate) fn add_test(&mut self, suite: Option<SuiteId>, result: &AssertResult) -> TestId {
        let id = TestId(self.tests.len());
        let full_title = match suite {
            Some(s) => join_title(&self.suite(s).full_title, &result.name),
            None => result.name.trim().to_string(),
        };
        let state = if result.ok {
            TestState::Passed
        } else {
            TestState::Failed
        };

        self.tests.push(Test {
            id,
            title: result.name.clone(),
            full_title,
            suite,
            duration: result.time,
            state,
            pending: result.is_pending(),
            error: (!result.ok).then(|| reconstruct(result)),
            source: result.diag.as_ref().and_then(|d| d.source.clone()),
        });

        if let Some(s) = suite {
            self.suites[s.0].tests.push(id);
            if !result.ok {
                self.mark_failed(s);
            }
        }
        id
    }

    /// Mark a suite and every ancestor as not ok
    pub(crate) fn mark_failed(&mut self, id: SuiteId) {
        let mut current = Some(id);
        while let Some(s) = current {
            let suite = &mut self.suites[s.0];
            suite.ok = false;
            current = suite.parent;
        }
    }

    pub(crate) fn set_duration(&mut self, id: SuiteId, ms: f64) {
        self.suites[id.0].duration = Some(ms);
    }
}

fn join_title(prefix: &str, title: &str) -> String {
    format!("{prefix} {title}").trim().to_string()
}
