// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for taptree-core
//!
//! These tests drive the translator with whole token streams and check the
//! shape of the emitted event sequence and the resulting suite tree.

use std::path::Path;

use serde_json::json;
use similar_asserts::assert_eq;
use taptree_core::prelude::*;
use taptree_core::token::Plan;
use taptree_core::translate;

// ============================================================================
// Helpers
// ============================================================================

/// Get the fixtures directory for test data
fn fixtures_dir() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    Path::new(&manifest_dir).join("tests/fixtures")
}

fn subtest(name: &str) -> Token {
    Token::Comment {
        text: format!("# Subtest: {name}"),
    }
}

fn ok(name: &str) -> Token {
    Token::Assert(AssertResult::pass(name))
}

fn not_ok(name: &str) -> Token {
    Token::Assert(AssertResult::fail(name))
}

fn done(count: usize) -> Token {
    Token::Complete(Results::passing(count))
}

/// Compact rendering of the structural events
fn outline(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Suite(s) => Some(format!("suite {}", s.title)),
            Event::SuiteEnd(s) => Some(format!("suite end {}", s.title)),
            Event::Pass(t) => Some(format!("pass {}", t.title)),
            Event::Fail { test, .. } => Some(format!("fail {}", test.title)),
            Event::Pending(t) => Some(format!("pending {}", t.title)),
            Event::Bailout { reason, .. } => Some(format!("bailout {reason}")),
            _ => None,
        })
        .collect()
}

fn suite_events(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::Suite(_) | Event::SuiteEnd(_)))
        .count()
}

// ============================================================================
// Suite Creation
// ============================================================================

#[test]
fn test_named_subtest_with_asserts_becomes_suite() {
    let (events, tree) = translate([
        Token::Child,
        subtest("x"),
        ok("a"),
        ok("b"),
        done(2),
        ok("x"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite x", "pass a", "pass b", "suite end x"]
    );
    assert_eq!(events.first(), Some(&Event::Start));
    assert_eq!(events.last(), Some(&Event::End));
    assert_eq!(tree.suites().len(), 1);
    assert_eq!(tree.tests().len(), 2);
    assert_eq!(tree.tests()[1].full_title, "x b");
    assert!(tree.suites()[0].ok);
}

#[test]
fn test_unnamed_handles_never_emit_suites() {
    let (events, tree) = translate([Token::Child, ok("a"), ok("b"), done(2), ok("c"), done(1)]);

    assert_eq!(suite_events(&events), 0);
    assert!(tree.suites().is_empty());
    assert_eq!(tree.tests()[0].full_title, "a");
}

#[test]
fn test_named_handle_without_results_never_emits_suite() {
    let (events, tree) = translate([subtest("lonely"), done(0)]);
    assert_eq!(suite_events(&events), 0);
    assert!(tree.suites().is_empty());
}

#[test]
fn test_child_opens_parent_suite_before_any_assert() {
    let (events, _) = translate([
        Token::Child,
        subtest("outer"),
        Token::Child,
        subtest("inner"),
        ok("deep"),
        done(1),
        ok("inner"),
        done(1),
        ok("outer"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec![
            "suite outer",
            "suite inner",
            "pass deep",
            "suite end inner",
            "suite end outer",
        ]
    );
}

// ============================================================================
// Closing Assertions
// ============================================================================

#[test]
fn test_failed_closing_assertion_after_passing_asserts() {
    let (events, tree) = translate([
        Token::Child,
        subtest("x"),
        ok("one"),
        ok("two"),
        done(2),
        not_ok("x"),
        Token::Complete(Results::failing(1, Some(Plan { start: 1, end: 1 }))),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite x", "pass one", "pass two", "fail x", "suite end x"]
    );
    let failing = tree.failing_tests();
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].title, "x");
}

#[test]
fn test_failed_closing_assertion_after_failed_asserts_is_silent() {
    let (events, _) = translate([
        Token::Child,
        subtest("x"),
        ok("one"),
        not_ok("two"),
        Token::Complete(Results::failing(2, Some(Plan { start: 1, end: 2 }))),
        not_ok("x"),
        Token::Complete(Results::failing(1, Some(Plan { start: 1, end: 1 }))),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite x", "pass one", "fail two", "suite end x"]
    );
}

#[test]
fn test_closing_assertion_time_sets_suite_duration() {
    let (_, tree) = translate([
        Token::Child,
        subtest("timed"),
        ok("a"),
        done(1),
        Token::Assert(AssertResult::pass("timed").with_time(42.0)),
        done(1),
    ]);
    assert_eq!(tree.suites()[0].duration, Some(42.0));
}

#[test]
fn test_level_one_leaf_subtest_is_a_single_test() {
    let (events, tree) = translate([Token::Child, done(0), ok("foo"), done(1)]);

    assert_eq!(outline(&events), vec!["pass foo"]);
    assert_eq!(suite_events(&events), 0);
    assert_eq!(tree.tests().len(), 1);
    assert_eq!(tree.tests()[0].title, "foo");
}

#[test]
fn test_named_level_one_leaf_subtest_is_a_single_test() {
    let (events, tree) = translate([Token::Child, subtest("foo"), done(0), ok("foo"), done(1)]);

    assert_eq!(outline(&events), vec!["pass foo"]);
    assert_eq!(suite_events(&events), 0);
    assert!(tree.suites().is_empty());
    assert_eq!(tree.tests().len(), 1);
    assert_eq!(tree.tests()[0].full_title, "foo");
}

#[test]
fn test_named_leaf_files_under_enclosing_suite() {
    let (events, tree) = translate([
        Token::Child,
        subtest("outer"),
        ok("first"),
        Token::Child,
        subtest("leaf"),
        done(0),
        ok("leaf"),
        done(2),
        ok("outer"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite outer", "pass first", "pass leaf", "suite end outer"]
    );
    assert_eq!(tree.suites().len(), 1);
    assert_eq!(tree.tests()[1].full_title, "outer leaf");
}

#[test]
fn test_level_two_leaf_subtest_lands_on_parent_suite() {
    let (events, tree) = translate([
        Token::Child,
        subtest("outer"),
        Token::Child,
        subtest("inner"),
        done(0),
        ok("inner"),
        done(1),
        ok("outer"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite outer", "pass inner", "suite end outer"]
    );
    assert_eq!(tree.suites().len(), 1);
    assert_eq!(tree.tests()[0].full_title, "outer inner");
}

#[test]
fn test_level_three_leaf_subtest_lands_on_parent_suite() {
    let (events, tree) = translate([
        Token::Child,
        subtest("a"),
        Token::Child,
        subtest("b"),
        Token::Child,
        subtest("c"),
        done(0),
        ok("c"),
        done(1),
        ok("b"),
        done(1),
        ok("a"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite a", "suite b", "pass c", "suite end b", "suite end a"]
    );
    assert_eq!(tree.tests()[0].full_title, "a b c");
    let b = &tree.suites()[1];
    assert_eq!(b.parent, Some(tree.suites()[0].id));
}

#[test]
fn test_failing_level_two_leaf_marks_ancestors() {
    let (_, tree) = translate([
        Token::Child,
        subtest("outer"),
        Token::Child,
        subtest("inner"),
        Token::Complete(Results::failing(0, Some(Plan { start: 1, end: 0 }))),
        not_ok("inner"),
        done(1),
        not_ok("outer"),
        done(1),
    ]);

    assert!(tree.suites().iter().all(|s| !s.ok));
    assert_eq!(tree.failing_tests().len(), 1);
}

// ============================================================================
// Plan Anomalies
// ============================================================================

#[test]
fn test_count_mismatch_synthesizes_failure() {
    let (events, tree) = translate([
        ok("a"),
        ok("b"),
        ok("c"),
        Token::Complete(Results::failing(3, Some(Plan { start: 1, end: 5 }))),
    ]);

    let failing = tree.failing_tests();
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].title, "test count !== plan");

    let error = failing[0].error.as_ref().expect("error");
    assert_eq!(error.actual, Some(json!(3)));
    assert_eq!(error.expected, Some(json!(5)));
    assert!(error.show_diff);

    // The synthetic failure precedes the end of the run.
    let fail_at = events
        .iter()
        .position(|e| matches!(e, Event::Fail { .. }))
        .expect("fail event");
    assert!(fail_at < events.len() - 1);
}

#[test]
fn test_missing_plan_synthesizes_failure() {
    let (_, tree) = translate([ok("a"), ok("b"), Token::Complete(Results::failing(2, None))]);

    let failing = tree.failing_tests();
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].title, "missing plan");
}

#[test]
fn test_failed_stream_with_matching_plan_adds_nothing() {
    let (_, tree) = translate([
        ok("a"),
        not_ok("b"),
        Token::Complete(Results::failing(2, Some(Plan { start: 1, end: 2 }))),
    ]);
    assert_eq!(tree.tests().len(), 2);
}

#[test]
fn test_child_count_mismatch_lands_in_child_suite() {
    let (events, tree) = translate([
        Token::Child,
        subtest("x"),
        ok("a"),
        Token::Complete(Results::failing(1, Some(Plan { start: 1, end: 2 }))),
        not_ok("x"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite x", "pass a", "fail test count !== plan", "suite end x"]
    );
    assert_eq!(tree.failing_tests()[0].full_title, "x test count !== plan");
    assert!(!tree.suites()[0].ok);
}

// ============================================================================
// Bailout and Truncation
// ============================================================================

#[test]
fn test_bailout_abandons_level_and_keeps_nesting_balanced() {
    let (events, tree) = translate([
        Token::Child,
        subtest("x"),
        ok("a"),
        Token::Bailout {
            reason: "db down".to_string(),
        },
        ok("ignored"),
        Token::Child,
        ok("also ignored"),
        done(1),
        done(1),
        not_ok("x"),
        done(1),
    ]);

    assert_eq!(
        outline(&events),
        vec!["suite x", "pass a", "bailout db down", "suite end x"]
    );
    let bailout_suite = events.iter().find_map(|e| match e {
        Event::Bailout { suite, .. } => Some(suite.clone()),
        _ => None,
    });
    assert_eq!(
        bailout_suite.flatten().map(|s| s.title),
        Some("x".to_string())
    );
    assert_eq!(tree.tests().len(), 1);
    assert_eq!(events.last(), Some(&Event::End));
}

#[test]
fn test_root_bailout_without_suite() {
    let (events, _) = translate([
        ok("a"),
        Token::Bailout {
            reason: "stop".to_string(),
        },
        ok("b"),
    ]);

    assert_eq!(outline(&events), vec!["pass a", "bailout stop"]);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Bailout { suite: None, .. }
    )));
}

#[test]
fn test_truncated_stream_closes_open_suites() {
    let (events, _) = translate([
        Token::Child,
        subtest("outer"),
        Token::Child,
        subtest("inner"),
        ok("a"),
    ]);

    assert_eq!(
        outline(&events),
        vec![
            "suite outer",
            "suite inner",
            "pass a",
            "suite end inner",
            "suite end outer",
        ]
    );
    assert_eq!(events.last(), Some(&Event::End));
}

#[test]
fn test_empty_stream_still_starts_and_ends() {
    let (events, tree) = translate(Vec::new());
    assert_eq!(events, vec![Event::Start, Event::End]);
    assert!(tree.tests().is_empty());
}

// ============================================================================
// Test Events
// ============================================================================

#[test]
fn test_event_sequence_per_test() {
    let (events, _) = translate([
        Token::Assert(AssertResult::pass("skipped").skipped()),
        not_ok("Error: broke"),
        done(2),
    ]);

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            Event::Start => "start",
            Event::Test(_) => "test",
            Event::Pending(_) => "pending",
            Event::Pass(_) => "pass",
            Event::Fail { .. } => "fail",
            Event::TestEnd(_) => "test end",
            Event::End => "end",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "start", "test", "pending", "test end", "test", "fail", "test end", "end"
        ]
    );

    let error = events.iter().find_map(|e| match e {
        Event::Fail { error, .. } => Some(error.clone()),
        _ => None,
    });
    assert_eq!(error.map(|e| e.message), Some("broke".to_string()));
}

#[test]
fn test_root_comments_and_extra_are_forwarded() {
    let (events, _) = translate([
        Token::Comment {
            text: "# time=12ms".to_string(),
        },
        Token::Extra {
            text: "console noise\n".to_string(),
        },
        done(0),
    ]);

    assert!(events.contains(&Event::Comment {
        text: "# time=12ms".to_string()
    }));
    assert!(events.contains(&Event::Extra {
        text: "console noise\n".to_string()
    }));
}

#[test]
fn test_stats_match_emitted_events() {
    let (events, _) = translate([
        Token::Child,
        subtest("x"),
        ok("a"),
        Token::Assert(AssertResult::pass("b").todo()),
        not_ok("c"),
        Token::Complete(Results::failing(3, Some(Plan { start: 1, end: 3 }))),
        not_ok("x"),
        Token::Complete(Results::failing(1, None)),
    ]);

    let mut stats = Stats::new();
    for event in &events {
        stats.record(event);
    }

    let count = |pred: fn(&Event) -> bool| events.iter().filter(|e| pred(e)).count();
    assert_eq!(stats.suites, count(|e| matches!(e, Event::Suite(_))));
    assert_eq!(stats.passes, count(|e| matches!(e, Event::Pass(_))));
    assert_eq!(stats.failures, count(|e| matches!(e, Event::Fail { .. })));
    assert_eq!(stats.pending, count(|e| matches!(e, Event::Pending(_))));
    assert_eq!(stats.tests, count(|e| matches!(e, Event::TestEnd(_))));
    assert_eq!(stats.failures, 2, "failing c plus missing plan at root");
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn test_translate_fixture_stream() {
    let content = std::fs::read_to_string(fixtures_dir().join("nested.jsonl"))
        .expect("Failed to read nested.jsonl fixture");

    let tokens: Vec<Token> = TokenReader::new(content.as_bytes())
        .collect::<Result<_, _>>()
        .expect("Fixture tokens should decode");
    let (events, tree) = translate(tokens);

    assert_eq!(
        outline(&events),
        vec![
            "suite parser",
            "pass parses numbers",
            "pass parses strings",
            "suite nested",
            "fail rejects trailing commas",
            "suite end nested",
            "suite end parser",
            "pass formatter",
            "pending windows paths",
        ]
    );

    let failing = tree.failing_tests();
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].full_title, "parser nested rejects trailing commas");
    let error = failing[0].error.as_ref().expect("error");
    assert!(error.show_diff);
    assert!(
        error
            .stack
            .as_deref()
            .is_some_and(|s| s.contains("    at Test.<anonymous>"))
    );
}
