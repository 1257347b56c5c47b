// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Protocol tokens delivered by a TAP tokenizer
//!
//! The tokenizer itself is an external collaborator. It hands over one
//! [`Token`] per protocol event, in stream order, with nested subtests
//! delimited by a [`Token::Child`] and the child's own [`Token::Complete`].
//!
//! Tokens travel as newline-delimited JSON, one object per line, tagged by a
//! `type` field:
//!
//! ```text
//! {"type":"version","version":13}
//! {"type":"child"}
//! {"type":"comment","text":"# Subtest: addition"}
//! {"type":"assert","ok":true,"id":1,"name":"adds"}
//! {"type":"complete","ok":true,"count":1,"plan":{"start":1,"end":1}}
//! {"type":"assert","ok":true,"id":1,"name":"addition"}
//! {"type":"complete","ok":true,"count":1,"plan":{"start":1,"end":1}}
//! ```
//!
//! # Example
//!
//! ```
//! use taptree_core::token::{Token, TokenReader};
//!
//! let input = "{\"type\":\"assert\",\"ok\":true,\"name\":\"works\"}\n";
//! let tokens: Vec<Token> = TokenReader::new(input.as_bytes())
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(tokens.len(), 1);
//! ```

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TapError;

// ============================================================================
// Token Types
// ============================================================================

/// A single protocol event produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Token {
    /// `TAP version N`
    Version {
        /// Protocol version
        version: u32,
    },
    /// A `#` comment line
    Comment {
        /// Raw comment text, including the leading `#`
        text: String,
    },
    /// A test point (`ok` / `not ok`)
    Assert(AssertResult),
    /// A nested subtest stream begins
    Child,
    /// `Bail out!`
    Bailout {
        /// Reason given after `Bail out!`
        #[serde(default)]
        reason: String,
    },
    /// The current stream finished
    Complete(Results),
    /// Any raw protocol line, forwarded for pass-through logging
    Line {
        /// The raw line
        text: String,
    },
    /// Output that is not part of the protocol at all
    Extra {
        /// The raw text
        text: String,
    },
}

/// Skip/todo directive on an assertion
///
/// Producers emit either a bare flag or a reason string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Directive {
    /// `# SKIP` / `# TODO` without a reason
    Flag(bool),
    /// Directive with an explanation
    Reason(String),
}

impl Directive {
    /// Whether the directive is in effect
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Flag(set) => *set,
            Self::Reason(reason) => !reason.is_empty(),
        }
    }
}

/// Payload of an [`Token::Assert`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssertResult {
    /// Whether the assertion passed
    pub ok: bool,
    /// Assertion description
    #[serde(default)]
    pub name: String,
    /// Test point number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// `# SKIP` directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<Directive>,
    /// `# TODO` directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo: Option<Directive>,
    /// YAML diagnostic block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diag: Option<Diagnostic>,
}

impl AssertResult {
    /// Create a passing assertion
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            ok: true,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a failing assertion
    #[must_use]
    pub fn fail(name: impl Into<String>) -> Self {
        Self {
            ok: false,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach a diagnostic block
    #[must_use]
    pub fn with_diag(mut self, diag: Diagnostic) -> Self {
        self.diag = Some(diag);
        self
    }

    /// Set the reported duration
    #[must_use]
    pub fn with_time(mut self, ms: f64) -> Self {
        self.time = Some(ms);
        self
    }

    /// Mark the assertion as skipped
    #[must_use]
    pub fn skipped(mut self) -> Self {
        self.skip = Some(Directive::Flag(true));
        self
    }

    /// Mark the assertion as todo
    #[must_use]
    pub fn todo(mut self) -> Self {
        self.todo = Some(Directive::Flag(true));
        self
    }

    /// Skipped or todo
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.skip.as_ref().is_some_and(Directive::is_set)
            || self.todo.as_ref().is_some_and(Directive::is_set)
    }
}

/// Structured diagnostic attached to an assertion
///
/// Only the fields the reporter interprets are named. Decoding never fails:
/// a named field of an unexpected shape is moved into `extra` instead.
/// Presence of `found`, `wanted` and `diff` is tracked explicitly, so a YAML
/// `found: null` is kept as `Some(Value::Null)` rather than collapsing into
/// "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Diagnostic {
    /// Nested error object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DiagnosticError>,
    /// Actual value of a comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<Value>,
    /// Expected value of a comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wanted: Option<Value>,
    /// Pre-rendered unified diff; only a string is usable as a patch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Value>,
    /// Raw stack trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Source snippet of the failing check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Every other diagnostic key, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Diagnostic {
    /// The producer's patch text, if it supplied one
    #[must_use]
    pub fn diff_text(&self) -> Option<&str> {
        self.diff.as_ref().and_then(Value::as_str)
    }
}

impl From<Value> for Diagnostic {
    fn from(value: Value) -> Self {
        let mut extra = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                return Self {
                    extra: map,
                    ..Default::default()
                };
            }
        };

        let error = extra.remove("error").and_then(|raw| {
            let shaped = DiagnosticError::from_value(&raw);
            if shaped.is_none() {
                extra.insert("error".to_string(), raw);
            }
            shaped
        });
        let stack = take_text(&mut extra, "stack");
        let source = take_text(&mut extra, "source");

        Self {
            error,
            found: extra.remove("found"),
            wanted: extra.remove("wanted"),
            diff: extra.remove("diff"),
            stack,
            source,
            extra,
        }
    }
}

/// Remove `key` as text, leaving it in place when it has no text form
fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    let text = map.get(key).and_then(text_of)?;
    map.remove(key);
    Some(text)
}

/// A string, or an array of strings joined one per line
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str())
            .collect::<Option<Vec<_>>>()
            .map(|lines| lines.join("\n")),
        _ => None,
    }
}

/// Error object nested in a diagnostic block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticError {
    /// Error class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stack trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl DiagnosticError {
    /// Shape an `error` diagnostic of any form
    ///
    /// Objects contribute whichever of `name`, `message` and `stack` have a
    /// text form. A bare string such as `"TypeError: x is undefined"` is
    /// split into name and message when it starts with a single-word prefix,
    /// otherwise it becomes the message. Anything else yields `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                name: map.get("name").and_then(text_of),
                message: map.get("message").and_then(text_of),
                stack: map.get("stack").and_then(text_of),
            }),
            Value::String(text) => Some(match text.split_once(": ") {
                Some((name, message)) if !name.is_empty() && !name.contains(char::is_whitespace) => {
                    Self {
                        name: Some(name.to_string()),
                        message: Some(message.to_string()),
                        stack: None,
                    }
                }
                _ => Self {
                    message: Some(text.clone()),
                    ..Default::default()
                },
            }),
            _ => None,
        }
    }
}

/// Declared plan (`1..N`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// First test point number
    pub start: i64,
    /// Last test point number
    pub end: i64,
}

impl Plan {
    /// Number of assertions the plan promises
    #[must_use]
    pub fn width(&self) -> i64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }
}

/// Final summary of a stream, carried by [`Token::Complete`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    /// Whether the stream as a whole passed
    pub ok: bool,
    /// Number of assertions seen
    #[serde(default)]
    pub count: usize,
    /// Declared plan, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    /// Remaining tokenizer counters (pass, fail, todo, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Results {
    /// A passing stream with a matching plan
    #[must_use]
    pub fn passing(count: usize) -> Self {
        Self {
            ok: true,
            count,
            plan: Some(Plan {
                start: 1,
                end: count as i64,
            }),
            extra: Map::new(),
        }
    }

    /// A failing stream
    #[must_use]
    pub fn failing(count: usize, plan: Option<Plan>) -> Self {
        Self {
            ok: false,
            count,
            plan,
            extra: Map::new(),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Parse a single JSON-encoded token
///
/// # Errors
///
/// Returns `TapError::JsonParse` if the JSON is invalid or not a known token.
pub fn parse_token(json: &str) -> Result<Token, TapError> {
    serde_json::from_str(json).map_err(TapError::from)
}

/// Reads newline-delimited JSON tokens from a buffered reader
///
/// Blank lines are skipped. A line that is not valid UTF-8 or not a valid
/// token yields [`TapError::InvalidToken`] with its line number, so callers
/// can skip it and keep going. Only a failing reader yields [`TapError::Io`].
pub struct TokenReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: BufRead> TokenReader<R> {
    /// Create a token reader over a buffered source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Line number of the most recently read line
    #[must_use]
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for TokenReader<R> {
    type Item = Result<Token, TapError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TapError::Io(e))),
            }
            self.line_no += 1;

            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            return Some(
                serde_json::from_slice(line).map_err(|source| TapError::InvalidToken {
                    line: self.line_no,
                    source,
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    #[test]
    fn test_parse_assert_token() {
        let token = parse_token(r#"{"type":"assert","ok":false,"id":3,"name":"nope","time":1.5}"#)
            .expect("Should parse");
        let Token::Assert(result) = token else {
            panic!("expected assert token");
        };
        assert!(!result.ok);
        assert_eq!(result.name, "nope");
        assert_eq!(result.id, Some(3));
        assert_eq!(result.time, Some(1.5));
        assert!(!result.is_pending());
    }

    #[test]
    fn test_parse_unit_and_struct_tokens() {
        assert_eq!(parse_token(r#"{"type":"child"}"#).unwrap(), Token::Child);
        assert_eq!(
            parse_token(r#"{"type":"bailout","reason":"db down"}"#).unwrap(),
            Token::Bailout {
                reason: "db down".to_string()
            }
        );
        assert_eq!(
            parse_token(r#"{"type":"version","version":13}"#).unwrap(),
            Token::Version { version: 13 }
        );
    }

    #[test]
    fn test_parse_complete_with_plan() {
        let token =
            parse_token(r#"{"type":"complete","ok":false,"count":3,"plan":{"start":1,"end":5},"fail":2}"#)
                .expect("Should parse");
        let Token::Complete(results) = token else {
            panic!("expected complete token");
        };
        assert_eq!(results.count, 3);
        assert_eq!(results.plan.map(|p| p.width()), Some(5));
        assert_eq!(results.extra.get("fail"), Some(&json!(2)));
    }

    #[test]
    fn test_directive_forms() {
        let skip: AssertResult =
            serde_json::from_str(r#"{"ok":true,"name":"a","skip":"not on windows"}"#).unwrap();
        assert!(skip.is_pending());

        let todo: AssertResult =
            serde_json::from_str(r#"{"ok":false,"name":"b","todo":true}"#).unwrap();
        assert!(todo.is_pending());

        let off: AssertResult =
            serde_json::from_str(r#"{"ok":true,"name":"c","skip":false}"#).unwrap();
        assert!(!off.is_pending());

        let empty: AssertResult =
            serde_json::from_str(r#"{"ok":true,"name":"d","todo":""}"#).unwrap();
        assert!(!empty.is_pending());
    }

    #[test]
    fn test_diagnostic_presence_is_explicit() {
        let diag: Diagnostic =
            serde_json::from_str(r#"{"found":null,"at":{"line":4}}"#).unwrap();
        assert_eq!(diag.found, Some(Value::Null));
        assert_eq!(diag.wanted, None);
        assert!(diag.extra.contains_key("at"));
    }

    #[test]
    fn test_nested_error_diagnostic() {
        let diag: Diagnostic = serde_json::from_str(
            r#"{"error":{"name":"TypeError","message":"x is undefined","stack":"a.js:1"}}"#,
        )
        .unwrap();
        let error = diag.error.expect("nested error");
        assert_eq!(error.name.as_deref(), Some("TypeError"));
        assert_eq!(error.message.as_deref(), Some("x is undefined"));
    }

    #[test]
    fn test_token_reader_skips_blank_lines_and_numbers_errors() {
        let input = "\n{\"type\":\"child\"}\n\nnot json\n{\"type\":\"line\",\"text\":\"ok 1\"}\n";
        let mut reader = TokenReader::new(input.as_bytes());

        assert_eq!(reader.next().unwrap().unwrap(), Token::Child);
        match reader.next().unwrap() {
            Err(TapError::InvalidToken { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected invalid token, got {other:?}"),
        }
        assert!(matches!(reader.next(), Some(Ok(Token::Line { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_token_reader_skips_invalid_utf8_line() {
        let mut input = b"{\"type\":\"child\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"type\":\"line\",\"text\":\"ok 1\"}");
        let mut reader = TokenReader::new(input.as_slice());

        assert_eq!(reader.next().unwrap().unwrap(), Token::Child);
        match reader.next().unwrap() {
            Err(TapError::InvalidToken { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected invalid token, got {other:?}"),
        }
        assert!(matches!(reader.next(), Some(Ok(Token::Line { .. }))));
        assert!(reader.next().is_none());
        assert_eq!(reader.line_no(), 3);
    }

    #[test]
    fn test_string_error_diagnostic_is_shaped() {
        let diag: Diagnostic = serde_json::from_str(r#"{"error":"TypeError: x is undefined"}"#).unwrap();
        let error = diag.error.expect("shaped error");
        assert_eq!(error.name.as_deref(), Some("TypeError"));
        assert_eq!(error.message.as_deref(), Some("x is undefined"));

        let diag: Diagnostic = serde_json::from_str(r#"{"error":"went wrong: badly"}"#).unwrap();
        let error = diag.error.expect("shaped error");
        assert_eq!(error.name, None);
        assert_eq!(error.message.as_deref(), Some("went wrong: badly"));
    }

    #[test]
    fn test_error_object_with_odd_fields() {
        let diag: Diagnostic =
            serde_json::from_str(r#"{"error":{"name":7,"message":"boom","stack":["a.js:1","b.js:2"]}}"#)
                .unwrap();
        let error = diag.error.expect("shaped error");
        assert_eq!(error.name, None);
        assert_eq!(error.message.as_deref(), Some("boom"));
        assert_eq!(error.stack.as_deref(), Some("a.js:1\nb.js:2"));
    }

    #[test]
    fn test_unusable_fields_move_to_extra() {
        let diag: Diagnostic =
            serde_json::from_str(r#"{"error":42,"stack":{"frames":1},"source":false}"#).unwrap();
        assert_eq!(diag.error, None);
        assert_eq!(diag.stack, None);
        assert_eq!(diag.source, None);
        assert_eq!(diag.extra.get("error"), Some(&json!(42)));
        assert_eq!(diag.extra.get("stack"), Some(&json!({"frames": 1})));
        assert_eq!(diag.extra.get("source"), Some(&json!(false)));
    }

    #[test]
    fn test_stack_array_is_joined() {
        let diag: Diagnostic = serde_json::from_str(r#"{"stack":["a.js:1","b.js:2"]}"#).unwrap();
        assert_eq!(diag.stack.as_deref(), Some("a.js:1\nb.js:2"));
        assert!(diag.extra.is_empty());
    }

    #[test]
    fn test_null_diff_counts_as_present() {
        let diag: Diagnostic = serde_json::from_str(r#"{"diff":null}"#).unwrap();
        assert_eq!(diag.diff, Some(Value::Null));
        assert_eq!(diag.diff_text(), None);

        let diag: Diagnostic = serde_json::from_str(r#"{"diff":"--- a\n+++ b\n"}"#).unwrap();
        assert_eq!(diag.diff_text(), Some("--- a\n+++ b\n"));
    }

    #[test]
    fn test_non_object_diagnostic_is_kept() {
        let result: AssertResult =
            serde_json::from_str(r#"{"ok":false,"name":"odd","diag":"just text"}"#).unwrap();
        let diag = result.diag.expect("diag kept");
        assert_eq!(diag.extra.get("value"), Some(&json!("just text")));
    }

    #[test]
    fn test_assert_with_malformed_diag_still_decodes() {
        let token = parse_token(
            r#"{"type":"assert","ok":false,"name":"bad","diag":{"error":"TypeError: x","stack":["a.js:1"]}}"#,
        )
        .expect("Should parse");
        let Token::Assert(result) = token else {
            panic!("expected assert token");
        };
        assert!(!result.ok);
        assert!(result.diag.is_some());
    }

    #[test]
    fn test_plan_width_saturates() {
        let plan = Plan {
            start: i64::MIN,
            end: i64::MAX,
        };
        assert_eq!(plan.width(), i64::MAX);
        assert_eq!(Plan { start: 1, end: 0 }.width(), 0);
    }

    #[test]
    fn test_unknown_token_type_is_rejected() {
        assert!(parse_token(r#"{"type":"pragma","value":"strict"}"#).is_err());
    }
}
