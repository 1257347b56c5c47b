// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! taptree-core: TAP stream to suite/test tree translation
//!
//! This library crate turns a stream of TAP tokens (assertions, nested
//! subtests, plans, bailouts) into a well-nested sequence of lifecycle
//! events (`suite`, `test`, `pass`, `fail`, `pending`, `suite end`, ...)
//! for consumption by formatters.
//!
//! # Example
//!
//! ```
//! use taptree_core::prelude::*;
//!
//! let input = r#"{"type":"assert","ok":true,"name":"works"}
//! {"type":"complete","ok":true,"count":1,"plan":{"start":1,"end":1}}"#;
//!
//! let mut translator = Translator::new();
//! let mut stats = Stats::new();
//! for token in TokenReader::new(input.as_bytes()) {
//!     translator.push(token.unwrap(), &mut stats);
//! }
//! translator.finish(&mut stats);
//! assert_eq!(stats.passes, 1);
//! ```

pub mod error;
pub mod event;
pub mod model;
pub mod reconstruct;
pub mod stats;
pub mod token;
pub mod translator;

pub use error::TapError;
pub use event::{Event, EventSink};
pub use model::{Speed, Suite, SuiteId, SuiteTree, Test, TestId, TestState};
pub use reconstruct::{ReconstructedError, reconstruct};
pub use stats::Stats;
pub use token::{AssertResult, Diagnostic, Plan, Results, Token, TokenReader, parse_token};
pub use translator::{Translator, translate};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::TapError;
    pub use crate::event::{Event, EventSink};
    pub use crate::model::{Suite, SuiteTree, Test, TestState};
    pub use crate::stats::Stats;
    pub use crate::token::{AssertResult, Results, Token, TokenReader};
    pub use crate::translator::Translator;
}
