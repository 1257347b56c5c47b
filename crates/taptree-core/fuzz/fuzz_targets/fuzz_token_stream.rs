// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the token reader and translator
//!
//! Arbitrary bytes are decoded line by line; every token that decodes is fed
//! to the translator. Neither step may panic, and the emitted suite events
//! must stay balanced.

#![no_main]

use libfuzzer_sys::fuzz_target;

use taptree_core::{Event, TokenReader, Translator};

fuzz_target!(|data: &[u8]| {
    let mut translator = Translator::new();
    let mut events: Vec<Event> = Vec::new();

    for token in TokenReader::new(data).flatten() {
        translator.push(token, &mut events);
    }
    let _ = translator.finish(&mut events);

    let mut depth: i64 = 0;
    for event in &events {
        match event {
            Event::Suite(_) => depth += 1,
            Event::SuiteEnd(_) => depth -= 1,
            _ => {}
        }
        assert!(depth >= 0);
    }
    assert_eq!(depth, 0);
});
