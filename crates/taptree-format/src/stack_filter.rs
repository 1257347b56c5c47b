// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Stack trace noise removal

use std::env;

/// Frames from the runtime itself
const RUNTIME_FRAMES: &[&str] = &[
    "(timers.js:",
    "(events.js:",
    "(node.js:",
    "(module.js:",
    "(domain.js:",
    "GeneratorFunctionPrototype.next (native)",
    "at node.js:",
];

/// Drops dependency and runtime frames from stack traces and shortens
/// paths under the working directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFilter {
    cwd: Option<String>,
}

impl StackFilter {
    /// Filter relative to the current working directory
    #[must_use]
    pub fn new() -> Self {
        match env::current_dir() {
            Ok(dir) => Self::with_cwd(dir.to_string_lossy()),
            Err(_) => Self::default(),
        }
    }

    /// Filter relative to an explicit directory
    #[must_use]
    pub fn with_cwd(cwd: impl Into<String>) -> Self {
        let mut cwd = cwd.into();
        if !cwd.ends_with('/') {
            cwd.push('/');
        }
        Self { cwd: Some(cwd) }
    }

    /// Remove noisy frames from `stack`, keeping line order
    #[must_use]
    pub fn filter(&self, stack: &str) -> String {
        stack
            .split('\n')
            .filter(|line| !is_dependency(line) && !is_runtime(line))
            .map(|line| match &self.cwd {
                Some(cwd) => line.replace(cwd.as_str(), ""),
                None => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_dependency(line: &str) -> bool {
    line.contains("node_modules") || line.contains("components/mocha")
}

fn is_runtime(line: &str) -> bool {
    RUNTIME_FRAMES.iter().any(|frame| line.contains(frame))
}
