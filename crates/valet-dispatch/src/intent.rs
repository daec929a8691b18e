//! Parsed user commands and the command-mode convention.
//!
//! An `Intent` is the structured form of one user command. Tokenization
//! and language understanding are external; the only textual protocol the
//! core depends on is the directive marker, which sets the `imperative`
//! flag exactly once, at parse time. Nothing downstream re-interprets it.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A parsed, structured representation of a user command.
///
/// Created per command, discarded after execution. To confirm a gated
/// action, the caller re-submits the identical intent with
/// `imperative = true`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Intent {
    /// Action name, e.g. `send_email`.
    pub action: String,
    /// Action target, e.g. a recipient or media id.
    pub target: String,
    /// Action-specific parameters.
    pub params: HashMap<String, String>,
    /// True when the user explicitly marked the command as a directive,
    /// skipping confirmation.
    pub imperative: bool,
    /// Explicit capability name, when the user named the app.
    pub capability: Option<String>,
}

impl Intent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target: String::new(),
            params: HashMap::new(),
            imperative: false,
            capability: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    /// Mark the intent as an explicit directive.
    pub fn imperative(mut self) -> Self {
        self.imperative = true;
        self
    }
}

/// Recognizer for the command-mode directive marker.
///
/// A command prefixed with `!`, `do:`, or `force:` is a directive: the
/// marker is stripped and the remainder dispatched with
/// `imperative = true`. Absence of the marker leaves the flag false.
pub struct DirectiveParser {
    marker: Regex,
}

impl DirectiveParser {
    pub fn new() -> Self {
        Self {
            marker: Regex::new(r"^\s*(?:!|(?i:do|force):)\s*").expect("Invalid directive regex"),
        }
    }

    /// Split a raw command into `(imperative, remainder)`.
    pub fn parse<'a>(&self, text: &'a str) -> (bool, &'a str) {
        match self.marker.find(text) {
            Some(m) => (true, &text[m.end()..]),
            None => (false, text.trim()),
        }
    }
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::new()
    }
}
