//! Reply classification
//!
//! Server replies are free text, so each action carries a small rule set that
//! decides whether a reply means success, a rejection or something unknown.

use std::fmt;

/// Reply fragments that signal a logical failure on most commands.
pub const COMMON_ERROR_SIGNATURES: &[&str] = &[
    "doesn't exist",
    "does not exist",
    "not found",
    "No such user",
    "Can't find",
    "is not connected",
    "Unknown command",
];

/// A pattern checked against a reply. `{name}` is replaced with the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePattern {
    Exact(String),
    Contains(String),
    StartsWith(String),
    /// Any reply, including an empty one
    Any,
    NonEmpty,
}

impl ResponsePattern {
    pub fn exact(text: impl Into<String>) -> Self {
        ResponsePattern::Exact(text.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        ResponsePattern::Contains(text.into())
    }

    pub fn starts_with(text: impl Into<String>) -> Self {
        ResponsePattern::StartsWith(text.into())
    }

    pub fn matches(&self, reply: &str, target: Option<&str>) -> bool {
        let fill = |text: &str| match target {
            Some(name) => text.replace("{name}", name),
            None => text.to_string(),
        };
        let reply = reply.trim();

        match self {
            ResponsePattern::Exact(text) => reply == fill(text),
            ResponsePattern::Contains(text) => reply.contains(&fill(text)),
            ResponsePattern::StartsWith(text) => reply.starts_with(&fill(text)),
            ResponsePattern::Any => true,
            ResponsePattern::NonEmpty => !reply.is_empty(),
        }
    }
}

/// Success and error predicates for one kind of command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRules {
    pub success: Vec<ResponsePattern>,
    pub errors: Vec<ResponsePattern>,
}

impl ResponseRules {
    pub fn new(success: Vec<ResponsePattern>) -> Self {
        Self {
            success,
            errors: common_errors(),
        }
    }

    /// Succeeds when the reply contains `text`
    pub fn containing(text: &str) -> Self {
        Self::new(vec![ResponsePattern::contains(text)])
    }

    /// Succeeds on any reply without a known error signature
    pub fn lenient() -> Self {
        Self::new(vec![ResponsePattern::Any])
    }

    pub fn with_error(mut self, pattern: ResponsePattern) -> Self {
        self.errors.push(pattern);
        self
    }

    pub fn classify(&self, reply: &str, target: Option<&str>) -> Outcome {
        if self.errors.iter().any(|p| p.matches(reply, target)) {
            Outcome::Rejected
        } else if self.success.iter().any(|p| p.matches(reply, target)) {
            Outcome::Succeeded
        } else {
            Outcome::Unrecognized
        }
    }
}

impl Default for ResponseRules {
    fn default() -> Self {
        Self::lenient()
    }
}

fn common_errors() -> Vec<ResponsePattern> {
    COMMON_ERROR_SIGNATURES
        .iter()
        .map(|sig| ResponsePattern::contains(*sig))
        .collect()
}

/// Result of one command against one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// Reply matched an error signature
    Rejected,
    /// Reply matched neither predicate
    Unrecognized,
    TransportFailed,
    /// Never sent, over the size limit
    Oversized,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Rejected => "rejected",
            Outcome::Unrecognized => "unrecognized response",
            Outcome::TransportFailed => "transport failure",
            Outcome::Oversized => "command too long",
        };
        f.write_str(label)
    }
}
