//! Diagnostics channel
//!
//! Push and pull never raise to the caller. Every failure, warning and note is
//! recorded here in the order it happened, so callers can tell a legitimately
//! empty result from a failed one. Each entry is mirrored to `tracing`.

use crate::error::AdapterError;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Error(AdapterError),
    Warning(String),
    Note(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Error(e) => write!(f, "error [{}]: {}", e.kind(), e),
            Diagnostic::Warning(w) => write!(f, "warning: {}", w),
            Diagnostic::Note(n) => write!(f, "note: {}", n),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, err: AdapterError) {
        error!(kind = err.kind(), "{}", err);
        self.entries.push(Diagnostic::Error(err));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.entries.push(Diagnostic::Warning(message));
    }

    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.entries.push(Diagnostic::Note(message));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &AdapterError> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Error(e) => Some(e),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Warning(w) => Some(w.as_str()),
            _ => None,
        })
    }

    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|d| match d {
            Diagnostic::Note(n) => Some(n.as_str()),
            _ => None,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// True if any recorded error has the given variant name (see [`AdapterError::kind`]).
    pub fn has_error_kind(&self, kind: &str) -> bool {
        self.errors().any(|e| e.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
