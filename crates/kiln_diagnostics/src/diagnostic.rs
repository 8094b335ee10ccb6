//! Validation issues with severity, code, and source location.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use kiln_common::SourceUri;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position inside a source unit. Lines and columns are 1-based.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Location {
    /// The unit the issue was found in.
    pub uri: SourceUri,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.uri, self.line, self.column)
    }
}

/// A single validation issue reported during a build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How severe the issue is.
    pub severity: Severity,
    /// Stable code identifying the kind of issue.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Where the issue was detected, if it can be pinned to a unit.
    pub location: Option<Location>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates an issue with the given severity.
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            notes: Vec::new(),
        }
    }

    /// Creates an error issue.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning issue.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates an informational issue.
    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    /// Pins the issue to a line and column of a unit.
    pub fn at(mut self, uri: &SourceUri, line: u32, column: u32) -> Self {
        self.location = Some(Location {
            uri: uri.clone(),
            line,
            column,
        });
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Returns `true` if this issue fails the build.
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}
