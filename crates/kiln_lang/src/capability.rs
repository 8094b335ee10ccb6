//! The three capabilities every language provides.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;

use kiln_common::SourceUri;
use kiln_debuginfo::SourceTrace;
use kiln_diagnostics::Diagnostic;
use kiln_index::ResourceDescription;

use crate::scope::Scope;

/// The result of parsing one source unit.
///
/// Carries the unit's [`ResourceDescription`], any syntax issues, and the
/// language's own model of the unit for its validator and generator. A unit
/// that failed to parse still produces a description, flagged as erroneous.
pub struct ParsedUnit {
    /// What the unit exports and references.
    pub description: ResourceDescription,
    /// Issues found while parsing.
    pub issues: Vec<Diagnostic>,
    model: Box<dyn Any + Send + Sync>,
}

impl ParsedUnit {
    /// Creates a parsed unit carrying `model`.
    pub fn new(description: ResourceDescription, model: impl Any + Send + Sync) -> Self {
        Self {
            description,
            issues: Vec::new(),
            model: Box::new(model),
        }
    }

    /// Attaches parse issues, flagging the description if any is an error.
    pub fn with_issues(mut self, issues: Vec<Diagnostic>) -> Self {
        if issues.iter().any(Diagnostic::is_error) {
            self.description.has_errors = true;
        }
        self.issues = issues;
        self
    }

    /// Identifier of the parsed unit.
    pub fn uri(&self) -> &SourceUri {
        &self.description.uri
    }

    /// Returns the language model, if it is a `T`.
    pub fn model<T: Any>(&self) -> Option<&T> {
        self.model.downcast_ref::<T>()
    }
}

impl fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("description", &self.description)
            .field("issues", &self.issues)
            .finish_non_exhaustive()
    }
}

/// A file produced by a [`Generator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Named output slot the file is written to.
    pub outlet: String,
    /// Path relative to the outlet's target directory.
    pub relative_path: PathBuf,
    /// File contents.
    pub contents: Vec<u8>,
    /// Line trace back to the source unit, stored as a sidecar.
    pub trace: Option<SourceTrace>,
}

/// Turns source text into a [`ParsedUnit`].
pub trait Parser: Send + Sync {
    /// Parses `text`, the decoded contents of `uri`. Never fails: problems are
    /// returned as issues on the unit.
    fn parse(&self, uri: &SourceUri, text: &str) -> ParsedUnit;
}

/// Checks a parsed unit against the symbols visible to it.
pub trait Validator: Send + Sync {
    /// Returns every issue found in `unit`.
    fn validate(&self, unit: &ParsedUnit, scope: &dyn Scope) -> Vec<Diagnostic>;
}

/// Produces the derived files for a parsed unit.
pub trait Generator: Send + Sync {
    /// Returns the files generated from `unit`.
    fn generate(&self, unit: &ParsedUnit, scope: &dyn Scope) -> Vec<GeneratedFile>;
}
