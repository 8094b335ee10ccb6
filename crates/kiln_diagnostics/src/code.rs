//! Issue codes with a phase prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The build phase an issue code belongs to, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Decoding and parsing problems, prefixed with `S`.
    Syntax,
    /// Cross-unit and classpath resolution problems, prefixed with `L`.
    Linking,
    /// Language-specific semantic checks, prefixed with `V`.
    Validation,
    /// Problems writing or cleaning generated outputs, prefixed with `G`.
    Generation,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Syntax => 'S',
            Category::Linking => 'L',
            Category::Validation => 'V',
            Category::Generation => 'G',
        }
    }
}

/// A structured issue code, displayed as prefix plus three digits (`L201`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The phase this issue was detected in.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new issue code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
