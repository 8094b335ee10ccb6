//! Dotted symbol names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dotted, fully qualified symbol name such as `A.foo`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Creates a name from its dotted form.
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    /// Joins segments with `.`.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        Self(segments.into_iter().collect::<Vec<_>>().join("."))
    }

    /// Returns the dotted form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first segment (the defining unit, for two-segment names).
    pub fn first_segment(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }

    /// Returns the last segment (the simple name).
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or("")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualifiedName {
    fn from(dotted: &str) -> Self {
        Self::new(dotted)
    }
}
