//! Canonical identifiers for source units and generated files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Canonical identifier of a source unit.
///
/// Always an absolute, lexically normalized path (`.` and `..` components
/// removed). Normalization is purely lexical so a URI can still be formed for
/// a file that was deleted from disk.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceUri(PathBuf);

impl SourceUri {
    /// Resolves `path` against `base` (when relative) and normalizes it.
    pub fn from_path(base: &Path, path: &Path) -> Self {
        if path.is_absolute() {
            Self(normalize(path))
        } else {
            Self(normalize(&base.join(path)))
        }
    }

    /// Wraps an already-absolute path, normalizing it.
    pub fn from_absolute(path: &Path) -> Self {
        Self(normalize(path))
    }

    /// Returns the underlying filesystem path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Returns the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.0.extension()?.to_str()
    }

    /// Returns the file name without its extension.
    pub fn stem(&self) -> Option<&str> {
        self.0.file_stem()?.to_str()
    }

    /// Returns the final path component.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()?.to_str()
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Lexically normalizes a path: drops `.` and resolves `..` against prior components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
