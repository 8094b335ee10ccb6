//! Container handles naming the build modules the index store is keyed by.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a build container (a module or project).
///
/// Handles are the unique key into the container index store. Two builds
/// naming the same handle share one committed index and mapping.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    /// Creates a handle from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the handle's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerHandle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ContainerHandle {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ContainerHandle {
    fn borrow(&self) -> &str {
        &self.0
    }
}
