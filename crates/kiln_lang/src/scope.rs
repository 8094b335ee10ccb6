//! Symbol and resource lookup available to validators and generators.

use std::path::PathBuf;

use kiln_common::{ContainerHandle, ContentHash, SourceUri};
use kiln_index::QualifiedName;

/// Where a referenced name was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// Container owning the defining unit.
    pub container: ContainerHandle,
    /// The defining unit.
    pub unit: SourceUri,
    /// Signature hash of the exported symbol.
    pub signature: ContentHash,
}

/// What a unit can see while it is validated or generated.
///
/// The builder provides an implementation that overlays the current build's
/// working index on top of every committed container.
pub trait Scope: Sync {
    /// Resolves an exported symbol by its qualified name.
    fn resolve(&self, name: &QualifiedName) -> Option<ResolvedSymbol>;

    /// Resolves a resource path against the classpath.
    fn resolve_resource(&self, path: &str) -> Option<PathBuf>;
}
