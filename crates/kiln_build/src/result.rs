//! The outcome of one engine run.

use std::collections::BTreeSet;
use std::path::PathBuf;

use kiln_common::{ContainerHandle, SourceUri};
use kiln_diagnostics::Diagnostic;
use kiln_index::{
    changed_names, Invalidations, QualifiedName, ResourceDelta, ResourceDescriptions, Source2GeneratedMapping,
};

/// Everything a build produced, before it is committed.
///
/// Dropping a result without committing it leaves the index store untouched.
#[derive(Debug)]
pub struct BuildResult {
    /// Container that was built.
    pub container: ContainerHandle,
    /// New description snapshot.
    pub descriptions: ResourceDescriptions,
    /// New source → generated mapping.
    pub mapping: Source2GeneratedMapping,
    /// Generation of the committed state the build started from.
    pub base_generation: u64,
    /// Units reprocessed because they were reported dirty.
    pub directly_dirty: BTreeSet<SourceUri>,
    /// Units reprocessed because something they reference changed.
    pub transitively_dirty: BTreeSet<SourceUri>,
    /// Units removed from the index.
    pub deleted: BTreeSet<SourceUri>,
    /// Description changes, in processing order.
    pub deltas: Vec<ResourceDelta>,
    /// Other containers with units referencing a changed name.
    pub affected_containers: Vec<ContainerHandle>,
    /// Invalidations from other containers this build rechecked.
    pub invalidated: Invalidations,
    /// Generated files whose contents were written.
    pub written: Vec<PathBuf>,
    /// Generated files deleted from disk.
    pub removed: Vec<PathBuf>,
    /// Every issue recorded, in detection order.
    pub issues: Vec<(SourceUri, Diagnostic)>,
}

impl BuildResult {
    /// Returns `true` iff no error-severity issue was recorded.
    pub fn is_error_free(&self) -> bool {
        self.error_count() == 0
    }

    /// Number of error-severity issues.
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|(_, d)| d.is_error()).count()
    }

    /// Directly and transitively dirty units together.
    pub fn dirty_units(&self) -> BTreeSet<&SourceUri> {
        self.directly_dirty
            .iter()
            .chain(&self.transitively_dirty)
            .collect()
    }

    /// Exported names this build added, removed or changed.
    pub fn changed_names(&self) -> BTreeSet<QualifiedName> {
        changed_names(&self.deltas)
    }
}
