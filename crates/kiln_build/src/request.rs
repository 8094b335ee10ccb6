//! External and internal build request shapes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use kiln_common::{ContainerHandle, SourceUri};
use kiln_index::{IndexState, Invalidations, WorkingState};
use serde::{Deserialize, Serialize};

use crate::classpath::ClasspathContext;
use crate::output::OutputConfigurations;

fn default_true() -> bool {
    true
}

/// One named output slot as described by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletDescription {
    /// Outlet name, e.g. `default`.
    pub name: String,
    /// Target directory, relative paths resolving against the project directory.
    pub target: PathBuf,
    /// Create the target directory when it does not exist.
    #[serde(default = "default_true")]
    pub create_directory: bool,
    /// Overwrite existing files the builder did not generate.
    #[serde(default = "default_true")]
    pub overwrite_existing: bool,
    /// Delete generated files that are no longer produced.
    #[serde(default = "default_true")]
    pub cleanup_derived: bool,
}

impl OutletDescription {
    /// Creates an outlet with every flag enabled.
    pub fn new(name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            create_directory: true,
            overwrite_existing: true,
            cleanup_derived: true,
        }
    }
}

/// A build request as received from the caller.
///
/// Paths may be relative; they resolve against `project_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBuildRequest {
    /// Project directory of the container.
    pub project_dir: PathBuf,
    /// Container to build.
    pub container: ContainerHandle,
    /// Source files whose contents changed.
    #[serde(default)]
    pub dirty_files: BTreeSet<PathBuf>,
    /// Source files that were removed.
    #[serde(default)]
    pub deleted_files: BTreeSet<PathBuf>,
    /// Output slots by language identifier.
    #[serde(default)]
    pub outputs: BTreeMap<String, Vec<OutletDescription>>,
    /// Container classpath, layered over the session classpath.
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    /// Containers this one declares a dependency on.
    #[serde(default)]
    pub dependencies: Vec<ContainerHandle>,
}

impl ExternalBuildRequest {
    /// Creates a request with nothing dirty, nothing deleted and no outlets.
    pub fn new(project_dir: impl Into<PathBuf>, container: impl Into<ContainerHandle>) -> Self {
        Self {
            project_dir: project_dir.into(),
            container: container.into(),
            dirty_files: BTreeSet::new(),
            deleted_files: BTreeSet::new(),
            outputs: BTreeMap::new(),
            classpath: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Marks `path` dirty.
    pub fn dirty(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirty_files.insert(path.into());
        self
    }

    /// Marks `path` deleted.
    pub fn deleted(mut self, path: impl Into<PathBuf>) -> Self {
        self.deleted_files.insert(path.into());
        self
    }

    /// Adds an outlet for `language`.
    pub fn outlet(mut self, language: impl Into<String>, outlet: OutletDescription) -> Self {
        self.outputs.entry(language.into()).or_default().push(outlet);
        self
    }

    /// Appends a classpath entry.
    pub fn classpath_entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.classpath.push(entry.into());
        self
    }

    /// Declares a dependency on another container.
    pub fn depends_on(mut self, container: impl Into<ContainerHandle>) -> Self {
        self.dependencies.push(container.into());
        self
    }
}

/// Names a container and what it declares to depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// The container.
    pub name: ContainerHandle,
    /// Declared dependencies. Recorded only; resolution sees every container.
    pub dependencies: Vec<ContainerHandle>,
}

/// A translated request, ready for the engine.
///
/// Holds a private working copy of the container's committed state plus the
/// committed states of every other container at translation time.
#[derive(Debug)]
pub struct BuildRequest {
    /// Canonical project directory.
    pub base_dir: PathBuf,
    /// Project descriptor of the container being built.
    pub project: ProjectDescriptor,
    /// Directly dirty units. Disjoint from `deleted`.
    pub dirty: BTreeSet<SourceUri>,
    /// Deleted units.
    pub deleted: BTreeSet<SourceUri>,
    /// Working copy of the container's committed descriptions and mapping.
    pub state: WorkingState,
    /// Committed states of the other containers.
    pub others: BTreeMap<ContainerHandle, Arc<IndexState>>,
    /// Names changed by other containers since this one last built.
    pub invalidated: Invalidations,
    /// Resolved output configuration.
    pub outputs: OutputConfigurations,
    /// Classpath for resource resolution.
    pub classpath: ClasspathContext,
}

impl BuildRequest {
    /// The container being built.
    pub fn container(&self) -> &ContainerHandle {
        &self.project.name
    }
}
