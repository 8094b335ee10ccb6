//! Translation of external requests into engine requests.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_common::uri::normalize;
use kiln_common::SourceUri;
use kiln_index::{ContainerGuard, IndexStore};

use crate::classpath::ClasspathContext;
use crate::error::BuildError;
use crate::output::{OutputConfiguration, OutputConfigurations};
use crate::request::{BuildRequest, ExternalBuildRequest, ProjectDescriptor};

/// Resolves external requests against the filesystem and the index store.
pub struct BuildRequestTranslator<'a> {
    store: &'a IndexStore,
    session_classpath: &'a Arc<ClasspathContext>,
}

impl<'a> BuildRequestTranslator<'a> {
    /// Creates a translator reading from `store`, layering request
    /// classpaths over `session_classpath`.
    pub fn new(store: &'a IndexStore, session_classpath: &'a Arc<ClasspathContext>) -> Self {
        Self {
            store,
            session_classpath,
        }
    }

    /// Translates `external` for the container locked by `guard`.
    ///
    /// The container's committed state is copied into the request, so the
    /// committed data stays untouched until the build result is committed.
    pub fn translate(
        &self,
        external: &ExternalBuildRequest,
        guard: &ContainerGuard,
    ) -> Result<BuildRequest, BuildError> {
        let container = guard.handle();
        let base_dir = canonical_dir(&external.project_dir)?;

        let deleted: BTreeSet<SourceUri> = external
            .deleted_files
            .iter()
            .map(|p| SourceUri::from_path(&base_dir, p))
            .collect();
        let mut dirty = BTreeSet::new();
        for path in &external.dirty_files {
            let uri = SourceUri::from_path(&base_dir, path);
            if deleted.contains(&uri) {
                tracing::warn!(container = %container, unit = %uri, "unit is both dirty and deleted, treating as deleted");
                continue;
            }
            dirty.insert(uri);
        }

        let mut outputs = OutputConfigurations::new();
        for (language, outlets) in &external.outputs {
            for outlet in outlets {
                outputs.insert(
                    language,
                    OutputConfiguration {
                        name: outlet.name.clone(),
                        target: normalize(&base_dir.join(&outlet.target)),
                        create_directory: outlet.create_directory,
                        overwrite_existing: outlet.overwrite_existing,
                        cleanup_derived: outlet.cleanup_derived,
                    },
                );
            }
        }

        let mut entries = Vec::with_capacity(external.classpath.len());
        for entry in &external.classpath {
            let entry = normalize(&base_dir.join(entry));
            if !entry.exists() {
                return Err(BuildError::Environment {
                    source: io::Error::new(io::ErrorKind::NotFound, "classpath entry does not exist"),
                    path: entry,
                });
            }
            entries.push(entry);
        }
        let classpath = ClasspathContext::layered(entries, Arc::clone(self.session_classpath));

        let project = ProjectDescriptor {
            name: container.clone(),
            dependencies: external.dependencies.clone(),
        };
        if !project.dependencies.is_empty() {
            tracing::debug!(
                container = %container,
                dependencies = ?project.dependencies,
                "container dependencies are recorded but not enforced"
            );
        }

        let state = self.store.get_state(container).derive_working_copy();
        let invalidated = self.store.invalidations(container);
        let others = self.store.snapshot_others(container);

        tracing::debug!(
            container = %container,
            dirty = dirty.len(),
            deleted = deleted.len(),
            invalidated = invalidated.len(),
            base_generation = state.base_generation(),
            "translated build request"
        );

        Ok(BuildRequest {
            base_dir,
            project,
            dirty,
            deleted,
            state,
            others,
            invalidated,
            outputs,
            classpath,
        })
    }
}

/// Makes `dir` absolute and normalized, and checks it is an existing directory.
fn canonical_dir(dir: &Path) -> Result<PathBuf, BuildError> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(BuildError::environment(dir))?
            .join(dir)
    };
    let absolute = normalize(&absolute);
    if !absolute.is_dir() {
        return Err(BuildError::Environment {
            source: io::Error::new(io::ErrorKind::NotFound, "project directory does not exist"),
            path: absolute,
        });
    }
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OutletDescription;
    use kiln_common::ContainerHandle;

    fn setup() -> (tempfile::TempDir, IndexStore, Arc<ClasspathContext>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        (dir, IndexStore::new(), Arc::new(ClasspathContext::default()))
    }

    #[test]
    fn resolves_paths_against_project_dir() {
        let (dir, store, session) = setup();
        let translator = BuildRequestTranslator::new(&store, &session);
        let guard = store.lock_container(&ContainerHandle::new("app"));
        let external = ExternalBuildRequest::new(dir.path(), "app")
            .dirty("src/./A.lang")
            .deleted("src/B.lang")
            .outlet("demo", OutletDescription::new("default", "gen"));

        let request = translator.translate(&external, &guard).unwrap();
        let a = SourceUri::from_absolute(&dir.path().join("src/A.lang"));
        assert!(request.dirty.contains(&a));
        assert_eq!(request.deleted.len(), 1);
        assert_eq!(
            request.outputs.get("demo", "default").unwrap().target,
            dir.path().join("gen")
        );
        assert_eq!(request.container().as_str(), "app");
    }

    #[test]
    fn deleted_wins_over_dirty() {
        let (dir, store, session) = setup();
        let translator = BuildRequestTranslator::new(&store, &session);
        let guard = store.lock_container(&ContainerHandle::new("app"));
        let external = ExternalBuildRequest::new(dir.path(), "app")
            .dirty("src/A.lang")
            .deleted("src/A.lang");

        let request = translator.translate(&external, &guard).unwrap();
        assert!(request.dirty.is_empty());
        assert_eq!(request.deleted.len(), 1);
    }

    #[test]
    fn missing_project_dir_is_environment_fault() {
        let (dir, store, session) = setup();
        let translator = BuildRequestTranslator::new(&store, &session);
        let guard = store.lock_container(&ContainerHandle::new("app"));
        let external = ExternalBuildRequest::new(dir.path().join("nope"), "app");

        let err = translator.translate(&external, &guard).unwrap_err();
        assert!(matches!(err, BuildError::Environment { .. }));
    }

    #[test]
    fn missing_classpath_entry_is_environment_fault() {
        let (dir, store, session) = setup();
        let translator = BuildRequestTranslator::new(&store, &session);
        let guard = store.lock_container(&ContainerHandle::new("app"));
        let external = ExternalBuildRequest::new(dir.path(), "app").classpath_entry("lib");

        let err = translator.translate(&external, &guard).unwrap_err();
        match err {
            BuildError::Environment { path, .. } => assert_eq!(path, dir.path().join("lib")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn snapshot_excludes_own_container() {
        let (dir, store, session) = setup();
        let core = ContainerHandle::new("core");
        let core_guard = store.lock_container(&core);
        store.commit(&core_guard, Default::default(), Default::default());
        drop(core_guard);

        let translator = BuildRequestTranslator::new(&store, &session);
        let guard = store.lock_container(&ContainerHandle::new("app"));
        let request = translator
            .translate(&ExternalBuildRequest::new(dir.path(), "app").depends_on("core"), &guard)
            .unwrap();
        assert!(request.others.contains_key(&core));
        assert!(!request.others.contains_key(&ContainerHandle::new("app")));
        assert_eq!(request.project.dependencies, vec![core]);
        assert_eq!(request.state.base_generation(), 0);
    }
}
