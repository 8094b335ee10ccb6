//! The builder context: one per process, shared by every build call.

use std::path::PathBuf;
use std::sync::Arc;

use kiln_common::{ContainerHandle, Encoding, SourceUri};
use kiln_debuginfo::{InstallDebugInfoRequest, InstallReport};
use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, ReportSink, Severity};
use kiln_index::IndexStore;
use kiln_lang::LanguageRegistry;
use serde::{Deserialize, Serialize};

use crate::classpath::ClasspathContext;
use crate::engine::IncrementalBuilder;
use crate::error::BuildError;
use crate::request::ExternalBuildRequest;
use crate::result::BuildResult;
use crate::translator::BuildRequestTranslator;

/// Debug-info installation failed for one generated file.
pub const INSTALL_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Generation, 501);

/// Summary of a committed build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Container that was built.
    pub container: ContainerHandle,
    /// Generation of the committed state.
    pub generation: u64,
    /// Units reprocessed because they were reported dirty.
    pub directly_dirty: Vec<SourceUri>,
    /// Units reprocessed because something they reference changed.
    pub transitively_dirty: Vec<SourceUri>,
    /// Units removed from the index.
    pub deleted: Vec<SourceUri>,
    /// Generated files written.
    pub written: Vec<PathBuf>,
    /// Generated files deleted.
    pub removed: Vec<PathBuf>,
    /// Other containers referencing names this build changed.
    pub affected_containers: Vec<ContainerHandle>,
    /// Number of warnings recorded.
    pub warnings: usize,
    /// Number of errors recorded.
    pub errors: usize,
}

impl BuildReport {
    fn new(result: &BuildResult, generation: u64) -> Self {
        let warnings = result
            .issues
            .iter()
            .filter(|(_, d)| d.severity == Severity::Warning)
            .count();
        Self {
            container: result.container.clone(),
            generation,
            directly_dirty: result.directly_dirty.iter().cloned().collect(),
            transitively_dirty: result.transitively_dirty.iter().cloned().collect(),
            deleted: result.deleted.iter().cloned().collect(),
            written: result.written.clone(),
            removed: result.removed.clone(),
            affected_containers: result.affected_containers.clone(),
            warnings,
            errors: result.error_count(),
        }
    }

    /// Returns `true` if no error was recorded.
    pub fn is_error_free(&self) -> bool {
        self.errors == 0
    }
}

/// Process-wide builder state: languages, session classpath and the index store.
///
/// Assembled once at startup and passed by reference to every call. Builds
/// of different containers run concurrently; builds of the same container
/// wait for each other.
pub struct BuildContext {
    registry: Arc<LanguageRegistry>,
    session_classpath: Arc<ClasspathContext>,
    store: IndexStore,
}

impl BuildContext {
    /// Creates a context with an empty index store.
    pub fn new(registry: LanguageRegistry, session_classpath: Vec<PathBuf>) -> Self {
        Self {
            registry: Arc::new(registry),
            session_classpath: Arc::new(ClasspathContext::new(session_classpath)),
            store: IndexStore::new(),
        }
    }

    /// The registered languages.
    pub fn language_setups(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Default encoding source units are parsed with.
    pub fn encoding(&self) -> Encoding {
        self.registry.encoding()
    }

    /// The index store holding every container's committed state.
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Builds and commits one container, returning the report even when
    /// validation failed.
    ///
    /// Containers referencing names this build changed are invalidated, so
    /// their next build rechecks those units even if nothing else is dirty.
    pub fn run(&self, request: &ExternalBuildRequest, sink: &dyn ReportSink) -> Result<BuildReport, BuildError> {
        let guard = self.store.lock_container(&request.container);
        let internal =
            BuildRequestTranslator::new(&self.store, &self.session_classpath).translate(request, &guard)?;
        let result = IncrementalBuilder::new(&self.registry).build(internal, sink)?;
        let generation = self
            .store
            .commit(&guard, result.descriptions.clone(), result.mapping.clone());
        self.store.acknowledge(&guard, &result.invalidated);
        if !result.affected_containers.is_empty() {
            let changed = result.changed_names();
            for affected in &result.affected_containers {
                self.store.invalidate(affected, changed.iter().cloned());
            }
        }
        Ok(BuildReport::new(&result, generation))
    }

    /// Builds and commits one container.
    ///
    /// A validation failure still commits the new state, then returns
    /// [`BuildError::ValidationFailed`].
    pub fn build(&self, request: &ExternalBuildRequest, sink: &dyn ReportSink) -> Result<BuildReport, BuildError> {
        let report = self.run(request, sink)?;
        if !report.is_error_free() {
            return Err(BuildError::ValidationFailed {
                container: report.container,
                errors: report.errors,
            });
        }
        Ok(report)
    }

    /// Installs debug information for the generated files of a container.
    ///
    /// Per-file failures are forwarded to `sink` and listed in the report;
    /// they never abort the call.
    pub fn install_debug_info(&self, request: &InstallDebugInfoRequest, sink: &dyn ReportSink) -> InstallReport {
        let mapping = self.store.get_mapping(&request.container);
        if mapping.is_empty() {
            tracing::debug!(container = %request.container, "no generated files recorded");
        }
        let report = kiln_debuginfo::install(request, mapping.all_generated());
        for err in &report.errors {
            sink.report(&Diagnostic::error(INSTALL_FAILED, err.to_string()));
        }
        report
    }
}
