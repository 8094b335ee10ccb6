//! The incremental build algorithm.
//!
//! 1. Deleted units leave the index; their generated files are removed.
//! 2. Directly dirty units are parsed (in parallel) and re-indexed.
//! 3. Units referencing an exported name that changed, here or in another
//!    container since the last build, are re-parsed too, repeatedly, until
//!    no new unit becomes dirty.
//! 4. Every dirty unit is validated; units without errors are regenerated,
//!    writing only changed outputs and deleting outputs no longer produced.
//! 5. The working state is frozen into a [`BuildResult`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_common::uri::normalize;
use kiln_common::{ContainerHandle, Encoding, SourceUri};
use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, ReportSink, ValidationCollector};
use kiln_index::{changed_names, ResourceDelta, ResourceDescription, Source2GeneratedMapping, WorkingState};
use kiln_lang::{GeneratedFile, LanguageRegistry, LanguageSetup, ParsedUnit};
use rayon::prelude::*;

use crate::error::BuildError;
use crate::output::{delete_generated, write_generated, OutputConfigurations, WriteOutcome};
use crate::request::BuildRequest;
use crate::result::BuildResult;
use crate::scope::ContextualIndex;

/// A unit's bytes could not be decoded with its encoding.
pub const UNDECODABLE: DiagnosticCode = DiagnosticCode::new(Category::Syntax, 1);
/// A generator wrote to an outlet the request does not configure.
pub const UNKNOWN_OUTLET: DiagnosticCode = DiagnosticCode::new(Category::Generation, 401);
/// A generated file would overwrite a file the builder does not own.
pub const FOREIGN_FILE: DiagnosticCode = DiagnosticCode::new(Category::Generation, 402);

type Pending = (SourceUri, Arc<LanguageSetup>);

#[derive(Default)]
struct FileChanges {
    written: Vec<PathBuf>,
    removed: Vec<PathBuf>,
}

/// Runs builds against a fixed set of languages.
pub struct IncrementalBuilder<'a> {
    registry: &'a LanguageRegistry,
}

impl<'a> IncrementalBuilder<'a> {
    /// Creates a builder resolving languages through `registry`.
    pub fn new(registry: &'a LanguageRegistry) -> Self {
        Self { registry }
    }

    /// Runs one build.
    ///
    /// Issues go to `sink` as they are detected and are also returned in the
    /// result. Only filesystem faults are returned as errors.
    pub fn build(&self, request: BuildRequest, sink: &dyn ReportSink) -> Result<BuildResult, BuildError> {
        let BuildRequest {
            project,
            dirty,
            deleted,
            mut state,
            others,
            invalidated,
            outputs,
            classpath,
            ..
        } = request;
        let container = project.name;
        let base_generation = state.base_generation();
        let collector = ValidationCollector::new(sink);
        let mut files = FileChanges::default();
        let mut deltas = Vec::new();

        for uri in &deleted {
            let old = state.descriptions.remove(uri);
            if old.is_some() {
                deltas.push(ResourceDelta {
                    uri: uri.clone(),
                    old,
                    new: None,
                });
            }
            for (generated, outlet) in state.mapping.delete_source(uri) {
                remove_output(&state.mapping, &outputs, &generated, &outlet, &mut files)?;
            }
        }

        let direct = self.pending(dirty.iter());
        let mut units: BTreeMap<SourceUri, (Arc<LanguageSetup>, ParsedUnit)> = BTreeMap::new();
        for ((uri, setup), unit) in parse_all(&direct, false)? {
            deltas.push(reindex(&mut state, &unit));
            units.insert(uri, (setup, unit));
        }
        let directly_dirty: BTreeSet<SourceUri> = units.keys().cloned().collect();

        let mut transitively_dirty = BTreeSet::new();
        let mut seen_names = changed_names(&deltas);
        seen_names.extend(invalidated.names().cloned());
        let mut frontier = seen_names.clone();
        while !frontier.is_empty() {
            let referencing = state.descriptions.referencing(&frontier);
            let candidates = self.pending(
                referencing
                    .iter()
                    .filter(|uri| !units.contains_key(*uri) && !deleted.contains(*uri)),
            );
            if candidates.is_empty() {
                break;
            }
            let mut next = BTreeSet::new();
            for ((uri, setup), unit) in parse_all(&candidates, true)? {
                let delta = reindex(&mut state, &unit);
                next.extend(delta.changed_names());
                deltas.push(delta);
                transitively_dirty.insert(uri.clone());
                units.insert(uri, (setup, unit));
            }
            next.retain(|name| !seen_names.contains(name));
            seen_names.extend(next.iter().cloned());
            frontier = next;
        }
        tracing::debug!(
            container = %container,
            direct = directly_dirty.len(),
            transitive = transitively_dirty.len(),
            deleted = deleted.len(),
            "computed dirty set"
        );

        {
            let WorkingState {
                descriptions,
                mapping,
                ..
            } = &mut state;
            let scope = ContextualIndex::new(&container, descriptions, &others, &classpath);
            for (uri, (setup, unit)) in &units {
                let parse_clean = collector.record_all(uri, unit.issues.iter().cloned());
                let valid = collector.record_all(uri, setup.validator.validate(unit, &scope));
                if !parse_clean || !valid || unit.description.has_errors {
                    tracing::debug!(unit = %uri, "unit has errors, keeping previous outputs");
                    continue;
                }
                let generated = setup.generator.generate(unit, &scope);
                apply_generated(
                    uri,
                    &setup.language,
                    generated,
                    &outputs,
                    mapping,
                    &collector,
                    &mut files,
                )?;
            }
        }

        let all_changed = changed_names(&deltas);
        let affected_containers: Vec<ContainerHandle> = others
            .iter()
            .filter(|(_, other)| !other.descriptions().data().referencing(&all_changed).is_empty())
            .map(|(handle, _)| handle.clone())
            .collect();
        if !affected_containers.is_empty() {
            tracing::info!(
                container = %container,
                affected = ?affected_containers,
                "changes affect other containers"
            );
        }

        let issues = collector.into_issues();
        let (descriptions, mapping) = state.freeze();
        let result = BuildResult {
            container,
            descriptions,
            mapping,
            base_generation,
            directly_dirty,
            transitively_dirty,
            deleted,
            deltas,
            affected_containers,
            invalidated,
            written: files.written,
            removed: files.removed,
            issues,
        };
        tracing::info!(
            container = %result.container,
            units = result.dirty_units().len(),
            written = result.written.len(),
            removed = result.removed.len(),
            errors = result.error_count(),
            "build finished"
        );
        Ok(result)
    }

    /// Pairs each unit with its language, skipping units no language claims.
    fn pending<'u>(&self, uris: impl Iterator<Item = &'u SourceUri>) -> Vec<Pending> {
        uris.filter_map(|uri| match self.registry.resolve(uri) {
            Some(setup) => Some((uri.clone(), Arc::clone(setup))),
            None => {
                tracing::debug!(unit = %uri, "no language registered for unit, ignoring");
                None
            }
        })
        .collect()
    }
}

/// Parses `pending` in parallel, keeping its order.
///
/// `must_exist` turns a vanished file into a distinct environment fault.
fn parse_all(pending: &[Pending], must_exist: bool) -> Result<Vec<(Pending, ParsedUnit)>, BuildError> {
    pending
        .par_iter()
        .map(|(uri, setup)| {
            if must_exist && !uri.path().is_file() {
                return Err(BuildError::Environment {
                    path: uri.path().to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "dependent unit no longer exists",
                    ),
                });
            }
            let unit = parse_unit(uri, setup)?;
            Ok(((uri.clone(), Arc::clone(setup)), unit))
        })
        .collect()
}

fn parse_unit(uri: &SourceUri, setup: &LanguageSetup) -> Result<ParsedUnit, BuildError> {
    let bytes = std::fs::read(uri.path()).map_err(BuildError::environment(uri.path()))?;
    match Encoding::decode_unit(&bytes, setup.encoding) {
        Ok((text, _)) => Ok(setup.parser.parse(uri, &text)),
        Err(e) => {
            let issue = Diagnostic::error(UNDECODABLE, format!("cannot decode unit: {e}")).at(uri, 1, 1);
            Ok(ParsedUnit::new(ResourceDescription::new(uri.clone()), ()).with_issues(vec![issue]))
        }
    }
}

fn reindex(state: &mut WorkingState, unit: &ParsedUnit) -> ResourceDelta {
    let old = state.descriptions.insert(unit.description.clone());
    ResourceDelta {
        uri: unit.uri().clone(),
        old,
        new: state.descriptions.get(unit.uri()).cloned(),
    }
}

/// Writes a unit's generated files and drops the outputs it no longer produces.
fn apply_generated(
    uri: &SourceUri,
    language: &str,
    generated: Vec<GeneratedFile>,
    outputs: &OutputConfigurations,
    mapping: &mut Source2GeneratedMapping,
    collector: &ValidationCollector<'_>,
    files: &mut FileChanges,
) -> Result<(), BuildError> {
    let previous: BTreeMap<PathBuf, String> = mapping
        .generated_for(uri)
        .into_iter()
        .map(|(path, outlet)| (path.to_path_buf(), outlet.to_string()))
        .collect();
    let mut produced = BTreeSet::new();

    for file in generated {
        let Some(outlet) = outputs.get(language, &file.outlet) else {
            collector.record(
                uri,
                Diagnostic::warning(
                    UNKNOWN_OUTLET,
                    format!("no output configuration for outlet '{}' of language '{language}'", file.outlet),
                ),
            );
            continue;
        };
        let path = normalize(&outlet.target.join(&file.relative_path));
        let trace = file.trace.map(|mut trace| {
            trace.generated = file.relative_path.clone();
            trace
        });
        let owned = previous.contains_key(&path);
        match write_generated(outlet, &path, &file.contents, trace.as_ref(), owned)
            .map_err(BuildError::environment(&path))?
        {
            WriteOutcome::Written => files.written.push(path.clone()),
            WriteOutcome::Unchanged => {}
            WriteOutcome::Refused => {
                collector.record(
                    uri,
                    Diagnostic::warning(
                        FOREIGN_FILE,
                        format!("{} exists and was not generated by kiln, not overwriting", path.display()),
                    ),
                );
                continue;
            }
        }
        mapping.add(uri, &path, &outlet.name);
        produced.insert(path);
    }

    for (stale, outlet) in &previous {
        if produced.contains(stale) {
            continue;
        }
        mapping.remove_edge(uri, stale);
        remove_output(mapping, outputs, stale, outlet, files)?;
    }
    Ok(())
}

/// Deletes a generated file once no source maps to it any more.
fn remove_output(
    mapping: &Source2GeneratedMapping,
    outputs: &OutputConfigurations,
    generated: &Path,
    outlet: &str,
    files: &mut FileChanges,
) -> Result<(), BuildError> {
    if mapping.is_generated(generated) {
        return Ok(());
    }
    if delete_generated(generated, outputs.owning(outlet, generated))
        .map_err(BuildError::environment(generated))?
    {
        files.removed.push(generated.to_path_buf());
    }
    Ok(())
}
