//! Output configuration and writing of generated files.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use kiln_debuginfo::{read_sidecar, sidecar_path, write_sidecar, SourceTrace};

/// A resolved output slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfiguration {
    /// Outlet name.
    pub name: String,
    /// Absolute target directory.
    pub target: PathBuf,
    /// Create the target directory on demand.
    pub create_directory: bool,
    /// Overwrite files the builder does not own.
    pub overwrite_existing: bool,
    /// Delete files that are no longer generated.
    pub cleanup_derived: bool,
}

/// Output slots of every language, keyed by language identifier then outlet name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfigurations {
    by_language: BTreeMap<String, BTreeMap<String, OutputConfiguration>>,
}

impl OutputConfigurations {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an outlet for `language`.
    pub fn insert(&mut self, language: &str, outlet: OutputConfiguration) {
        self.by_language
            .entry(language.to_string())
            .or_default()
            .insert(outlet.name.clone(), outlet);
    }

    /// Returns the outlet `outlet` of `language`.
    pub fn get(&self, language: &str, outlet: &str) -> Option<&OutputConfiguration> {
        self.by_language.get(language)?.get(outlet)
    }

    /// Finds the outlet called `outlet` whose target directory contains `path`.
    pub fn owning(&self, outlet: &str, path: &Path) -> Option<&OutputConfiguration> {
        self.by_language
            .values()
            .filter_map(|outlets| outlets.get(outlet))
            .find(|cfg| path.starts_with(&cfg.target))
    }

    /// Iterates over `(language, outlet)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputConfiguration)> {
        self.by_language
            .iter()
            .flat_map(|(lang, outlets)| outlets.values().map(move |o| (lang.as_str(), o)))
    }

    /// Returns `true` if no outlet is configured.
    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }
}

/// What happened when a generated file was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    /// The contents changed and were written.
    Written,
    /// The file on disk already had these contents.
    Unchanged,
    /// An existing file not owned by the builder was left alone.
    Refused,
}

/// Writes `contents` to `path` inside `outlet`.
///
/// `owned` tells whether the mapping already records `path` as generated by
/// the same source. The file is only rewritten when its hash changes. A
/// trace is stored in the sidecar whenever it differs from the stored one;
/// without one any stale sidecar is removed.
pub(crate) fn write_generated(
    outlet: &OutputConfiguration,
    path: &Path,
    contents: &[u8],
    trace: Option<&SourceTrace>,
    owned: bool,
) -> io::Result<WriteOutcome> {
    if !outlet.target.is_dir() {
        if !outlet.create_directory {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("output directory of outlet '{}' does not exist", outlet.name),
            ));
        }
        std::fs::create_dir_all(&outlet.target)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let outcome = match std::fs::read(path) {
        Ok(existing) if ContentHash::from_bytes(&existing) == ContentHash::from_bytes(contents) => {
            WriteOutcome::Unchanged
        }
        Ok(_) if !owned && !outlet.overwrite_existing => return Ok(WriteOutcome::Refused),
        Ok(_) => {
            std::fs::write(path, contents)?;
            WriteOutcome::Written
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            std::fs::write(path, contents)?;
            WriteOutcome::Written
        }
        Err(e) => return Err(e),
    };

    match trace {
        // Source lines can move without changing the generated text.
        Some(trace) if read_sidecar(path).ok().flatten().as_ref() != Some(trace) => {
            write_sidecar(path, trace)?;
        }
        Some(_) => {}
        None => {
            remove_if_exists(&sidecar_path(path))?;
        }
    }
    Ok(outcome)
}

/// Deletes a generated file and its sidecar, unless `outlet` disables cleanup.
///
/// Returns `true` if the file was removed.
pub(crate) fn delete_generated(path: &Path, outlet: Option<&OutputConfiguration>) -> io::Result<bool> {
    if outlet.is_some_and(|o| !o.cleanup_derived) {
        return Ok(false);
    }
    remove_if_exists(&sidecar_path(path))?;
    remove_if_exists(path)
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
