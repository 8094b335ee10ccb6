//! Container resolution: turning configured relative paths into absolute ones.

use crate::error::ConfigError;
use crate::types::{InstallerConfig, KilnConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An output slot with its target directory resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutlet {
    /// Outlet name.
    pub name: String,
    /// Absolute target directory.
    pub target: PathBuf,
    /// Create the target directory on demand.
    pub create_directory: bool,
    /// Overwrite files the builder did not generate.
    pub overwrite_existing: bool,
    /// Delete files that are no longer generated.
    pub cleanup_derived: bool,
}

/// A container configuration with every path made absolute.
#[derive(Debug, Clone)]
pub struct ResolvedContainer {
    /// Container name.
    pub name: String,
    /// Absolute project directory.
    pub project_dir: PathBuf,
    /// Absolute source directories.
    pub source_dirs: Vec<PathBuf>,
    /// Absolute container classpath entries, in declaration order.
    pub classpath: Vec<PathBuf>,
    /// Declared dependencies.
    pub dependencies: Vec<String>,
    /// Outlets by language identifier.
    pub outputs: BTreeMap<String, Vec<ResolvedOutlet>>,
}

/// Debug-info settings with paths made absolute.
#[derive(Debug, Clone)]
pub struct ResolvedDebugInfo {
    /// Absolute classes directory.
    pub classes_dir: PathBuf,
    /// Absolute output directory, if different from the classes directory.
    pub output_dir: Option<PathBuf>,
    /// Installer settings by generated file extension.
    pub installers: BTreeMap<String, InstallerConfig>,
}

/// Resolves the container `name`, making paths absolute against `base_dir`.
///
/// `base_dir` is the directory holding `kiln.toml`. Source directories are
/// relative to the container's project directory; every other path is
/// relative to `base_dir`.
pub fn resolve_container(
    config: &KilnConfig,
    name: &str,
    base_dir: &Path,
) -> Result<ResolvedContainer, ConfigError> {
    let container = config
        .containers
        .get(name)
        .ok_or_else(|| ConfigError::UnknownContainer(name.to_string()))?;

    let project_dir = match &container.project_dir {
        Some(dir) => base_dir.join(dir),
        None => base_dir.to_path_buf(),
    };
    let source_dirs = container
        .sources
        .iter()
        .map(|s| project_dir.join(s))
        .collect();
    let classpath = container.classpath.iter().map(|c| base_dir.join(c)).collect();

    let outputs = container
        .outputs
        .iter()
        .map(|(language, outlets)| {
            let resolved = outlets
                .iter()
                .map(|(outlet, cfg)| ResolvedOutlet {
                    name: outlet.clone(),
                    target: base_dir.join(&cfg.target),
                    create_directory: cfg.create_directory,
                    overwrite_existing: cfg.overwrite_existing,
                    cleanup_derived: cfg.cleanup_derived,
                })
                .collect();
            (language.clone(), resolved)
        })
        .collect();

    Ok(ResolvedContainer {
        name: name.to_string(),
        project_dir,
        source_dirs,
        classpath,
        dependencies: container.dependencies.clone(),
        outputs,
    })
}

/// Resolves the `[debug_info]` section against `base_dir`.
pub fn resolve_debug_info(
    config: &KilnConfig,
    base_dir: &Path,
) -> Result<ResolvedDebugInfo, ConfigError> {
    let debug_info = config
        .debug_info
        .as_ref()
        .ok_or_else(|| ConfigError::MissingField("debug_info".to_string()))?;
    Ok(ResolvedDebugInfo {
        classes_dir: base_dir.join(&debug_info.classes_dir),
        output_dir: debug_info.output_dir.as_ref().map(|d| base_dir.join(d)),
        installers: debug_info.installers.clone(),
    })
}
