//! Shared helpers for CLI commands.
//!
//! Contains what `build`, `serve` and `install-debug-info` have in common:
//! project root resolution, session setup from `kiln.toml`, source file
//! discovery, and the conversion of configured containers into build requests.

use std::error::Error;
use std::path::{Path, PathBuf};

use kiln_build::{BuildContext, ExternalBuildRequest, OutletDescription};
use kiln_common::{Encoding, SourceUri};
use kiln_config::{
    InstallerKind, KilnConfig, ResolvedContainer, ResolvedDebugInfo, CONFIG_FILE_NAME,
};
use kiln_debuginfo::{InstallDebugInfoRequest, SourceInstaller, SourceInstallerConfig};
use kiln_diagnostics::{Diagnostic, DiagnosticRenderer, ReportSink, TerminalRenderer};
use kiln_lang::{LanguageRegistry, SetupCatalog};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `kiln.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the directory holding `kiln.toml` from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Every language setup this binary ships with.
pub fn builtin_catalog() -> SetupCatalog {
    kiln_demo_lang::catalog()
}

/// A loaded configuration plus the build context assembled from it.
pub struct Session {
    /// Directory holding `kiln.toml`; relative config paths resolve against it.
    pub base_dir: PathBuf,
    /// The parsed configuration.
    pub config: KilnConfig,
    /// The process-wide builder state.
    pub context: BuildContext,
}

impl Session {
    /// Loads the configuration selected by `global` and builds the context.
    pub fn open(global: &GlobalArgs) -> Result<Self, Box<dyn Error>> {
        let base_dir = resolve_project_root(global)?;
        Self::from_dir(&base_dir)
    }

    /// Loads `<base_dir>/kiln.toml` and builds the context.
    pub fn from_dir(base_dir: &Path) -> Result<Self, Box<dyn Error>> {
        let config = kiln_config::load_config(base_dir)?;
        let context = build_context(&config, base_dir)?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            config,
            context,
        })
    }

    /// Names of the containers to build: `selected` if given, else every configured one.
    pub fn container_names(&self, selected: Option<&str>) -> Result<Vec<String>, Box<dyn Error>> {
        match selected {
            Some(name) if self.config.containers.contains_key(name) => Ok(vec![name.to_string()]),
            Some(name) => Err(kiln_config::ConfigError::UnknownContainer(name.to_string()).into()),
            None => Ok(self.config.containers.keys().cloned().collect()),
        }
    }

    /// Resolves the container `name` against the session's base directory.
    pub fn resolve(&self, name: &str) -> Result<ResolvedContainer, Box<dyn Error>> {
        Ok(kiln_config::resolve_container(&self.config, name, &self.base_dir)?)
    }

    /// Builds the request for container `name`.
    ///
    /// With no `dirty` and no `deleted` paths, every source file found under the
    /// container's source directories is marked dirty.
    pub fn request(
        &self,
        name: &str,
        dirty: &[String],
        deleted: &[String],
    ) -> Result<ExternalBuildRequest, Box<dyn Error>> {
        let resolved = self.resolve(name)?;
        let mut request = external_request(&resolved);
        if dirty.is_empty() && deleted.is_empty() {
            for path in discover_sources(&resolved.source_dirs, self.context.language_setups())? {
                request = request.dirty(path);
            }
        } else {
            for path in dirty {
                request = request.dirty(path);
            }
            for path in deleted {
                request = request.deleted(path);
            }
        }
        Ok(request)
    }

    /// Builds the install request for `container` from the `[debug_info]` section.
    pub fn install_request(&self, container: &str) -> Result<InstallDebugInfoRequest, Box<dyn Error>> {
        let debug_info = kiln_config::resolve_debug_info(&self.config, &self.base_dir)?;
        Ok(install_request(&debug_info, container))
    }
}

/// Assembles the build context: encoding, registered languages and session classpath.
pub fn build_context(config: &KilnConfig, base_dir: &Path) -> Result<BuildContext, Box<dyn Error>> {
    let encoding: Encoding = config.session.encoding.parse()?;
    let catalog = builtin_catalog();
    let registry = LanguageRegistry::from_setups(
        &catalog,
        config.session.languages.iter().map(String::as_str),
        encoding,
    )?;
    kiln_config::validate_output_languages(config, |language| {
        registry.by_language(language).is_some()
    })?;
    tracing::debug!(
        languages = registry.len(),
        encoding = encoding.name(),
        "language registry ready"
    );

    let classpath = config
        .session
        .classpath
        .iter()
        .map(|entry| base_dir.join(entry))
        .collect();
    Ok(BuildContext::new(registry, classpath))
}

/// Converts a resolved container into a request with nothing dirty yet.
pub fn external_request(container: &ResolvedContainer) -> ExternalBuildRequest {
    let mut request = ExternalBuildRequest::new(&container.project_dir, container.name.as_str());
    for (language, outlets) in &container.outputs {
        for outlet in outlets {
            request = request.outlet(
                language.as_str(),
                OutletDescription {
                    name: outlet.name.clone(),
                    target: outlet.target.clone(),
                    create_directory: outlet.create_directory,
                    overwrite_existing: outlet.overwrite_existing,
                    cleanup_derived: outlet.cleanup_derived,
                },
            );
        }
    }
    for entry in &container.classpath {
        request = request.classpath_entry(entry);
    }
    for dependency in &container.dependencies {
        request = request.depends_on(dependency.as_str());
    }
    request
}

/// Converts resolved `[debug_info]` settings into an install request for `container`.
pub fn install_request(debug_info: &ResolvedDebugInfo, container: &str) -> InstallDebugInfoRequest {
    let mut request = InstallDebugInfoRequest::new(&debug_info.classes_dir, container);
    request.output_dir = debug_info.output_dir.clone();
    for (extension, cfg) in &debug_info.installers {
        let installer = match cfg.installer {
            InstallerKind::Primary => SourceInstaller::Primary,
            InstallerKind::Smap => SourceInstaller::Smap,
            InstallerKind::None => SourceInstaller::None,
        };
        request = request.with_installer(
            extension.as_str(),
            SourceInstallerConfig {
                installer,
                hide_synthetic_variables: cfg.hide_synthetic_variables,
            },
        );
    }
    request
}

/// Discovers source files under `dirs` that a registered language claims.
///
/// Missing directories are skipped. The result is sorted.
pub fn discover_sources(dirs: &[PathBuf], registry: &LanguageRegistry) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();
    for dir in dirs {
        if dir.is_dir() {
            walk_dir(dir, registry, &mut files)?;
        } else {
            tracing::warn!(dir = %dir.display(), "source directory does not exist");
        }
    }
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, registry: &LanguageRegistry, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, registry, files)?;
        } else if registry.resolve(&SourceUri::from_absolute(&path)).is_some() {
            files.push(path);
        }
    }
    Ok(())
}

/// Prints each issue to stderr as soon as it is reported.
pub struct RenderingSink {
    renderer: TerminalRenderer,
}

impl RenderingSink {
    /// Creates a sink rendering with or without color.
    pub fn new(color: bool) -> Self {
        Self {
            renderer: TerminalRenderer::new(color),
        }
    }
}

impl ReportSink for RenderingSink {
    fn report(&self, diag: &Diagnostic) {
        eprint!("{}", self.renderer.render(diag));
    }
}
