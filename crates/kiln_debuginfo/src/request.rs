//! The install-debug-info request.

use std::collections::BTreeMap;
use std::path::PathBuf;

use kiln_common::ContainerHandle;
use serde::{Deserialize, Serialize};

/// How debug information is attached to a compiled artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceInstaller {
    /// The source unit becomes the artifact's primary source, with its own line table.
    #[default]
    Primary,
    /// The generated file stays primary; the source mapping is attached as an SMAP.
    Smap,
    /// Any previously installed debug information is removed.
    None,
}

/// Installer settings for one generated file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceInstallerConfig {
    /// Strategy used for files of this extension.
    #[serde(default)]
    pub installer: SourceInstaller,
    /// Drop compiler-introduced locals from the installed variable table.
    #[serde(default)]
    pub hide_synthetic_variables: bool,
}

/// Request to install debug information for one container's generated files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallDebugInfoRequest {
    /// Directory holding the compiled artifacts.
    pub classes_dir: PathBuf,
    /// Directory the rewritten artifacts are written to; defaults to `classes_dir`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Container whose generated files are processed.
    pub container: ContainerHandle,
    /// Installer settings keyed by generated file extension (without the dot).
    #[serde(default)]
    pub source_installers: BTreeMap<String, SourceInstallerConfig>,
}

impl InstallDebugInfoRequest {
    /// Creates a request writing back into `classes_dir`, with no installers configured.
    pub fn new(classes_dir: impl Into<PathBuf>, container: impl Into<ContainerHandle>) -> Self {
        Self {
            classes_dir: classes_dir.into(),
            output_dir: None,
            container: container.into(),
            source_installers: BTreeMap::new(),
        }
    }

    /// Adds installer settings for `extension`.
    pub fn with_installer(mut self, extension: impl Into<String>, config: SourceInstallerConfig) -> Self {
        self.source_installers.insert(extension.into(), config);
        self
    }

    /// Returns the directory rewritten artifacts go to.
    pub fn output_dir(&self) -> &std::path::Path {
        self.output_dir.as_deref().unwrap_or(&self.classes_dir)
    }
}
