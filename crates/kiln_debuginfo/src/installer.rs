//! Installs debug information into compiled artifacts.
//!
//! For a generated file `<out>/pkg/A.out` with a trace sidecar, the compiled
//! artifact is `<classes_dir>/pkg/A.class`. Debug information is stored as a
//! trailer at the end of the artifact: a framed [`DebugInfo`] payload, its
//! length as a little-endian `u32`, and the magic bytes `KDBG`. Installing
//! again replaces an existing trailer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InstallationError, TraceError};
use crate::format::{decode_framed, encode_framed};
use crate::request::{InstallDebugInfoRequest, SourceInstaller, SourceInstallerConfig};
use crate::smap;
use crate::trace::{read_sidecar, LineMapping, LocalVariable, SourceTrace};

const TRAILER_MAGIC: [u8; 4] = *b"KDBG";
const PAYLOAD_MAGIC: [u8; 4] = *b"KDBI";

/// Extension of compiled artifacts.
pub const ARTIFACT_EXTENSION: &str = "class";

/// Debug information as installed into an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Strategy that produced this record.
    pub installer: SourceInstaller,
    /// Name of the primary source of the artifact.
    pub source_name: String,
    /// SMAP text, for the `smap` strategy.
    pub smap: Option<String>,
    /// Line table mapping artifact lines to primary source lines.
    pub lines: Vec<LineMapping>,
    /// Local variable table.
    pub locals: Vec<LocalVariable>,
}

impl DebugInfo {
    fn from_trace(trace: &SourceTrace, config: SourceInstallerConfig) -> Self {
        let locals = trace
            .locals
            .iter()
            .filter(|local| !(config.hide_synthetic_variables && local.synthetic))
            .cloned()
            .collect();
        let generated_name = trace
            .generated
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match config.installer {
            SourceInstaller::Smap => Self {
                installer: SourceInstaller::Smap,
                smap: Some(smap::render(trace, &generated_name)),
                source_name: generated_name,
                lines: Vec::new(),
                locals,
            },
            _ => Self {
                installer: SourceInstaller::Primary,
                source_name: trace.source_name.clone(),
                smap: None,
                lines: trace.lines.clone(),
                locals,
            },
        }
    }
}

/// Outcome of one installation run.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Artifacts that received debug information.
    pub installed: Vec<PathBuf>,
    /// Artifacts whose debug information was removed.
    pub stripped: Vec<PathBuf>,
    /// Generated files with nothing to install into (no sidecar or no artifact).
    pub skipped: Vec<PathBuf>,
    /// Per-file failures. These never abort the run.
    pub errors: Vec<InstallationError>,
}

impl InstallReport {
    /// Returns `true` if no file failed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Splits `artifact` into its body and the installed debug info, if any.
fn split_trailer(artifact: &[u8]) -> Result<(&[u8], Option<DebugInfo>), TraceError> {
    let len = artifact.len();
    if len < 8 || artifact[len - 4..] != TRAILER_MAGIC {
        return Ok((artifact, None));
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&artifact[len - 8..len - 4]);
    let payload_len = u32::from_le_bytes(len_bytes) as usize;
    if payload_len > len - 8 {
        return Err(TraceError::InvalidHeader {
            reason: "debug-info trailer length exceeds artifact size".to_string(),
        });
    }
    let body_end = len - 8 - payload_len;
    let info = decode_framed(PAYLOAD_MAGIC, &artifact[body_end..len - 8])?;
    Ok((&artifact[..body_end], Some(info)))
}

/// Reads the debug information installed into an artifact, if any.
pub fn read_debug_info(artifact: &[u8]) -> Result<Option<DebugInfo>, TraceError> {
    split_trailer(artifact).map(|(_, info)| info)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> InstallationError + '_ {
    move |source| InstallationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Installs debug information for `generated` files according to `request`.
///
/// Files whose extension has no installer configured are ignored. A missing
/// generated file, an unreadable sidecar or an I/O failure is recorded in the
/// report and the remaining files are still processed; nothing already
/// installed is rolled back.
pub fn install<'a>(
    request: &InstallDebugInfoRequest,
    generated: impl IntoIterator<Item = &'a Path>,
) -> InstallReport {
    let mut report = InstallReport::default();
    for path in generated {
        let Some(config) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| request.source_installers.get(e))
        else {
            continue;
        };
        match install_one(request, path, *config) {
            Ok(Outcome::Installed(artifact)) => report.installed.push(artifact),
            Ok(Outcome::Stripped(artifact)) => report.stripped.push(artifact),
            Ok(Outcome::Skipped) => report.skipped.push(path.to_path_buf()),
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "debug-info installation failed");
                report.errors.push(err);
            }
        }
    }
    tracing::debug!(
        container = %request.container,
        installed = report.installed.len(),
        stripped = report.stripped.len(),
        skipped = report.skipped.len(),
        failed = report.errors.len(),
        "debug-info installation finished"
    );
    report
}

enum Outcome {
    Installed(PathBuf),
    Stripped(PathBuf),
    Skipped,
}

fn install_one(
    request: &InstallDebugInfoRequest,
    generated: &Path,
    config: SourceInstallerConfig,
) -> Result<Outcome, InstallationError> {
    if !generated.is_file() {
        return Err(InstallationError::MissingGenerated {
            path: generated.to_path_buf(),
        });
    }
    let Some(trace) = read_sidecar(generated)? else {
        tracing::debug!(file = %generated.display(), "no trace sidecar, skipping");
        return Ok(Outcome::Skipped);
    };

    let relative = trace.generated.with_extension(ARTIFACT_EXTENSION);
    let artifact_path = request.classes_dir.join(&relative);
    let raw = match std::fs::read(&artifact_path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(artifact = %artifact_path.display(), "no compiled artifact, skipping");
            return Ok(Outcome::Skipped);
        }
        Err(source) => {
            return Err(InstallationError::Io {
                path: artifact_path,
                source,
            })
        }
    };

    let (body, _previous) = split_trailer(&raw).map_err(|source| InstallationError::CorruptTrace {
        path: artifact_path.clone(),
        source,
    })?;

    let mut output = body.to_vec();
    let stripping = config.installer == SourceInstaller::None;
    if !stripping {
        let info = DebugInfo::from_trace(&trace, config);
        let payload = encode_framed(PAYLOAD_MAGIC, &info).map_err(|source| {
            InstallationError::CorruptTrace {
                path: artifact_path.clone(),
                source,
            }
        })?;
        output.extend_from_slice(&payload);
        output.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        output.extend_from_slice(&TRAILER_MAGIC);
    }

    let target = request.output_dir().join(&relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    std::fs::write(&target, &output).map_err(io_error(&target))?;

    Ok(if stripping {
        Outcome::Stripped(target)
    } else {
        Outcome::Installed(target)
    })
}
