//! Line traces attached to generated files, and their on-disk sidecars.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::format::{decode_framed, encode_framed};

/// Magic bytes identifying a trace sidecar.
const TRACE_MAGIC: [u8; 4] = *b"KTRC";

/// One generated line and the source line it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMapping {
    /// 1-based line in the generated file.
    pub generated_line: u32,
    /// 1-based line in the source unit.
    pub source_line: u32,
}

/// A local variable the generated code declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVariable {
    /// Variable name as it appears in the generated code.
    pub name: String,
    /// Generated line the variable is declared on.
    pub generated_line: u32,
    /// `true` for compiler-introduced variables the user never wrote.
    pub synthetic: bool,
}

/// Maps a generated file back to the source unit it was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTrace {
    /// File name of the source unit, e.g. `A.lang`.
    pub source_name: String,
    /// Path of the source unit.
    pub source_path: PathBuf,
    /// Path of the generated file relative to its output directory.
    ///
    /// The engine fills this in when it writes the sidecar.
    #[serde(default)]
    pub generated: PathBuf,
    /// Line mappings, in generated-line order.
    pub lines: Vec<LineMapping>,
    /// Local variables declared by the generated code.
    pub locals: Vec<LocalVariable>,
}

impl SourceTrace {
    /// Creates an empty trace for the source unit at `source_path`.
    pub fn new(source_path: &Path) -> Self {
        let source_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_name,
            source_path: source_path.to_path_buf(),
            generated: PathBuf::new(),
            lines: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Records that `generated_line` was produced from `source_line`.
    pub fn map_line(&mut self, generated_line: u32, source_line: u32) {
        self.lines.push(LineMapping {
            generated_line,
            source_line,
        });
    }

    /// Records a local variable declared on `generated_line`.
    pub fn add_local(&mut self, name: impl Into<String>, generated_line: u32, synthetic: bool) {
        self.locals.push(LocalVariable {
            name: name.into(),
            generated_line,
            synthetic,
        });
    }

    /// Returns the source line `generated_line` maps to, if any.
    pub fn source_line_for(&self, generated_line: u32) -> Option<u32> {
        self.lines
            .iter()
            .find(|m| m.generated_line == generated_line)
            .map(|m| m.source_line)
    }

    /// Encodes this trace into its framed binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TraceError> {
        encode_framed(TRACE_MAGIC, self)
    }

    /// Decodes a trace from its framed binary form.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, TraceError> {
        decode_framed(TRACE_MAGIC, raw)
    }
}

/// Returns the sidecar path for `generated`: `.<file-name>._trace` in the same directory.
pub fn sidecar_path(generated: &Path) -> PathBuf {
    let name = generated
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    generated.with_file_name(format!(".{name}._trace"))
}

/// Writes the sidecar for `generated`, returning its path.
pub fn write_sidecar(generated: &Path, trace: &SourceTrace) -> std::io::Result<PathBuf> {
    let bytes = trace
        .to_bytes()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let path = sidecar_path(generated);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Reads the sidecar for `generated`.
///
/// Returns `Ok(None)` if the generated file has no sidecar.
pub fn read_sidecar(generated: &Path) -> Result<Option<SourceTrace>, crate::InstallationError> {
    let path = sidecar_path(generated);
    let raw = match std::fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(crate::InstallationError::Io { path, source }),
    };
    SourceTrace::from_bytes(&raw)
        .map(Some)
        .map_err(|source| crate::InstallationError::CorruptTrace { path, source })
}
