//! Error types for trace encoding and debug-info installation.

use std::path::PathBuf;

/// Errors decoding or encoding a framed trace or debug-info payload.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The bytes are too short or the header does not carry the expected magic.
    #[error("invalid header: {reason}")]
    InvalidHeader {
        /// Description of the header problem.
        reason: String,
    },

    /// The payload was written by an incompatible format version.
    #[error("format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The version this build understands.
        expected: u32,
        /// The version found in the header.
        actual: u32,
    },

    /// The payload does not match the checksum recorded in its header.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The checksum from the header.
        expected: String,
        /// The checksum computed over the payload.
        actual: String,
    },

    /// `bincode` failed to encode or decode a value.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

/// A failure installing debug information for one generated file.
///
/// Installation never aborts on these: each is recorded in the
/// [`InstallReport`](crate::InstallReport) and the next file is processed.
#[derive(Debug, thiserror::Error)]
pub enum InstallationError {
    /// A generated file listed in the mapping no longer exists on disk.
    #[error("generated file {path} no longer exists")]
    MissingGenerated {
        /// The missing generated file.
        path: PathBuf,
    },

    /// Reading or writing a file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A trace sidecar or an existing debug-info trailer could not be decoded.
    #[error("corrupt trace data in {path}: {source}")]
    CorruptTrace {
        /// The sidecar or artifact holding the bad data.
        path: PathBuf,
        /// What was wrong with it.
        source: TraceError,
    },
}

impl InstallationError {
    /// Returns the file this error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            InstallationError::MissingGenerated { path }
            | InstallationError::Io { path, .. }
            | InstallationError::CorruptTrace { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_generated_display() {
        let err = InstallationError::MissingGenerated {
            path: PathBuf::from("gen/A.out"),
        };
        assert!(err.to_string().contains("gen/A.out"));
        assert_eq!(err.path(), std::path::Path::new("gen/A.out"));
    }

    #[test]
    fn corrupt_trace_display_includes_cause() {
        let err = InstallationError::CorruptTrace {
            path: PathBuf::from("gen/.A.out._trace"),
            source: TraceError::VersionMismatch {
                expected: 1,
                actual: 7,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("corrupt trace data"));
        assert!(msg.contains("expected 1, got 7"));
    }

    #[test]
    fn checksum_mismatch_display() {
        let err = TraceError::ChecksumMismatch {
            expected: "aabb".to_string(),
            actual: "ccdd".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aabb"));
        assert!(msg.contains("ccdd"));
    }
}
