//! Error types for build invocations.

use std::path::PathBuf;

use kiln_common::ContainerHandle;

/// Why a build call did not succeed.
///
/// Validation failures and environment faults are kept distinct: the first
/// is an expected outcome reported through the sink, the second means the
/// build could not run at all.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// One or more dirty units failed validation. The new state was still
    /// committed; details went to the report sink.
    #[error("validation failed for container '{container}' ({errors} error(s)), see the build log for details")]
    ValidationFailed {
        /// Container that was built.
        container: ContainerHandle,
        /// Number of error-severity issues recorded.
        errors: usize,
    },

    /// The filesystem or classpath was not usable. Nothing was committed.
    #[error("environment fault at {path}: {source}")]
    Environment {
        /// The path that could not be accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn environment(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> BuildError {
        let path = path.into();
        move |source| BuildError::Environment { path, source }
    }

    /// Returns `true` for a validation failure, `false` for a fatal fault.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, BuildError::ValidationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failed_display() {
        let err = BuildError::ValidationFailed {
            container: ContainerHandle::new("app"),
            errors: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("'app'"));
        assert!(msg.contains("2 error(s)"));
        assert!(err.is_validation_failure());
    }

    #[test]
    fn environment_display() {
        let err = BuildError::environment("/missing/dir")(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not found",
        ));
        let msg = err.to_string();
        assert!(msg.contains("environment fault"));
        assert!(msg.contains("/missing/dir"));
        assert!(!err.is_validation_failure());
    }
}
