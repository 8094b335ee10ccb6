//! Error types for language registration.

/// Errors raised while registering language setups at startup.
///
/// All of these are fatal: the process cannot build with a partial language set.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// No setup with this identifier is installed.
    #[error("unknown language setup '{id}' (known setups: {known})")]
    UnknownSetup {
        /// The identifier that could not be resolved.
        id: String,
        /// Comma-separated list of installed identifiers.
        known: String,
    },

    /// Two setups claim the same file extension.
    #[error("file extension '.{extension}' is claimed by both '{existing}' and '{incoming}'")]
    ExtensionConflict {
        /// The contested extension.
        extension: String,
        /// Setup that registered the extension first.
        existing: String,
        /// Setup that tried to claim it again.
        incoming: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_setup_lists_known() {
        let err = RegistrationError::UnknownSetup {
            id: "kiln.missing".to_string(),
            known: "kiln.demo".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("kiln.missing"));
        assert!(msg.contains("kiln.demo"));
    }

    #[test]
    fn extension_conflict_names_both() {
        let err = RegistrationError::ExtensionConflict {
            extension: "lang".to_string(),
            existing: "a".to_string(),
            incoming: "b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "file extension '.lang' is claimed by both 'a' and 'b'"
        );
    }
}
