//! External reporting sinks issues are forwarded to.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use parking_lot::Mutex;

/// Receives every issue a build records, in detection order.
///
/// The sink belongs to the caller (the build-tool adapter); the builder only
/// invokes it.
pub trait ReportSink: Send + Sync {
    /// Reports a single issue.
    fn report(&self, diag: &Diagnostic);
}

/// Forwards issues to `tracing` at the level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, diag: &Diagnostic) {
        let location = diag
            .location
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match diag.severity {
            Severity::Error => {
                tracing::error!(code = %diag.code, %location, "{}", diag.message)
            }
            Severity::Warning => {
                tracing::warn!(code = %diag.code, %location, "{}", diag.message)
            }
            Severity::Info => {
                tracing::info!(code = %diag.code, %location, "{}", diag.message)
            }
        }
    }
}

/// Keeps every reported issue in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Takes everything reported so far, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }
}

impl ReportSink for MemorySink {
    fn report(&self, diag: &Diagnostic) {
        self.diagnostics.lock().push(diag.clone());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn report(&self, _diag: &Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    fn diag(message: &str) -> Diagnostic {
        Diagnostic::error(DiagnosticCode::new(Category::Validation, 1), message)
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.report(&diag("first"));
        sink.report(&diag("second"));
        let all = sink.take_all();
        assert_eq!(all[0].message, "first");
        assert_eq!(all[1].message, "second");
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn tracing_sink_without_subscriber_is_silent() {
        TracingSink.report(&diag("nobody listens"));
    }
}
