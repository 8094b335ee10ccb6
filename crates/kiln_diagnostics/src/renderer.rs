//! Human-readable rendering of issues for terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Formats issues into text.
pub trait DiagnosticRenderer {
    /// Renders a single issue.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders issues in a rustc-like layout:
///
/// ```text
/// error[L201]: unresolved reference 'A.foo'
///   --> /work/app/src/B.lang:2:5
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes for the severity.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_label(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let ansi = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Info => "36",
        };
        format!("\x1b[1;{ansi}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!(
            "{}[{}]: {}\n",
            self.severity_label(diag.severity),
            diag.code,
            diag.message
        );
        if let Some(location) = &diag.location {
            out.push_str(&format!("  --> {location}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use kiln_common::SourceUri;
    use std::path::Path;

    #[test]
    fn render_with_location_and_note() {
        let uri = SourceUri::from_absolute(Path::new("/w/B.lang"));
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Linking, 201),
            "unresolved reference 'A.foo'",
        )
        .at(&uri, 2, 5)
        .with_note("did you mean 'A.bar'?");
        let out = TerminalRenderer::new(false).render(&diag);
        assert!(out.starts_with("error[L201]: unresolved reference 'A.foo'\n"));
        assert!(out.contains("  --> /w/B.lang:2:5\n"));
        assert!(out.contains("= note: did you mean 'A.bar'?"));
    }

    #[test]
    fn render_without_location() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Generation, 2), "kept");
        let out = TerminalRenderer::new(false).render(&diag);
        assert_eq!(out, "warning[G002]: kept\n");
    }

    #[test]
    fn color_wraps_severity() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Syntax, 1), "bad");
        let out = TerminalRenderer::new(true).render(&diag);
        assert!(out.starts_with("\x1b[1;31merror\x1b[0m[S001]"));
    }
}
