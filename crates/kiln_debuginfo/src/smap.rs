//! Source map (SMAP) rendering for the `smap` installer strategy.

use std::fmt::Write;

use crate::trace::SourceTrace;

/// Stratum name written into every SMAP.
pub const STRATUM: &str = "Kiln";

/// Renders `trace` as an SMAP resolution section.
///
/// `generated_name` is the file name the compiled artifact was built from.
/// Each line mapping becomes one `*L` entry of the form
/// `<source line>#1:<generated line>`.
pub fn render(trace: &SourceTrace, generated_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SMAP");
    let _ = writeln!(out, "{generated_name}");
    let _ = writeln!(out, "{STRATUM}");
    let _ = writeln!(out, "*S {STRATUM}");
    let _ = writeln!(out, "*F");
    let _ = writeln!(out, "+ 1 {}", trace.source_name);
    let _ = writeln!(out, "{}", trace.source_path.display());
    let _ = writeln!(out, "*L");
    for mapping in &trace.lines {
        let _ = writeln!(out, "{}#1:{}", mapping.source_line, mapping.generated_line);
    }
    let _ = writeln!(out, "*E");
    out
}
