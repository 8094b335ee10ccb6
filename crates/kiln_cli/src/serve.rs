//! `kiln serve`: a long-lived build session over JSON lines.
//!
//! Each stdin line holds one request, either `{"build": {...}}` or
//! `{"install_debug_info": {...}}`; each request gets exactly one response
//! line on stdout. Index state lives for as long as the session does, so
//! every build after the first is incremental.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use kiln_build::{BuildContext, BuildReport, ExternalBuildRequest};
use kiln_debuginfo::InstallDebugInfoRequest;
use kiln_diagnostics::{Diagnostic, MemorySink};
use serde::{Deserialize, Serialize};

use crate::pipeline::Session;
use crate::GlobalArgs;

/// One request line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRequest {
    /// Build and commit one container.
    Build(ExternalBuildRequest),
    /// Install debug information for one container's generated files.
    InstallDebugInfo(InstallDebugInfoRequest),
}

/// One response line.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionResponse {
    /// The build ran and was committed.
    Built {
        /// The committed build report.
        report: BuildReport,
        /// Issues recorded during the build.
        diagnostics: Vec<Diagnostic>,
    },
    /// Debug-info installation ran.
    Installed {
        /// Artifacts that received debug information.
        installed: Vec<PathBuf>,
        /// Artifacts whose debug information was removed.
        stripped: Vec<PathBuf>,
        /// Generated files with nothing to install into.
        skipped: Vec<PathBuf>,
        /// Per-file failures.
        errors: Vec<String>,
    },
    /// The request could not be processed. Nothing was committed.
    Error {
        /// What went wrong.
        message: String,
    },
}

/// Runs the `kiln serve` command on stdin and stdout until end of input.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::open(global)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&session.context, stdin.lock(), stdout.lock())?;
    Ok(0)
}

/// Answers every request line of `input` on `output`.
///
/// Blank lines are skipped. Malformed lines get an error response and the
/// session continues.
pub fn serve(context: &BuildContext, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    let mut served = 0usize;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<SessionRequest>(&line) {
            Ok(request) => handle(context, request),
            Err(e) => SessionResponse::Error {
                message: format!("invalid request: {e}"),
            },
        };
        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
        served += 1;
    }
    tracing::debug!(requests = served, "session closed");
    Ok(())
}

/// Processes one request against the session's context.
pub fn handle(context: &BuildContext, request: SessionRequest) -> SessionResponse {
    match request {
        SessionRequest::Build(request) => {
            let sink = MemorySink::new();
            match context.run(&request, &sink) {
                Ok(report) => SessionResponse::Built {
                    report,
                    diagnostics: sink.take_all(),
                },
                Err(e) => SessionResponse::Error {
                    message: e.to_string(),
                },
            }
        }
        SessionRequest::InstallDebugInfo(request) => {
            let report = context.install_debug_info(&request, &MemorySink::new());
            SessionResponse::Installed {
                installed: report.installed,
                stripped: report.stripped,
                skipped: report.skipped,
                errors: report.errors.iter().map(ToString::to_string).collect(),
            }
        }
    }
}
