//! `kiln install-debug-info`: attach source line information to compiled artifacts.
//!
//! Index state only lives in memory, so the container is first built from
//! all of its sources; the generated files recorded by that build are then
//! matched against the artifacts in `[debug_info].classes_dir`.

use std::error::Error;

use kiln_debuginfo::InstallReport;

use crate::pipeline::{RenderingSink, Session};
use crate::{GlobalArgs, InstallArgs, EXIT_FAILED};

/// Runs the `kiln install-debug-info` command.
///
/// Returns exit code 0 if every file was processed, 1 if any failed or the
/// preceding build recorded errors.
pub fn run(args: &InstallArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::open(global)?;
    let (build_ok, report) = build_and_install(&session, &args.container, global)?;

    if !global.quiet {
        eprintln!(
            "   Installed: {} artifact(s), {} stripped, {} skipped, {} failed",
            report.installed.len(),
            report.stripped.len(),
            report.skipped.len(),
            report.errors.len()
        );
    }

    if build_ok && report.is_success() {
        Ok(0)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Builds `container` from all its sources, then installs its debug information.
pub fn build_and_install(
    session: &Session,
    container: &str,
    global: &GlobalArgs,
) -> Result<(bool, InstallReport), Box<dyn Error>> {
    let install = session.install_request(container)?;
    let request = session.request(container, &[], &[])?;
    let sink = RenderingSink::new(global.color);
    let built = session.context.run(&request, &sink)?;
    let report = session.context.install_debug_info(&install, &sink);
    Ok((built.is_error_free(), report))
}
