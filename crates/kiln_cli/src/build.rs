//! `kiln build`: one-shot incremental build of configured containers.
//!
//! 1. Find the directory holding `kiln.toml` and load it
//! 2. Register the configured languages
//! 3. Build the selected container, or every configured container
//! 4. Rebuild once any already-built container another build affected
//! 5. Render diagnostics and a per-container summary

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::error::Error;

use kiln_build::BuildReport;
use kiln_diagnostics::{Diagnostic, MemorySink, ReportSink};
use serde::Serialize;

use crate::pipeline::{RenderingSink, Session};
use crate::{BuildArgs, GlobalArgs, ReportFormat, EXIT_FAILED};

/// The final outcome of one container, as printed by `--format json`.
#[derive(Debug, Serialize)]
pub struct ContainerOutcome {
    /// The committed build report.
    pub report: BuildReport,
    /// Every issue the last build of the container recorded.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the `kiln build` command.
///
/// Returns exit code 0 if every container is error free, 1 otherwise.
/// Configuration and environment faults are returned as errors.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::open(global)?;
    let outcomes = build_all(&session, args, global)?;

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                for outcome in &outcomes {
                    let report = &outcome.report;
                    eprintln!(
                        "   Result: {} ({} unit(s), {} written, {} removed): {} error(s), {} warning(s)",
                        report.container,
                        report.directly_dirty.len() + report.transitively_dirty.len(),
                        report.written.len(),
                        report.removed.len(),
                        report.errors,
                        report.warnings
                    );
                }
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
    }

    if outcomes.iter().all(|o| o.report.is_error_free()) {
        Ok(0)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Builds the selected containers in configuration order.
///
/// A container listed as affected by a later build is rebuilt once more so
/// that references into containers built after it resolve.
pub fn build_all(
    session: &Session,
    args: &BuildArgs,
    global: &GlobalArgs,
) -> Result<Vec<ContainerOutcome>, Box<dyn Error>> {
    let names = session.container_names(args.container.as_deref())?;
    let selected: BTreeSet<String> = names.iter().cloned().collect();
    let mut queue: VecDeque<String> = names.iter().cloned().collect();
    let mut rebuilt = BTreeSet::new();
    let mut outcomes: BTreeMap<String, ContainerOutcome> = BTreeMap::new();

    while let Some(name) = queue.pop_front() {
        let first_time = !outcomes.contains_key(&name);
        let (dirty, deleted) = if first_time {
            (args.dirty.as_slice(), args.deleted.as_slice())
        } else {
            (&[][..], &[][..])
        };
        let request = session.request(&name, dirty, deleted)?;

        if !global.quiet && args.format == ReportFormat::Text {
            eprintln!("   Building {name}");
        }
        let memory = MemorySink::new();
        let rendering = RenderingSink::new(global.color);
        let sink: &dyn ReportSink = match args.format {
            ReportFormat::Text => &rendering,
            ReportFormat::Json => &memory,
        };
        let report = session.context.run(&request, sink)?;

        for affected in &report.affected_containers {
            let affected = affected.as_str();
            if selected.contains(affected)
                && outcomes.contains_key(affected)
                && !queue.iter().any(|q| q == affected)
                && rebuilt.insert(affected.to_string())
            {
                tracing::info!(container = %name, affected, "rebuilding affected container");
                queue.push_back(affected.to_string());
            }
        }
        outcomes.insert(
            name,
            ContainerOutcome {
                report,
                diagnostics: memory.take_all(),
            },
        );
    }

    Ok(names
        .iter()
        .filter_map(|name| outcomes.remove(name))
        .collect())
}
