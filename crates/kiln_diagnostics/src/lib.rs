//! Validation issues, report sinks, and the per-build validation collector.
//!
//! Parsers, validators and the engine itself describe problems as
//! [`Diagnostic`]s. During a build every issue is [`record`](ValidationCollector::record)ed
//! into a [`ValidationCollector`], which forwards it to an external
//! [`ReportSink`] in detection order and decides whether the build was error free.

#![warn(missing_docs)]

pub mod code;
pub mod collector;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use collector::ValidationCollector;
pub use diagnostic::{Diagnostic, Location};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::{MemorySink, NullSink, ReportSink, TracingSink};
