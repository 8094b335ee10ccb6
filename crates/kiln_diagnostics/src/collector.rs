//! Per-build accumulator deciding whether a build was error free.

use crate::diagnostic::Diagnostic;
use crate::sink::ReportSink;
use kiln_common::SourceUri;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collects the issues recorded during one build.
///
/// Every recorded issue is forwarded to the external [`ReportSink`] and stored
/// under one lock, so the sink and the stored list see the same detection
/// order. The error count is tracked atomically so
/// [`is_error_free`](Self::is_error_free) never locks.
pub struct ValidationCollector<'s> {
    sink: &'s dyn ReportSink,
    issues: Mutex<Vec<(SourceUri, Diagnostic)>>,
    error_count: AtomicUsize,
}

impl<'s> ValidationCollector<'s> {
    /// Creates an empty collector forwarding to `sink`.
    pub fn new(sink: &'s dyn ReportSink) -> Self {
        Self {
            sink,
            issues: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Records one issue found in `unit`.
    pub fn record(&self, unit: &SourceUri, issue: Diagnostic) {
        if issue.is_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let mut issues = self.issues.lock();
        self.sink.report(&issue);
        issues.push((unit.clone(), issue));
    }

    /// Records a batch of issues for `unit`, returning `true` if none was an error.
    pub fn record_all(&self, unit: &SourceUri, issues: impl IntoIterator<Item = Diagnostic>) -> bool {
        let mut batch_error_free = true;
        for issue in issues {
            batch_error_free &= !issue.is_error();
            self.record(unit, issue);
        }
        batch_error_free
    }

    /// Returns `true` iff no error-severity issue was recorded.
    pub fn is_error_free(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns the number of error-severity issues recorded.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Consumes the collector, returning its issues.
    pub fn into_issues(self) -> Vec<(SourceUri, Diagnostic)> {
        self.issues.into_inner()
    }
}
