//! Per-call diagnostic sinks
//!
//! Analyzers report what they did through a sink handed in by the caller instead
//! of a process-wide logger, so concurrent analyses of different PRs never share
//! state.

use tracing::debug;

/// A note emitted while analysing one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Receives diagnostics for the duration of one analysis call
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics so they can be returned alongside results
impl DiagnosticSink for Vec<Diagnostic> {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, diagnostic: Diagnostic) {
        debug!(stage = diagnostic.stage, "{}", diagnostic.message);
    }
}
