//! Collecting sink for recoverable translation diagnostics.
//!
//! Fatal internal-consistency faults are `Err` values; everything a pass
//! can recover from (an unsupported gate kind, an unknown node kind) is
//! recorded here against the offending node's source location, and the
//! pass keeps going. A run is failed as a whole if the sink holds any
//! error afterwards.

use serde::{Deserialize, Serialize};

use crate::tree::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single report: severity, a stable machine-readable code, a
/// human-readable message, and the offending source location if known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub span: Option<Span>,
}

#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn error_at(
        &mut self,
        span: Option<Span>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.report(Diagnostic {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            span,
        });
    }

    pub fn warning_at(
        &mut self,
        span: Option<Span>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.report(Diagnostic {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            span,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}
