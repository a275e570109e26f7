//! Advisory diagnostics collected while parsing policies.
//!
//! Parsing is fault-tolerant: a token that does not parse is dropped and the
//! remaining tokens still take effect, which only ever narrows what the
//! policy allows. The dropped token is recorded here so the embedder can
//! surface it (developer console, telemetry). Diagnostics never change
//! matching results.

use serde::{Deserialize, Serialize};

/// How serious a parse diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    /// Informational: the policy is well-formed but worth a second look.
    Info,
    /// A token was ignored; the policy is narrower than the author wrote.
    Warning,
}

/// One advisory message produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
        }
    }

    pub(crate) fn info(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            message: message.into(),
        }
    }
}

/// Collects diagnostics during a parse and mirrors them to the `log` facade.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Warning => log::warn!("CSP: {}", diagnostic.message),
            DiagnosticSeverity::Info => log::debug!("CSP: {}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
