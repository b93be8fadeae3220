//! Non-fatal findings collected during a discovery pass.

use serde::{Deserialize, Serialize};

/// What kind of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A declared constraint points at a table or column missing from the snapshot.
    MissingReference,
    /// A foreign key whose local and referenced column lists differ in length.
    ColumnCountMismatch,
    /// A graph edge whose endpoint is not a node.
    DanglingEdge,
    /// A multiplicity sample that failed or timed out.
    SamplingFailed,
}

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Record the diagnostic in the log and return it.
    pub(crate) fn logged(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let diagnostic = Self::new(kind, message);
        tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic.message);
        diagnostic
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            DiagnosticKind::MissingReference => "missing reference",
            DiagnosticKind::ColumnCountMismatch => "column count mismatch",
            DiagnosticKind::DanglingEdge => "dangling edge",
            DiagnosticKind::SamplingFailed => "sampling failed",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
