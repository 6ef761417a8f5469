//! Structured, non-fatal findings surfaced alongside pipeline results.

use serde::{Deserialize, Serialize};

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticKind {
    /// A logical key had no mapping in any scope and was used verbatim.
    UnmappedKey,
    /// A sequence field fell back to the only timeseries column available.
    SequenceFallback,
    /// Only some rows of a sequence column reference existing sequence columns.
    PartialSequenceMatch,
    /// The structure declares several bus groups and none is `default`.
    AmbiguousBusStructure,
    /// Several investment-related columns were present during imputation.
    MultipleInvestmentColumns,
    /// `lifetime` varied across periods; the first period's value was kept.
    LifetimeVariance,
    /// Several rows of one identity shared a year and were merged.
    DuplicateYear,
    /// A derived field was nulled in lenient calculation mode.
    CalculationNulled,
    /// A component name collided and was disambiguated.
    NameCollision,
    /// A process failed and its output was skipped.
    ProcessSkipped,
}

/// Severity of a diagnostic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational; expected in normal runs.
    Debug,
    /// Data-quality warning.
    Warning,
}

impl DiagnosticKind {
    /// Severity associated with this kind.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::UnmappedKey => Severity::Debug,
            _ => Severity::Warning,
        }
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// Process the diagnostic belongs to, if any.
    pub process: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

/// Append-only sink of diagnostics, optionally bound to a process.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    process: Option<String>,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Sink not bound to any process.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose entries are tagged with `process`.
    pub fn for_process(process: impl Into<String>) -> Self {
        Self {
            process: Some(process.into()),
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic, mirroring it as a tracing event when enabled.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        #[cfg(feature = "tracing")]
        {
            let process = self.process.as_deref().unwrap_or("-");
            match kind.severity() {
                Severity::Debug => {
                    tracing::debug!(?kind, process, "{message}");
                }
                Severity::Warning => {
                    tracing::warn!(?kind, process, "{message}");
                }
            }
        }
        self.entries.push(Diagnostic {
            kind,
            process: self.process.clone(),
            message,
        });
    }

    /// Move all entries of `other` into this sink, keeping their process tags.
    pub fn absorb(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Iterate over recorded diagnostics.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics of a given kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the sink.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
