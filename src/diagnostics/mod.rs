//! Diagnostics for the translation pass
//!
//! Recoverable problems (bad values, unknown kinds, out-of-context
//! elements) are recorded here and the conversion keeps going. The
//! reporter also mirrors every record through the `log` crate so a host
//! application sees them as they happen.

use serde::{Deserialize, Serialize};

use crate::errors::ConversionError;

/// Severity level for a diagnostic record
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// A single problem found at a location in the input document
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Diagnostic {
    /// 1-based line in the input document
    pub line: usize,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Human-readable message
    pub message: String,
}

/// Collection of diagnostic records for an entire conversion
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Diagnostics {
    /// All records, in the order they were reported
    pub records: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create empty diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record
    pub fn add(&mut self, record: Diagnostic) {
        self.records.push(record);
    }

    /// Number of records with the given severity
    pub fn count(&self, severity: DiagnosticSeverity) -> usize {
        self.records.iter().filter(|r| r.severity == severity).count()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.severity == DiagnosticSeverity::Error)
    }

    /// Check if there are any records at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sink the converter reports into.
///
/// Owned by the converter instance; never global. Internal errors are
/// recorded *and* returned as a fatal [`ConversionError`] so callers
/// cannot miss them.
#[derive(Clone, Debug)]
pub struct Reporter {
    source_name: String,
    diagnostics: Diagnostics,
}

impl Reporter {
    /// Create a reporter labelling records with the given source name
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The source name used to label records
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Record a recoverable error
    pub fn error(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}:{}: {}", self.source_name, line, message);
        self.diagnostics.add(Diagnostic {
            line,
            severity: DiagnosticSeverity::Error,
            message,
        });
    }

    /// Record a warning
    pub fn warning(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}:{}: {}", self.source_name, line, message);
        self.diagnostics.add(Diagnostic {
            line,
            severity: DiagnosticSeverity::Warning,
            message,
        });
    }

    /// Record an informational note (used by trace mode)
    pub fn info(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}:{}: {}", self.source_name, line, message);
        self.diagnostics.add(Diagnostic {
            line,
            severity: DiagnosticSeverity::Info,
            message,
        });
    }

    /// Record an internal inconsistency and build the fatal error for it.
    ///
    /// Call sites `return Err(reporter.internal(..))` so the failure both
    /// shows up in the diagnostics and aborts the conversion.
    #[must_use]
    pub fn internal(&mut self, line: usize, message: impl Into<String>) -> ConversionError {
        let message = message.into();
        log::error!(
            "{}:{}: internal translation error: {}",
            self.source_name,
            line,
            message
        );
        self.diagnostics.add(Diagnostic {
            line,
            severity: DiagnosticSeverity::Error,
            message: format!("internal translation error: {message}"),
        });
        ConversionError::Internal {
            source_name: self.source_name.clone(),
            line,
            message,
        }
    }

    /// Consume the reporter, yielding everything it collected
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Borrow the records collected so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_collects_in_order() {
        let mut reporter = Reporter::new("test.xml");
        reporter.warning(3, "first");
        reporter.error(7, "second");

        let diags = reporter.into_diagnostics();
        assert_eq!(diags.records.len(), 2);
        assert_eq!(diags.records[0].line, 3);
        assert_eq!(diags.records[0].severity, DiagnosticSeverity::Warning);
        assert_eq!(diags.records[1].message, "second");
    }

    #[test]
    fn test_has_errors() {
        let mut reporter = Reporter::new("test.xml");
        assert!(!reporter.diagnostics().has_errors());

        reporter.warning(1, "just a warning");
        assert!(!reporter.diagnostics().has_errors());

        reporter.error(2, "a real error");
        assert!(reporter.diagnostics().has_errors());
    }

    #[test]
    fn test_internal_is_both_recorded_and_fatal() {
        let mut reporter = Reporter::new("score.xml");
        let err = reporter.internal(42, "last element was not the expected note");

        match err {
            ConversionError::Internal { line, .. } => assert_eq!(line, 42),
            other => panic!("unexpected error: {other}"),
        }
        assert!(reporter.diagnostics().has_errors());
        assert_eq!(reporter.diagnostics().count(DiagnosticSeverity::Error), 1);
    }
}
