//! Structured diagnostic records.
//!
//! The evaluation core never renders diagnostics; it pushes structured
//! records into a [`DiagnosticSink`] provided by the front-end. An error
//! aborts the current top-level evaluation, warnings accumulate.

use tracing::debug;

use crate::warnings::WarningKind;

/// An opaque source range, expressed in token positions.
///
/// The core only threads these through to diagnostics; converting them to
/// (file, line, column) is the harness's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SrcSpan {
    pub file: u32,
    pub begin: u32,
    pub pivot: u32,
    pub end: u32,
}

impl SrcSpan {
    pub const fn new(file: u32, begin: u32, pivot: u32, end: u32) -> Self {
        SrcSpan {
            file,
            begin,
            pivot,
            end,
        }
    }

    /// A span for compiler-generated code with no source counterpart.
    pub const fn synthetic() -> Self {
        SrcSpan {
            file: u32::MAX,
            begin: 0,
            pivot: 0,
            end: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticNote {
    pub span: SrcSpan,
    pub message: String,
}

/// A single reported condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The warning family this diagnostic belongs to; `None` for hard errors.
    pub kind: Option<WarningKind>,
    pub span: SrcSpan,
    pub message: String,
    pub notes: Vec<DiagnosticNote>,
}

impl Diagnostic {
    pub fn error(span: SrcSpan, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind: None,
            span,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn warning(kind: WarningKind, span: SrcSpan, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            kind: Some(kind),
            span,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_note(mut self, span: SrcSpan, message: impl Into<String>) -> Self {
        self.notes.push(DiagnosticNote {
            span,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Where the core delivers its diagnostics. Provided by the front-end.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A sink that stores everything, used by the harness and by tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        CollectingSink::default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        debug!(?diagnostic.severity, %diagnostic.message, "diagnostic reported");
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_collects_and_classifies() {
        let mut sink = CollectingSink::new();
        sink.report(Diagnostic::warning(
            WarningKind::IntOverflow,
            SrcSpan::synthetic(),
            "integer overflow",
        ));
        assert!(!sink.has_errors());

        sink.report(Diagnostic::error(SrcSpan::synthetic(), "division by zero"));
        assert!(sink.has_errors());
        assert_eq!(sink.errors().count(), 1);
        assert_eq!(sink.warnings().count(), 1);
    }

    #[test]
    fn notes_attach() {
        let diag = Diagnostic::error(SrcSpan::synthetic(), "bad free")
            .with_note(SrcSpan::synthetic(), "allocated here");
        assert_eq!(diag.notes.len(), 1);
    }
}
