pub mod diagnostics;
pub mod warnings;

pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticNote, DiagnosticSink, Severity, SrcSpan};
pub use warnings::{WarningConfig, WarningKind};
