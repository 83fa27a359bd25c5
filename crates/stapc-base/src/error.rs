//! Diagnostic kinds shared across the lexer, parser, and elaboration passes.
//!
//! Errors are values, never exceptions: every pass accumulates [`Diagnostic`]s
//! into the session's error stream and returns an error count. See
//! `stapc_compile::driver` for how passes are sequenced around that count.

use crate::span::SourceLoc;
use std::fmt;

/// What kind of problem a [`Diagnostic`] reports.
///
/// Mirrors the seven diagnostic kinds named in the translator's error model:
/// lexical, syntactic, name-resolution, probe-point matching, and the two
/// flavors of type error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    LexError,
    ParseError,
    ResolveError,
    MatchError,
    TypeMismatch,
    UnresolvedType,
    BuilderError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::LexError => "lex error",
            DiagnosticKind::ParseError => "parse error",
            DiagnosticKind::ResolveError => "resolve error",
            DiagnosticKind::MatchError => "match error",
            DiagnosticKind::TypeMismatch => "type mismatch",
            DiagnosticKind::UnresolvedType => "unresolved type",
            DiagnosticKind::BuilderError => "builder error",
        };
        write!(f, "{s}")
    }
}

/// A single diagnostic. [`Diagnostic::display`] renders it to the
/// `file:line:col: message` convention the driver prints to stderr; a
/// `Diagnostic` on its own has no file name (only a [`crate::FileId`] index),
/// so that name must be resolved by whoever owns the file table (the
/// session) and passed in at print time.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub loc: SourceLoc,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, loc: SourceLoc, message: impl Into<String>) -> Self {
        Self { kind, loc, message: message.into() }
    }

    /// Renders as `{file}:{line}:{col}: {message}`, given the display name
    /// of the file `self.loc` points into.
    pub fn display(&self, file_name: &str) -> String {
        format!("{file_name}:{}:{}: {}", self.loc.line, self.loc.column, self.message)
    }
}

/// An append-only log of diagnostics plus a running error count.
///
/// Shared by every pass: a pass runs to completion before returning so the
/// user sees every error from one pass at once, rather than bailing on the
/// first one.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, loc: SourceLoc, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(kind, loc, message));
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics of a given kind only; used by listing mode to suppress
    /// `MatchError`s when the user just asked "what's available".
    pub fn retain(&mut self, mut keep: impl FnMut(&Diagnostic) -> bool) {
        self.diagnostics.retain(|d| keep(d));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    #[test]
    fn report_increments_error_count() {
        let mut sink = DiagnosticSink::new();
        assert_eq!(sink.error_count(), 0);
        sink.report(DiagnosticKind::ParseError, SourceLoc::new(FileId(0), 1, 1), "unexpected token");
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn display_format_is_file_colon_line_colon_column_colon_message() {
        let d = Diagnostic::new(DiagnosticKind::MatchError, SourceLoc::new(FileId(0), 4, 2), "no provider");
        assert_eq!(d.display("t.stp"), "t.stp:4:2: no provider");
    }

    #[test]
    fn retain_filters_by_predicate() {
        let mut sink = DiagnosticSink::new();
        sink.report(DiagnosticKind::MatchError, SourceLoc::new(FileId(0), 1, 1), "a");
        sink.report(DiagnosticKind::ParseError, SourceLoc::new(FileId(0), 2, 1), "b");
        sink.retain(|d| d.kind != DiagnosticKind::MatchError);
        assert_eq!(sink.error_count(), 1);
    }
}
