//! Diagnostics collector.
//!
//! Each run owns one `Diagnostics` value; pattern registration, the
//! tokenizer and the declaration tracker append to it and never abort.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{PatternSyntaxError, SemanticError};

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum DiagnosticKind {
    /// A token pattern failed to compile.
    Pattern,
    /// No registered pattern matched at some offset.
    Lexical,
    /// The symbol table rejected a declaration, reference or value.
    Semantic,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Pattern => "Pattern Error",
            DiagnosticKind::Lexical => "Lexical Error",
            DiagnosticKind::Semantic => "Semantic Error",
        })
    }
}

/// One reported problem with its 1-based source position.
///
/// Pattern diagnostics have no source position: they use line 0 and the
/// 1-based byte column inside the offending pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

/// Ordered list of diagnostics accumulated during one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, line: usize, column: usize, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            kind,
            line,
            column,
            message: message.into(),
        });
    }

    pub fn pattern(&mut self, error: &PatternSyntaxError) {
        self.report(DiagnosticKind::Pattern, 0, error.position + 1, error.to_string());
    }

    pub fn lexical(&mut self, line: usize, column: usize, message: impl Into<String>) {
        self.report(DiagnosticKind::Lexical, line, column, message);
    }

    pub fn semantic(&mut self, line: usize, column: usize, error: &SemanticError) {
        self.report(DiagnosticKind::Semantic, line, column, error.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Append every diagnostic of `other`, keeping its order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Copy ordered by line then column; report order breaks ties.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|d| (d.line, d.column));
        sorted
    }

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
