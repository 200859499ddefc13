use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LineIndex, LineSpan, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiagnosticId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Lex,
    Syntax,
    UnresolvedReference,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "lex",
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::UnresolvedReference => "unresolved_reference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Malformed literal or comment. The tokenizer records it and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedChar { span }
            | LexError::UnterminatedComment { span } => *span,
        }
    }
}

/// Declaration grammar mismatch, recovered from by skipping input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A relationship target that names nothing declared in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved {relation} target `{target}` on `{source_symbol}`")]
pub struct UnresolvedReferenceWarning {
    pub relation: String,
    pub target: String,
    pub source_symbol: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub line_span: LineSpan,
    pub recoverable: bool,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]: {}",
            self.line_span.start.line,
            self.line_span.start.column,
            self.severity,
            self.kind.as_str(),
            self.message
        )
    }
}

/// Append-only, insertion-ordered diagnostic list shared by every stage.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    lines: LineIndex,
}

impl Diagnostics {
    pub fn new(lines: LineIndex) -> Self {
        Self {
            items: Vec::new(),
            lines,
        }
    }

    fn push(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        message: String,
        span: Span,
    ) -> DiagnosticId {
        let id = DiagnosticId(self.items.len() as u32);
        self.items.push(Diagnostic {
            id,
            kind,
            severity,
            message,
            span,
            line_span: self.lines.line_span(span),
            recoverable: true,
        });
        id
    }

    pub fn lex(&mut self, error: &LexError) -> DiagnosticId {
        self.push(
            DiagnosticKind::Lex,
            Severity::Error,
            error.to_string(),
            error.span(),
        )
    }

    pub fn syntax(&mut self, error: &SyntaxError) -> DiagnosticId {
        self.push(
            DiagnosticKind::Syntax,
            Severity::Error,
            error.to_string(),
            error.span,
        )
    }

    pub fn unresolved(&mut self, warning: &UnresolvedReferenceWarning) -> DiagnosticId {
        self.push(
            DiagnosticKind::UnresolvedReference,
            Severity::Info,
            warning.to_string(),
            warning.span,
        )
    }

    pub fn get(&self, id: DiagnosticId) -> Option<&Diagnostic> {
        self.items.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, LineIndex) {
        (self.items, self.lines)
    }
}
