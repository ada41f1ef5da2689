//! Error types for parsing and conversion.
//!
//! [`ParseError`] is produced while building a [`SyntaxTree`](crate::SyntaxTree)
//! and carries source spans for diagnostic formatting. [`EngineError`] is
//! produced when a conversion is aborted, either through cancellation or a
//! configured resource limit.
//!
//! A chain that simply cannot be converted is not an error; see
//! [`Conversion::NotApplicable`](crate::Conversion::NotApplicable).

use crate::ast::span::Span;
use thiserror::Error;

// ── Parse errors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Format the error with source context for display
    pub fn format_with_source(&self, source: &str, origin: Option<&str>) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        let source_line = source.lines().nth(line.saturating_sub(1)).unwrap_or("");

        let location = match origin {
            Some(name) => format!(" --> {name}:{line}:{col}"),
            None => format!(" --> {line}:{col}"),
        };

        let pointer = " ".repeat(col.saturating_sub(1)) + &"^".repeat(self.span.len().max(1));

        let mut output = format!(
            "Error: {}\n{location}\n  |\n{line:>3} | {source_line}\n    | {pointer}",
            self.message
        );

        if let Some(hint) = &self.hint {
            output.push_str(&format!("\n  = hint: {hint}"));
        }

        output
    }
}

fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

// ── Engine errors ───────────────────────────────────────────────────────

/// A conversion that was stopped before it produced a result.
///
/// The input tree is never modified, so an aborted conversion leaves
/// nothing to roll back.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub span: Option<Span>,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            span: None,
            message: message.into(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn cancelled(stage: &str) -> Self {
        Self::new(
            EngineErrorKind::Cancelled,
            format!("conversion cancelled during {stage}"),
        )
    }

    pub fn too_many_leaves(max: u64) -> Self {
        Self::new(
            EngineErrorKind::ResourceLimit,
            format!("concatenation chain exceeds the limit of {max} operands"),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// The conversion was cancelled via an external cancellation token.
    Cancelled,
    /// The chain exceeded a configured resource limit.
    ResourceLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_source_points_at_span() {
        let source = "\"a\" +\n  @@";
        let err = ParseError::new(Span::new(8, 10), "unexpected token").with_hint("remove it");
        let text = err.format_with_source(source, Some("input"));
        assert!(text.contains(" --> input:2:3"));
        assert!(text.contains("  2 |   @@"));
        assert!(text.contains("    |   ^^"));
        assert!(text.ends_with("= hint: remove it"));
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::too_many_leaves(8);
        assert_eq!(err.kind, EngineErrorKind::ResourceLimit);
        assert_eq!(
            err.to_string(),
            "concatenation chain exceeds the limit of 8 operands"
        );
    }
}
