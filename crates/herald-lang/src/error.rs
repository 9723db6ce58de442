//! Syntax errors.

use crate::span::{offset_to_line_col, Location, Span};
use thiserror::Error;

/// A query text that does not parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Syntax Error: {message}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Source span where the error occurred.
    pub span: Span,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Where in `source` the error starts.
    pub fn location(&self, source: &str) -> Location {
        self.span.location(source)
    }

    /// Render the error with a caret under the offending source.
    ///
    /// `source_name` labels the input (for example `GraphQL request`).
    pub fn format_with_source(&self, source_name: &str, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        let mut result = format!("Syntax Error: {}\n", self.message);
        result.push_str(&format!("  --> {} ({}:{})\n", source_name, line, col));

        if let Some(source_line) = source.lines().nth(line - 1) {
            result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
            for _ in 0..col {
                result.push(' ');
            }
            result.push('^');

            let remaining = source_line.chars().count().saturating_sub(col - 1);
            let underline = self.span.len().min(remaining);
            for _ in 1..underline {
                result.push('~');
            }
            result.push('\n');
        }

        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ParseError::new("Expected Name, found \"}\"", Span::new(3, 4));
        assert_eq!(err.to_string(), "Syntax Error: Expected Name, found \"}\"");
    }

    #[test]
    fn test_format_with_source() {
        let source = "subscription {\n  disturbance(\n}";
        let err = ParseError::new("Expected Name, found \"}\"", Span::new(30, 31))
            .with_hint("close the argument list with \")\"");

        let formatted = err.format_with_source("GraphQL request", source);
        assert!(formatted.contains("GraphQL request (3:1)"));
        assert!(formatted.contains("  3| }"));
        assert!(formatted.contains("hint: close the argument list"));
    }
}
