//! Herald query language
//!
//! Lexer, AST and recursive-descent parser for the GraphQL-style operation
//! language used by Herald subscriptions.
//!
//! # Syntax
//!
//! ```text
//! subscription DisturbancesInTheForce($reason: String) {
//!   disturbance(reason: $reason) {
//!     magnitude
//!     reason
//!   }
//! }
//!
//! query { hero { name } }
//! { hero { name } }
//! ```
//!
//! Commas and `#` comments are insignificant. Fragments and directives are not
//! part of the language.
//!
//! # Usage
//!
//! ```rust
//! use herald_lang::{parse, OperationKind};
//!
//! let doc = parse("subscription { disturbance { magnitude } }").unwrap();
//! assert_eq!(doc.definitions[0].kind, OperationKind::Subscription);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{
    Argument, Document, Field, InputValue, OperationDefinition, OperationKind, Selection,
    SelectionSet, TypeAnnotation, VariableDefinition,
};
pub use error::ParseError;
pub use span::{Location, Span, Spanned};

/// Parse a query text into a [`Document`].
pub fn parse(source: &str) -> Result<Document, ParseError> {
    parser::parse(source)
}

/// Tokenize a query text (for debugging/testing).
pub fn tokenize(source: &str) -> Result<Vec<lexer::SpannedToken>, ParseError> {
    lexer::tokenize(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reports_location() {
        let source = "subscription {\n  disturbance {\n    magnitude\n  }\n";
        let err = parse(source).unwrap_err();
        assert_eq!(err.message, "Expected Name, found <EOF>");
        let location = err.location(source);
        assert_eq!(location.line, 5);
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("{ a }").unwrap();
        assert_eq!(tokens.len(), 3);
    }
}
