//! Recursive descent parser for query documents.

use std::sync::Arc;

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::span::{Span, Spanned};

/// Parser over a single query text.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    source: &'source str,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
            source,
        }
    }

    /// Parse a complete document; at least one definition is required.
    pub fn parse_document(&mut self) -> Result<Document, ParseError> {
        let mut definitions = vec![self.parse_definition()?];

        while self.lexer.peek().is_some() {
            definitions.push(self.parse_definition()?);
        }
        if let Some(err) = self.lexer.take_error() {
            return Err(err);
        }

        let span = definitions
            .iter()
            .map(|d| d.span)
            .reduce(Span::merge)
            .unwrap_or_default();

        Ok(Document {
            definitions,
            span,
            source: Arc::from(self.source),
        })
    }

    fn parse_definition(&mut self) -> Result<OperationDefinition, ParseError> {
        if self.peek_is(&Token::LBrace) {
            let selection_set = self.parse_selection_set()?;
            return Ok(OperationDefinition {
                kind: OperationKind::Query,
                name: None,
                variables: Vec::new(),
                span: selection_set.span,
                selection_set,
            });
        }

        let keyword = self.expect_name()?;
        let kind = match keyword.value.as_str() {
            "query" => OperationKind::Query,
            "mutation" => OperationKind::Mutation,
            "subscription" => OperationKind::Subscription,
            "fragment" => {
                return Err(ParseError::new("Unexpected Name \"fragment\"", keyword.span)
                    .with_hint("fragment definitions are not supported; inline the fields"))
            }
            other => {
                return Err(ParseError::new(
                    format!("Unexpected Name \"{}\"", other),
                    keyword.span,
                )
                .with_hint("a definition starts with query, mutation, subscription or \"{\""))
            }
        };

        let name = if self.peek_name().is_some() {
            Some(self.expect_name()?)
        } else {
            None
        };

        let variables = if self.peek_is(&Token::LParen) {
            self.parse_variable_definitions()?
        } else {
            Vec::new()
        };

        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            kind,
            name,
            variables,
            span: keyword.span.merge(selection_set.span),
            selection_set,
        })
    }

    fn parse_variable_definitions(&mut self) -> Result<Vec<VariableDefinition>, ParseError> {
        self.expect_token(Token::LParen)?;
        let mut definitions = vec![self.parse_variable_definition()?];
        while !self.peek_is(&Token::RParen) {
            definitions.push(self.parse_variable_definition()?);
        }
        self.expect_token(Token::RParen)?;
        Ok(definitions)
    }

    fn parse_variable_definition(&mut self) -> Result<VariableDefinition, ParseError> {
        let dollar = self.expect_token(Token::Dollar)?;
        let name = self.expect_name()?;
        self.expect_token(Token::Colon)?;
        let var_type = self.parse_type()?;

        let default_value = if self.peek_is(&Token::Equals) {
            self.next_token()?;
            Some(self.parse_value(true)?)
        } else {
            None
        };

        let end = default_value
            .as_ref()
            .map(|d| d.span)
            .unwrap_or(var_type.span);

        Ok(VariableDefinition {
            name,
            var_type,
            default_value,
            span: dollar.span.merge(end),
        })
    }

    fn parse_type(&mut self) -> Result<Spanned<TypeAnnotation>, ParseError> {
        let base = if self.peek_is(&Token::LBracket) {
            let open = self.next_token()?;
            let inner = self.parse_type()?;
            let close = self.expect_token(Token::RBracket)?;
            Spanned::new(
                TypeAnnotation::List(Box::new(inner.value)),
                open.span.merge(close.span),
            )
        } else {
            self.expect_name()?.map(TypeAnnotation::Named)
        };

        if self.peek_is(&Token::Bang) {
            let bang = self.next_token()?;
            Ok(Spanned::new(
                TypeAnnotation::NonNull(Box::new(base.value)),
                base.span.merge(bang.span),
            ))
        } else {
            Ok(base)
        }
    }

    fn parse_selection_set(&mut self) -> Result<SelectionSet, ParseError> {
        let open = self.expect_token(Token::LBrace)?;
        let mut selections = vec![self.parse_selection()?];
        while !self.peek_is(&Token::RBrace) {
            selections.push(self.parse_selection()?);
        }
        let close = self.expect_token(Token::RBrace)?;

        Ok(SelectionSet {
            selections,
            span: open.span.merge(close.span),
        })
    }

    fn parse_selection(&mut self) -> Result<Selection, ParseError> {
        if self.peek_is(&Token::Spread) {
            let spread = self.next_token()?;
            return Err(ParseError::new("Unexpected \"...\"", spread.span)
                .with_hint("fragment spreads are not supported"));
        }
        Ok(Selection::Field(self.parse_field()?))
    }

    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let first = self.expect_name()?;

        let (alias, name) = if self.peek_is(&Token::Colon) {
            self.next_token()?;
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };

        let arguments = if self.peek_is(&Token::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        let selection_set = if self.peek_is(&Token::LBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        let start = alias.as_ref().map(|a| a.span).unwrap_or(name.span);
        let end = selection_set
            .as_ref()
            .map(|s| s.span)
            .or_else(|| arguments.last().map(|a| a.value.span))
            .unwrap_or(name.span);

        Ok(Field {
            alias,
            name,
            arguments,
            selection_set,
            span: start.merge(end),
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        self.expect_token(Token::LParen)?;
        let mut arguments = vec![self.parse_argument()?];
        while !self.peek_is(&Token::RParen) {
            arguments.push(self.parse_argument()?);
        }
        self.expect_token(Token::RParen)?;
        Ok(arguments)
    }

    fn parse_argument(&mut self) -> Result<Argument, ParseError> {
        let name = self.expect_name()?;
        self.expect_token(Token::Colon)?;
        let value = self.parse_value(false)?;
        Ok(Argument { name, value })
    }

    /// Parse a value; `constant` forbids variable references (defaults).
    fn parse_value(&mut self, constant: bool) -> Result<Spanned<InputValue>, ParseError> {
        let tok = self.next_token()?;
        let value = match tok.token {
            Token::Dollar => {
                let name = self.expect_name()?;
                if constant {
                    return Err(ParseError::new(
                        format!("Unexpected variable \"${}\" in constant value", name.value),
                        tok.span.merge(name.span),
                    ));
                }
                return Ok(Spanned::new(
                    InputValue::Variable(name.value),
                    tok.span.merge(name.span),
                ));
            }
            Token::Int(i) => InputValue::Int(i),
            Token::Float(f) => InputValue::Float(f),
            Token::String(s) => InputValue::String(s),
            Token::Name(name) => match name.as_str() {
                "true" => InputValue::Boolean(true),
                "false" => InputValue::Boolean(false),
                "null" => InputValue::Null,
                _ => InputValue::Enum(name),
            },
            Token::LBracket => {
                let mut items = Vec::new();
                while !self.peek_is(&Token::RBracket) {
                    items.push(self.parse_value(constant)?);
                }
                let close = self.expect_token(Token::RBracket)?;
                return Ok(Spanned::new(InputValue::List(items), tok.span.merge(close.span)));
            }
            Token::LBrace => {
                let mut fields = Vec::new();
                while !self.peek_is(&Token::RBrace) {
                    let key = self.expect_name()?;
                    self.expect_token(Token::Colon)?;
                    fields.push((key, self.parse_value(constant)?));
                }
                let close = self.expect_token(Token::RBrace)?;
                return Ok(Spanned::new(InputValue::Object(fields), tok.span.merge(close.span)));
            }
            other => {
                return Err(ParseError::new(
                    format!("Unexpected {}", other.describe()),
                    tok.span,
                ))
            }
        };

        Ok(Spanned::new(value, tok.span))
    }

    fn peek_is(&mut self, expected: &Token) -> bool {
        self.lexer
            .peek()
            .is_some_and(|t| std::mem::discriminant(&t.token) == std::mem::discriminant(expected))
    }

    fn peek_name(&mut self) -> Option<&str> {
        match self.lexer.peek() {
            Some(SpannedToken {
                token: Token::Name(name),
                ..
            }) => Some(name.as_str()),
            _ => None,
        }
    }

    fn expect_name(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token_or("Name")?;
        match tok.token {
            Token::Name(name) => Ok(Spanned::new(name, tok.span)),
            other => Err(ParseError::new(
                format!("Expected Name, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<SpannedToken, ParseError> {
        let description = expected.describe();
        let tok = self.next_token_or(&description)?;
        if std::mem::discriminant(&tok.token) == std::mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError::new(
                format!("Expected {}, found {}", description, tok.token.describe()),
                tok.span,
            ))
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        self.next_token_or("more input")
    }

    /// Next token, or a lexer error / `<EOF>` error naming what was expected.
    fn next_token_or(&mut self, expected: &str) -> Result<SpannedToken, ParseError> {
        if let Some(tok) = self.lexer.next_token() {
            return Ok(tok);
        }
        if let Some(err) = self.lexer.take_error() {
            return Err(err);
        }
        let end = self.source.len();
        Err(ParseError::new(
            format!("Expected {}, found <EOF>", expected),
            Span::new(end, end),
        ))
    }
}

/// Parse a query text into a document.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Parser::new(source).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_shorthand_query() {
        let doc = parse("{ hero { name } }").unwrap();
        assert_eq!(doc.definitions.len(), 1);
        let op = &doc.definitions[0];
        assert_eq!(op.kind, OperationKind::Query);
        assert!(op.name.is_none());
        let hero = op.selection_set.selections[0].as_field();
        assert_eq!(hero.name.value, "hero");
        let inner = hero.selection_set.as_ref().unwrap();
        assert_eq!(inner.selections[0].as_field().name.value, "name");
    }

    #[test]
    fn test_parse_named_subscription() {
        let doc = parse(
            r#"
            subscription DisturbancesInTheForce {
              disturbance {
                magnitude
              }
            }
            "#,
        )
        .unwrap();

        let op = &doc.definitions[0];
        assert_eq!(op.kind, OperationKind::Subscription);
        assert_eq!(op.name(), Some("DisturbancesInTheForce"));
        assert_eq!(op.selection_set.selections.len(), 1);
        assert_eq!(
            op.selection_set.selections[0].as_field().name.value,
            "disturbance"
        );
    }

    #[test]
    fn test_parse_variables_and_arguments() {
        let doc = parse(
            r#"subscription Watch($reason: String = "none", $ids: [ID!]!) {
                disturbance(reason: $reason, ids: $ids, level: HIGH) { magnitude }
            }"#,
        )
        .unwrap();

        let op = &doc.definitions[0];
        assert_eq!(op.variables.len(), 2);
        assert_eq!(op.variables[0].name.value, "reason");
        assert_eq!(
            op.variables[0].var_type.value,
            TypeAnnotation::Named("String".into())
        );
        assert_eq!(
            op.variables[0].default_value.as_ref().map(|d| &d.value),
            Some(&InputValue::String("none".into()))
        );
        assert_eq!(op.variables[1].var_type.value.to_string(), "[ID!]!");

        let field = op.selection_set.selections[0].as_field();
        assert_eq!(field.arguments.len(), 3);
        assert_eq!(
            field.argument("reason").map(|a| &a.value.value),
            Some(&InputValue::Variable("reason".into()))
        );
        assert_eq!(
            field.argument("level").map(|a| &a.value.value),
            Some(&InputValue::Enum("HIGH".into()))
        );
    }

    #[test]
    fn test_parse_alias_and_composite_literals() {
        let doc = parse(r#"{ big: search(filter: { tags: ["a", "b"], min: 2.5, on: true, x: null }) { id } }"#)
            .unwrap();
        let field = doc.definitions[0].selection_set.selections[0].as_field();
        assert_eq!(field.response_key(), "big");
        assert_eq!(field.name.value, "search");

        let InputValue::Object(entries) = &field.arguments[0].value.value else {
            panic!("expected object literal");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.value.as_str()).collect();
        assert_eq!(keys, vec!["tags", "min", "on", "x"]);
        assert_eq!(entries[3].1.value, InputValue::Null);
    }

    #[test]
    fn test_parse_multiple_operations() {
        let doc = parse("query A { a } subscription B { b }").unwrap();
        assert_eq!(doc.definitions.len(), 2);
        assert_eq!(doc.operation("B").map(|op| op.kind), Some(OperationKind::Subscription));
        assert!(doc.operation("C").is_none());
    }

    #[test]
    fn test_empty_selection_set_is_an_error() {
        let err = parse("subscription { }").unwrap_err();
        assert_eq!(err.message, "Expected Name, found \"}\"");
    }

    #[test]
    fn test_unterminated_document() {
        let err = parse("subscription { disturbance {").unwrap_err();
        assert_eq!(err.message, "Expected Name, found <EOF>");
    }

    #[test]
    fn test_empty_document() {
        let err = parse("   ").unwrap_err();
        assert_eq!(err.message, "Expected Name, found <EOF>");
    }

    #[test]
    fn test_variable_in_default_is_rejected() {
        let err = parse("query Q($a: Int = $b) { f }").unwrap_err();
        assert!(err.message.contains("constant value"));
    }

    #[test]
    fn test_fragments_unsupported() {
        let err = parse("{ ...Frag }").unwrap_err();
        assert_eq!(err.hint.as_deref(), Some("fragment spreads are not supported"));
        assert!(parse("fragment F on T { a }").is_err());
    }

    #[test]
    fn test_lexer_error_surfaces() {
        let err = parse("subscription { meow % }").unwrap_err();
        assert_eq!(err.message, "Unexpected character \"%\"");
    }
}
