//! Lexer for the query language using logos.

use crate::error::ParseError;
use crate::span::Span;
use logos::Logos;

/// Token types for the query language.
///
/// Keywords such as `subscription` or `true` are ordinary names here; the
/// parser gives them meaning by position, so they stay usable as field names.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n,\u{feff}]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[regex(r"[_A-Za-z][_0-9A-Za-z]*", |lex| lex.slice().to_string())]
    Name(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+(\.[0-9]+([eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[token("$")]
    Dollar,
    #[token("!")]
    Bang,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,
    #[token("...")]
    Spread,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

impl Token {
    /// Human-readable description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("Name \"{name}\""),
            Token::String(s) => format!("String \"{s}\""),
            Token::Int(i) => format!("Int \"{i}\""),
            Token::Float(f) => format!("Float \"{f}\""),
            Token::Dollar => "\"$\"".to_string(),
            Token::Bang => "\"!\"".to_string(),
            Token::Colon => "\":\"".to_string(),
            Token::Equals => "\"=\"".to_string(),
            Token::Spread => "\"...\"".to_string(),
            Token::LParen => "\"(\"".to_string(),
            Token::RParen => "\")\"".to_string(),
            Token::LBrace => "\"{\"".to_string(),
            Token::RBrace => "\"}\"".to_string(),
            Token::LBracket => "\"[\"".to_string(),
            Token::RBracket => "\"]\"".to_string(),
        }
    }
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('/') => result.push('/'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push_str("\\u");
                        result.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Peekable token stream.
///
/// The first unrecognised character stops the stream; the error is kept and
/// handed to the parser through [`Lexer::take_error`].
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<SpannedToken>>,
    error: Option<ParseError>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
            error: None,
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Option<&SpannedToken> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_inner());
        }
        self.peeked.as_ref().and_then(|o| o.as_ref())
    }

    /// Consume the next token.
    pub fn next_token(&mut self) -> Option<SpannedToken> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.next_inner(),
        }
    }

    /// The lexical error that ended the stream, if any.
    pub fn take_error(&mut self) -> Option<ParseError> {
        self.error.take()
    }

    fn next_inner(&mut self) -> Option<SpannedToken> {
        if self.error.is_some() {
            return None;
        }
        match self.inner.next()? {
            Ok(token) => Some(SpannedToken {
                token,
                span: self.inner.span().into(),
            }),
            Err(()) => {
                let span: Span = self.inner.span().into();
                self.error = Some(ParseError::new(
                    format!("Unexpected character \"{}\"", self.inner.slice()),
                    span,
                ));
                None
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a whole source string, failing on the first bad character.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<SpannedToken> = lexer.by_ref().collect();
    match lexer.take_error() {
        Some(err) => Err(err),
        None => Ok(tokens),
    }
}
