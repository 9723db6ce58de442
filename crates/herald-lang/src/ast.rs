//! Abstract syntax tree for query documents.

use std::fmt;
use std::sync::Arc;

use crate::span::{Location, Span, Spanned};

/// A parsed query document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub definitions: Vec<OperationDefinition>,
    pub span: Span,
    /// The text this document was parsed from.
    pub source: Arc<str>,
}

impl Document {
    /// Resolve a span of this document to a line/column location.
    pub fn location(&self, span: Span) -> Location {
        span.location(&self.source)
    }

    /// Iterate over the operations in source order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter()
    }

    /// Find an operation by name.
    pub fn operation(&self, name: &str) -> Option<&OperationDefinition> {
        self.definitions
            .iter()
            .find(|op| op.name.as_ref().is_some_and(|n| n.value == name))
    }
}

/// The three operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `subscription Name($var: Type = default) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    /// `None` for anonymous operations and the `{ ... }` shorthand.
    pub name: Option<Spanned<String>>,
    pub variables: Vec<VariableDefinition>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

impl OperationDefinition {
    /// Operation name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|n| n.value.as_str())
    }
}

/// A variable declared in an operation header.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// Name without the leading `$`.
    pub name: Spanned<String>,
    pub var_type: Spanned<TypeAnnotation>,
    pub default_value: Option<Spanned<InputValue>>,
    pub span: Span,
}

/// A type written in the query text, e.g. `[String!]!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    Named(String),
    List(Box<TypeAnnotation>),
    NonNull(Box<TypeAnnotation>),
}

impl TypeAnnotation {
    /// The innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            TypeAnnotation::Named(name) => name,
            TypeAnnotation::List(inner) | TypeAnnotation::NonNull(inner) => inner.base_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeAnnotation::NonNull(_))
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnotation::Named(name) => f.write_str(name),
            TypeAnnotation::List(inner) => write!(f, "[{}]", inner),
            TypeAnnotation::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// `{ a b { c } }`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
    pub span: Span,
}

/// One entry in a selection set.
///
/// Fragments are not part of the language, so every selection is a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
}

impl Selection {
    pub fn span(&self) -> Span {
        match self {
            Selection::Field(field) => field.span,
        }
    }

    pub fn as_field(&self) -> &Field {
        match self {
            Selection::Field(field) => field,
        }
    }
}

/// `alias: name(arg: value) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<Spanned<String>>,
    pub name: Spanned<String>,
    pub arguments: Vec<Argument>,
    pub selection_set: Option<SelectionSet>,
    pub span: Span,
}

impl Field {
    /// The key this field occupies in the response object.
    pub fn response_key(&self) -> &str {
        self.alias
            .as_ref()
            .map(|a| a.value.as_str())
            .unwrap_or(self.name.value.as_str())
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name.value == name)
    }
}

/// `name: value`
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Spanned<String>,
    pub value: Spanned<InputValue>,
}

/// A literal or variable reference in argument/default position.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// `$name`, stored without the `$`.
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    /// A bare name that is not `true`, `false` or `null`.
    Enum(String),
    List(Vec<Spanned<InputValue>>),
    Object(Vec<(Spanned<String>, Spanned<InputValue>)>),
}

impl InputValue {
    /// Collect the names of every variable referenced by this value.
    pub fn variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            InputValue::Variable(name) => out.push(name),
            InputValue::List(items) => items.iter().for_each(|i| i.value.variables(out)),
            InputValue::Object(fields) => fields.iter().for_each(|(_, v)| v.value.variables(out)),
            _ => {}
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Variable(name) => write!(f, "${}", name),
            InputValue::Int(i) => write!(f, "{}", i),
            InputValue::Float(x) => write!(f, "{:?}", x),
            InputValue::String(s) => write!(f, "{:?}", s),
            InputValue::Boolean(b) => write!(f, "{}", b),
            InputValue::Null => f.write_str("null"),
            InputValue::Enum(name) => f.write_str(name),
            InputValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item.value)?;
                }
                f.write_str("]")
            }
            InputValue::Object(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name.value, value.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn first_argument(source: &str) -> InputValue {
        let doc = parse(source).unwrap();
        let field = doc.definitions[0].selection_set.selections[0].as_field();
        field.arguments[0].value.value.clone()
    }

    #[test]
    fn test_input_value_display() {
        assert_eq!(first_argument("{ f(a: 5) }").to_string(), "5");
        assert_eq!(first_argument("{ f(a: \"x\") }").to_string(), "\"x\"");
        assert_eq!(
            first_argument("{ f(a: [1, $v, {k: null}]) }").to_string(),
            "[1, $v, {k: null}]"
        );
    }

    #[test]
    fn test_response_key_prefers_alias() {
        let doc = parse("{ calm: disturbance }").unwrap();
        let field = doc.definitions[0].selection_set.selections[0].as_field();
        assert_eq!(field.response_key(), "calm");
        assert_eq!(field.name.value, "disturbance");
    }
}
