//! Core error types.

use herald_lang::OperationKind;
use thiserror::Error;

/// An invalid schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two types share a name (or a type shadows a built-in scalar).
    #[error("Schema must contain uniquely named types but contains multiple types named \"{0}\".")]
    DuplicateType(String),

    /// A field or argument refers to a type that was never registered.
    #[error("Unknown type \"{type_name}\" referenced by \"{referenced_by}\".")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    /// An argument uses an object type.
    #[error("The type of \"{argument}\" must be an input type but got \"{type_name}\".")]
    NonInputArgument { argument: String, type_name: String },

    #[error("Type \"{type_name}\" defines field \"{field}\" more than once.")]
    DuplicateField { type_name: String, field: String },

    #[error("Type \"{0}\" must define one or more fields.")]
    EmptyObject(String),
}

/// A resolver failure; reported in the result, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Structural misuse of the executor: the request cannot run at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Must provide operation name if query contains multiple operations.")]
    OperationNameRequired,

    #[error("Unknown operation named \"{0}\".")]
    UnknownOperation(String),

    #[error("Schema is not configured to execute {0} operation.")]
    RootTypeMissing(OperationKind),
}
