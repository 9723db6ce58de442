//! Subscription error types.

use std::fmt;

use herald_core::ValidationError;
use herald_lang::ParseError;
use thiserror::Error;

/// Every validation failure of a subscription document.
///
/// Displays as the first message; the full list stays available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(first) => f.write_str(&first.message),
            None => f.write_str("validation failed"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Subscription errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The query text does not parse.
    #[error("{error}")]
    Syntax {
        error: ParseError,
        /// The error rendered against the query text.
        diagnostic: String,
    },

    /// The document is invalid for the schema.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The schema declares no subscription root type.
    #[error("No Subscription types found in schema")]
    NoSubscriptionType,

    /// The root selection names no field of the subscription type.
    #[error("Cannot subscribe to \"{field}\": no such field on type \"{type_name}\"")]
    UnknownTopicField { field: String, type_name: String },
}

impl Error {
    pub(crate) fn syntax(error: ParseError, source_name: &str, source: &str) -> Self {
        let diagnostic = error.format_with_source(source_name, source);
        Error::Syntax { error, diagnostic }
    }

    /// Validation failures, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Error::Validation(errors) => Some(&errors.0),
            _ => None,
        }
    }
}
