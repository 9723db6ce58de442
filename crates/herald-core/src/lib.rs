//! Herald Core - schema, validation and execution.
//!
//! This crate turns parsed [`herald_lang::Document`]s into results: a
//! [`Schema`] describes the object types and their resolvers, [`validate`]
//! checks a document against it, and [`execute`] runs one operation with a
//! root value, context and variables.

pub mod error;
pub mod execute;
pub mod schema;
pub mod validate;

pub use error::{ExecutionError, FieldError, SchemaError};
pub use execute::{
    execute, get_operation, ErrorLocation, ExecutionResult, PathSegment, ResponseError,
};
pub use schema::{
    ArgumentDef, ContextValue, FieldDef, NamedType, ObjectType, Resolver, ResolverContext,
    ResolverFuture, ScalarType, Schema, SchemaBuilder, TypeRef,
};
pub use validate::{validate, ValidationError};

/// Re-export the query language.
pub use herald_lang as lang;
