//! Executable schema: object types, fields with resolvers, and built-in scalars.

mod builder;
mod field;
mod object;
mod types;

pub use builder::{NamedType, Schema, SchemaBuilder};
pub use field::{ArgumentDef, ContextValue, FieldDef, Resolver, ResolverContext, ResolverFuture};
pub use object::ObjectType;
pub use types::{ScalarType, TypeRef};
