//! Field and argument definitions, and the resolver contract.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::types::TypeRef;
use crate::error::FieldError;

/// Caller-supplied context shared with every resolver of one execution.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Future returned by a resolver.
pub type ResolverFuture = BoxFuture<'static, Result<Value, FieldError>>;

/// A field resolver.
pub type Resolver = Arc<dyn Fn(ResolverContext) -> ResolverFuture + Send + Sync>;

/// Everything a resolver sees for one field invocation.
#[derive(Clone)]
pub struct ResolverContext {
    /// The parent object; the root value for root fields.
    pub parent: Value,
    /// Coerced arguments, defaults applied.
    pub args: Map<String, Value>,
    pub context: Option<ContextValue>,
    pub field_name: String,
    pub parent_type: String,
}

impl ResolverContext {
    /// Get a coerced argument value.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Downcast the context value to `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.context.as_deref().and_then(|c| c.downcast_ref::<T>())
    }
}

impl fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext")
            .field("parent", &self.parent)
            .field("args", &self.args)
            .field("has_context", &self.context.is_some())
            .field("field_name", &self.field_name)
            .field("parent_type", &self.parent_type)
            .finish()
    }
}

/// An argument accepted by a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub arg_type: TypeRef,
    pub default_value: Option<Value>,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, arg_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            arg_type,
            default_value: None,
        }
    }

    /// Set the value used when the argument is omitted.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Non-null without a default: the caller must provide it.
    pub fn is_required(&self) -> bool {
        self.arg_type.is_non_null() && self.default_value.is_none()
    }
}

/// A field on an object type.
#[derive(Clone)]
pub struct FieldDef {
    pub name: String,
    pub field_type: TypeRef,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentDef>,
    /// `None` means the default resolver: read `name` from the parent object.
    pub resolver: Option<Resolver>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            arguments: Vec::new(),
            resolver: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Attach an async resolver.
    pub fn with_resolver<F, Fut>(mut self, resolver: F) -> Self
    where
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FieldError>> + Send + 'static,
    {
        let boxed: Resolver = Arc::new(move |ctx: ResolverContext| resolver(ctx).boxed());
        self.resolver = Some(boxed);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Resolve this field for `ctx`, falling back to a property lookup.
    pub fn resolve(&self, ctx: ResolverContext) -> ResolverFuture {
        match &self.resolver {
            Some(resolver) => resolver(ctx),
            None => {
                let value = ctx.parent.get(&self.name).cloned().unwrap_or(Value::Null);
                futures::future::ready(Ok(value)).boxed()
            }
        }
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("arguments", &self.arguments)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}
