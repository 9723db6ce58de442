//! Operation execution.
//!
//! Query and subscription root fields resolve concurrently, mutation root
//! fields one after another. Resolver failures are collected as
//! [`ResponseError`]s; a null in a non-null position propagates to the nearest
//! nullable parent, nulling the whole `data` if it reaches the root.

mod coerce;
mod result;

use futures::future::{join_all, BoxFuture, FutureExt};
use herald_lang::{Document, Field, OperationDefinition, OperationKind, SelectionSet};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::ExecutionError;
use crate::schema::{ContextValue, NamedType, ObjectType, ResolverContext, Schema, TypeRef};

pub(crate) use coerce::coerce_literal;
pub use result::{ErrorLocation, ExecutionResult, PathSegment, ResponseError};

/// Marker for a null that must propagate to the parent.
#[derive(Debug)]
struct Propagate;

type Completion = Result<Value, Propagate>;

/// Pick the operation to run.
///
/// Without a name the document must hold exactly one operation.
pub fn get_operation<'a>(
    document: &'a Document,
    operation_name: Option<&str>,
) -> Result<&'a OperationDefinition, ExecutionError> {
    match operation_name {
        Some(name) => document
            .operation(name)
            .ok_or_else(|| ExecutionError::UnknownOperation(name.to_string())),
        None => match document.definitions.as_slice() {
            [] => Err(ExecutionError::NoOperation),
            [only] => Ok(only),
            _ => Err(ExecutionError::OperationNameRequired),
        },
    }
}

/// Execute one operation of an already validated document.
///
/// Returns `Err` only when the request cannot run at all; everything else is
/// reported in the [`ExecutionResult`].
pub async fn execute(
    schema: &Schema,
    document: &Document,
    root_value: Value,
    context_value: Option<ContextValue>,
    variable_values: &Map<String, Value>,
    operation_name: Option<&str>,
) -> Result<ExecutionResult, ExecutionError> {
    let operation = get_operation(document, operation_name)?;
    let root_type = schema
        .root_type(operation.kind)
        .ok_or(ExecutionError::RootTypeMissing(operation.kind))?;

    let variables = match coerce::coerce_variable_values(schema, document, operation, variable_values)
    {
        Ok(variables) => variables,
        Err(errors) => {
            debug!(count = errors.len(), "variable coercion failed");
            return Ok(ExecutionResult { errors, data: None });
        }
    };

    let ctx = ExecutionContext {
        schema,
        document,
        variables,
        context: context_value,
        errors: Mutex::new(Vec::new()),
    };

    let serial = operation.kind == OperationKind::Mutation;
    let data = ctx
        .execute_fields(root_type, root_value, vec![&operation.selection_set], Vec::new(), serial)
        .await
        .unwrap_or(Value::Null);

    let errors = ctx.errors.into_inner();
    trace!(
        operation = operation.name().unwrap_or("<anonymous>"),
        kind = %operation.kind,
        errors = errors.len(),
        "operation executed"
    );

    Ok(ExecutionResult {
        errors,
        data: Some(data),
    })
}

struct ExecutionContext<'a> {
    schema: &'a Schema,
    document: &'a Document,
    variables: Map<String, Value>,
    context: Option<ContextValue>,
    errors: Mutex<Vec<ResponseError>>,
}

impl<'a> ExecutionContext<'a> {
    fn report(&self, message: impl Into<String>, field: &Field, path: &[PathSegment]) {
        let error = ResponseError::at(message, self.document.location(field.span))
            .with_path(path.to_vec());
        self.errors.lock().push(error);
    }

    /// Group the selections by response key, keeping first-seen order.
    fn collect_fields(
        &self,
        selection_sets: &[&'a SelectionSet],
    ) -> Vec<(&'a str, Vec<&'a Field>)> {
        let mut grouped: Vec<(&'a str, Vec<&'a Field>)> = Vec::new();
        for selection in selection_sets.iter().copied().flat_map(|s| s.selections.iter()) {
            let field = selection.as_field();
            let key = field.response_key();
            match grouped.iter_mut().find(|(k, _)| *k == key) {
                Some((_, fields)) => fields.push(field),
                None => grouped.push((key, vec![field])),
            }
        }
        grouped
    }

    fn execute_fields(
        &'a self,
        parent_type: &'a ObjectType,
        source: Value,
        selection_sets: Vec<&'a SelectionSet>,
        path: Vec<PathSegment>,
        serial: bool,
    ) -> BoxFuture<'a, Completion> {
        async move {
            let grouped = self.collect_fields(&selection_sets);
            let mut data = Map::new();

            if serial {
                for (key, fields) in grouped {
                    let mut field_path = path.clone();
                    field_path.push(key.into());
                    if let Some(value) = self
                        .execute_field(parent_type, &source, fields, field_path)
                        .await?
                    {
                        data.insert(key.to_string(), value);
                    }
                }
            } else {
                let keys: Vec<&str> = grouped.iter().map(|(k, _)| *k).collect();
                let futures = grouped.into_iter().map(|(key, fields)| {
                    let mut field_path = path.clone();
                    field_path.push(key.into());
                    self.execute_field(parent_type, &source, fields, field_path)
                });
                let completed = join_all(futures).await;
                for (key, value) in keys.into_iter().zip(completed) {
                    if let Some(value) = value? {
                        data.insert(key.to_string(), value);
                    }
                }
            }

            Ok(Value::Object(data))
        }
        .boxed()
    }

    /// Resolve and complete one response key. `Ok(None)` means the field is
    /// not defined on `parent_type` and is left out of the response.
    fn execute_field(
        &'a self,
        parent_type: &'a ObjectType,
        source: &Value,
        fields: Vec<&'a Field>,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, Result<Option<Value>, Propagate>> {
        let field = fields[0];
        let name = field.name.value.as_str();

        if name == "__typename" {
            let typename = Value::String(parent_type.name.clone());
            return futures::future::ready(Ok(Some(typename))).boxed();
        }
        let Some(definition) = parent_type.field(name) else {
            return futures::future::ready(Ok(None)).boxed();
        };

        let args = coerce::coerce_arguments(self.schema, definition, field, &self.variables);
        let parent = source.clone();

        async move {
            let args = match args {
                Ok(args) => args,
                Err(message) => {
                    self.report(message, field, &path);
                    return null_or_propagate(&definition.field_type).map(Some);
                }
            };

            let resolver_ctx = ResolverContext {
                parent,
                args,
                context: self.context.clone(),
                field_name: definition.name.clone(),
                parent_type: parent_type.name.clone(),
            };

            match definition.resolve(resolver_ctx).await {
                Ok(value) => {
                    let info = FieldInfo {
                        parent_type: &parent_type.name,
                        fields: &fields,
                    };
                    self.complete_value(&definition.field_type, info, path, value)
                        .await
                        .map(Some)
                }
                Err(error) => {
                    self.report(error.message, field, &path);
                    null_or_propagate(&definition.field_type).map(Some)
                }
            }
        }
        .boxed()
    }

    fn complete_value<'f>(
        &'a self,
        ty: &'a TypeRef,
        info: FieldInfo<'a, 'f>,
        path: Vec<PathSegment>,
        value: Value,
    ) -> BoxFuture<'f, Completion>
    where
        'a: 'f,
    {
        async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    let completed = self.complete_nullable(inner, info, path.clone(), value).await?;
                    if completed.is_null() {
                        self.report(
                            format!(
                                "Cannot return null for non-nullable field {}.{}.",
                                info.parent_type,
                                info.field_name()
                            ),
                            info.fields[0],
                            &path,
                        );
                        return Err(Propagate);
                    }
                    Ok(completed)
                }
                _ => Ok(self
                    .complete_nullable(ty, info, path, value)
                    .await
                    .unwrap_or(Value::Null)),
            }
        }
        .boxed()
    }

    fn complete_nullable<'f>(
        &'a self,
        ty: &'a TypeRef,
        info: FieldInfo<'a, 'f>,
        path: Vec<PathSegment>,
        value: Value,
    ) -> BoxFuture<'f, Completion>
    where
        'a: 'f,
    {
        async move {
            if value.is_null() {
                return Ok(Value::Null);
            }

            match ty {
                TypeRef::NonNull(_) => self.complete_value(ty, info, path, value).await,
                TypeRef::List(item_type) => {
                    let Value::Array(items) = value else {
                        self.report(
                            format!(
                                "Expected Iterable, but did not find one for field {}.{}.",
                                info.parent_type,
                                info.field_name()
                            ),
                            info.fields[0],
                            &path,
                        );
                        return Err(Propagate);
                    };
                    let futures = items.into_iter().enumerate().map(|(index, item)| {
                        let mut item_path = path.clone();
                        item_path.push(index.into());
                        self.complete_value(item_type, info, item_path, item)
                    });
                    join_all(futures)
                        .await
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                }
                TypeRef::Named(name) => match self.schema.get_type(name) {
                    Some(NamedType::Scalar(scalar)) => scalar.serialize(&value).map_err(|message| {
                        self.report(message, info.fields[0], &path);
                        Propagate
                    }),
                    Some(NamedType::Object(object)) => {
                        let sub_selections = info
                            .fields
                            .iter()
                            .copied()
                            .filter_map(|f| f.selection_set.as_ref())
                            .collect();
                        self.execute_fields(object, value, sub_selections, path, false)
                            .await
                    }
                    None => {
                        self.report(format!("Unknown type \"{}\".", name), info.fields[0], &path);
                        Err(Propagate)
                    }
                },
            }
        }
        .boxed()
    }
}

/// The field being completed, for error messages and sub-selections.
#[derive(Clone, Copy)]
struct FieldInfo<'a, 'f> {
    parent_type: &'f str,
    fields: &'f [&'a Field],
}

impl FieldInfo<'_, '_> {
    fn field_name(&self) -> &str {
        &self.fields[0].name.value
    }
}

fn null_or_propagate(ty: &TypeRef) -> Completion {
    if ty.is_non_null() {
        Err(Propagate)
    } else {
        Ok(Value::Null)
    }
}
