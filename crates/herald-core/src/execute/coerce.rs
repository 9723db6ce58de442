//! Input coercion for variables, argument literals and defaults.

use herald_lang::{Document, Field, InputValue, OperationDefinition};
use serde_json::{Map, Number, Value};

use super::result::ResponseError;
use crate::schema::{FieldDef, NamedType, ScalarType, Schema, TypeRef};

/// Coerce a literal against `ty`.
///
/// With `variables` set to `None` every variable reference is accepted; this
/// is the mode used by validation, where variable types are checked separately.
pub(crate) fn coerce_literal(
    schema: &Schema,
    value: &InputValue,
    ty: &TypeRef,
    variables: Option<&Map<String, Value>>,
) -> Option<Value> {
    if let InputValue::Variable(name) = value {
        let Some(variables) = variables else {
            return Some(Value::Null);
        };
        let resolved = variables.get(name).cloned().unwrap_or(Value::Null);
        if ty.is_non_null() && resolved.is_null() {
            return None;
        }
        return Some(resolved);
    }

    match ty {
        TypeRef::NonNull(inner) => match value {
            InputValue::Null => None,
            _ => coerce_literal(schema, value, inner, variables),
        },
        _ if matches!(value, InputValue::Null) => Some(Value::Null),
        TypeRef::List(item) => match value {
            InputValue::List(items) => items
                .iter()
                .map(|i| coerce_literal(schema, &i.value, item, variables))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            single => coerce_literal(schema, single, item, variables).map(|v| Value::Array(vec![v])),
        },
        TypeRef::Named(name) => {
            let Some(NamedType::Scalar(scalar)) = schema.get_type(name) else {
                return None;
            };
            let raw = match value {
                InputValue::Int(i) => Value::from(*i),
                // Float literals never satisfy Int, even when integral.
                InputValue::Float(_) if *scalar == ScalarType::Int => return None,
                InputValue::Float(f) => Value::Number(Number::from_f64(*f)?),
                InputValue::String(s) => Value::String(s.clone()),
                InputValue::Boolean(b) => Value::Bool(*b),
                _ => return None,
            };
            scalar.coerce_input(&raw)
        }
    }
}

/// Coerce a runtime (JSON) input value against `ty`.
pub(crate) fn coerce_json(schema: &Schema, value: &Value, ty: &TypeRef) -> Option<Value> {
    match ty {
        TypeRef::NonNull(inner) => match value {
            Value::Null => None,
            _ => coerce_json(schema, value, inner),
        },
        _ if value.is_null() => Some(Value::Null),
        TypeRef::List(item) => match value {
            Value::Array(items) => items
                .iter()
                .map(|i| coerce_json(schema, i, item))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            single => coerce_json(schema, single, item).map(|v| Value::Array(vec![v])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(NamedType::Scalar(scalar)) => scalar.coerce_input(value),
            _ => None,
        },
    }
}

/// Build the variable map for `operation` from caller-supplied inputs.
///
/// Undeclared inputs are dropped. Omitted nullable variables without a default
/// stay absent so that argument defaults can apply.
pub(crate) fn coerce_variable_values(
    schema: &Schema,
    document: &Document,
    operation: &OperationDefinition,
    inputs: &Map<String, Value>,
) -> Result<Map<String, Value>, Vec<ResponseError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for definition in &operation.variables {
        let name = &definition.name.value;
        let ty = TypeRef::from(&definition.var_type.value);
        let location = document.location(definition.span);

        if !schema.get_type(ty.base_name()).is_some_and(NamedType::is_input) {
            errors.push(ResponseError::at(
                format!(
                    "Variable \"${}\" expected value of type \"{}\" which cannot be used as an input type.",
                    name, ty
                ),
                location,
            ));
            continue;
        }

        match inputs.get(name) {
            None => {
                if let Some(default) = &definition.default_value {
                    match coerce_literal(schema, &default.value, &ty, Some(&Map::new())) {
                        Some(value) => {
                            coerced.insert(name.clone(), value);
                        }
                        None => errors.push(ResponseError::at(
                            format!(
                                "Variable \"${}\" has invalid default value {}; Expected type \"{}\".",
                                name, default.value, ty
                            ),
                            location,
                        )),
                    }
                } else if ty.is_non_null() {
                    errors.push(ResponseError::at(
                        format!(
                            "Variable \"${}\" of required type \"{}\" was not provided.",
                            name, ty
                        ),
                        location,
                    ));
                }
            }
            Some(Value::Null) if ty.is_non_null() => errors.push(ResponseError::at(
                format!(
                    "Variable \"${}\" of non-null type \"{}\" must not be null.",
                    name, ty
                ),
                location,
            )),
            Some(value) => match coerce_json(schema, value, &ty) {
                Some(value) => {
                    coerced.insert(name.clone(), value);
                }
                None => errors.push(ResponseError::at(
                    format!(
                        "Variable \"${}\" got invalid value {}; Expected type \"{}\".",
                        name, value, ty
                    ),
                    location,
                )),
            },
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerce the arguments written on `field` into the map handed to its resolver.
pub(crate) fn coerce_arguments(
    schema: &Schema,
    definition: &FieldDef,
    field: &Field,
    variables: &Map<String, Value>,
) -> Result<Map<String, Value>, String> {
    let mut args = Map::new();

    for argument in &definition.arguments {
        let ty = &argument.arg_type;
        let written = field.argument(&argument.name).map(|a| &a.value.value);

        let provided = match written {
            Some(InputValue::Variable(var)) => variables.get(var).cloned(),
            Some(literal) => Some(coerce_literal(schema, literal, ty, Some(variables)).ok_or_else(
                || format!("Argument \"{}\" has invalid value {}.", argument.name, literal),
            )?),
            None => None,
        };

        match provided {
            Some(Value::Null) if ty.is_non_null() => {
                return Err(format!(
                    "Argument \"{}\" of non-null type \"{}\" must not be null.",
                    argument.name, ty
                ));
            }
            Some(value) => {
                args.insert(argument.name.clone(), value);
            }
            None => {
                if let Some(default) = &argument.default_value {
                    args.insert(argument.name.clone(), default.clone());
                } else if ty.is_non_null() {
                    return Err(format!(
                        "Argument \"{}\" of required type \"{}\" was not provided.",
                        argument.name, ty
                    ));
                }
            }
        }
    }

    Ok(args)
}
