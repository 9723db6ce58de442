//! Type references and built-in scalars.

use std::fmt;

use herald_lang::TypeAnnotation;
use serde_json::{Number, Value};

/// The built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 32-bit signed integer.
    Int,
    /// Double-precision float.
    Float,
    /// UTF-8 string.
    String,
    Boolean,
    /// Opaque identifier, serialized as a string.
    Id,
}

impl ScalarType {
    /// All built-in scalars.
    pub const ALL: [ScalarType; 5] = [
        ScalarType::Int,
        ScalarType::Float,
        ScalarType::String,
        ScalarType::Boolean,
        ScalarType::Id,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::String => "String",
            ScalarType::Boolean => "Boolean",
            ScalarType::Id => "ID",
        }
    }

    pub fn from_name(name: &str) -> Option<ScalarType> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Convert a resolved value into this scalar's output form.
    pub fn serialize(&self, value: &Value) -> Result<Value, String> {
        match self {
            ScalarType::Int => match value {
                Value::Bool(b) => Ok(Value::from(i32::from(*b))),
                Value::Number(n) => int_from_number(n)
                    .map(Value::from)
                    .ok_or_else(|| int_error(value)),
                _ => Err(int_error(value)),
            },
            ScalarType::Float => match value {
                Value::Bool(b) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
                Value::Number(_) => Ok(value.clone()),
                _ => Err(format!("Float cannot represent non numeric value: {}", value)),
            },
            ScalarType::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(format!("String cannot represent value: {}", value)),
            },
            ScalarType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
                _ => Err(format!("Boolean cannot represent a non boolean value: {}", value)),
            },
            ScalarType::Id => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
                _ => Err(format!("ID cannot represent value: {}", value)),
            },
        }
    }

    /// Accept an input value (argument or variable) for this scalar.
    pub fn coerce_input(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ScalarType::Int, Value::Number(n)) => int_from_number(n).map(Value::from),
            (ScalarType::Float, Value::Number(_)) => Some(value.clone()),
            (ScalarType::String, Value::String(_)) => Some(value.clone()),
            (ScalarType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ScalarType::Id, Value::String(_)) => Some(value.clone()),
            (ScalarType::Id, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(Value::String(n.to_string()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn int_from_number(n: &Number) -> Option<i32> {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).ok();
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

fn int_error(value: &Value) -> String {
    match value {
        Value::Number(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => {
            format!("Int cannot represent non 32-bit signed integer value: {}", value)
        }
        _ => format!("Int cannot represent non-integer value: {}", value),
    }
}

/// A reference to a type, with list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Shorthand for a nullable built-in scalar.
    pub fn scalar(scalar: ScalarType) -> Self {
        TypeRef::Named(scalar.name().to_string())
    }

    /// `[T]`
    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// `T!`; wrapping an already non-null type is a no-op.
    pub fn non_null(self) -> Self {
        match self {
            TypeRef::NonNull(_) => self,
            other => TypeRef::NonNull(Box::new(other)),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// The innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.base_name(),
        }
    }
}

impl From<&TypeAnnotation> for TypeRef {
    fn from(annotation: &TypeAnnotation) -> Self {
        match annotation {
            TypeAnnotation::Named(name) => TypeRef::Named(name.clone()),
            TypeAnnotation::List(inner) => TypeRef::List(Box::new(inner.as_ref().into())),
            TypeAnnotation::NonNull(inner) => TypeRef::NonNull(Box::new(inner.as_ref().into())),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_lookup() {
        assert_eq!(ScalarType::from_name("ID"), Some(ScalarType::Id));
        assert_eq!(ScalarType::from_name("Disturbance"), None);
    }

    #[test]
    fn test_int_serialization() {
        assert_eq!(ScalarType::Int.serialize(&json!(10)), Ok(json!(10)));
        assert_eq!(ScalarType::Int.serialize(&json!(4.0)), Ok(json!(4)));
        assert_eq!(ScalarType::Int.serialize(&json!(true)), Ok(json!(1)));
        assert_eq!(
            ScalarType::Int.serialize(&json!(3_000_000_000i64)),
            Err("Int cannot represent non 32-bit signed integer value: 3000000000".to_string())
        );
        assert_eq!(
            ScalarType::Int.serialize(&json!("ten")),
            Err("Int cannot represent non-integer value: \"ten\"".to_string())
        );
    }

    #[test]
    fn test_string_and_id_serialization() {
        assert_eq!(ScalarType::String.serialize(&json!(5)), Ok(json!("5")));
        assert_eq!(ScalarType::Id.serialize(&json!(1000)), Ok(json!("1000")));
        assert!(ScalarType::String.serialize(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_input_coercion_is_strict() {
        assert_eq!(ScalarType::String.coerce_input(&json!("x")), Some(json!("x")));
        assert_eq!(ScalarType::String.coerce_input(&json!(1)), None);
        assert_eq!(ScalarType::Float.coerce_input(&json!(1)), Some(json!(1)));
        assert_eq!(ScalarType::Int.coerce_input(&json!(1.5)), None);
    }

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::list(TypeRef::named("Disturbance").non_null()).non_null();
        assert_eq!(ty.to_string(), "[Disturbance!]!");
        assert_eq!(ty.base_name(), "Disturbance");
        assert_eq!(ty.clone().non_null(), ty);
    }
}
