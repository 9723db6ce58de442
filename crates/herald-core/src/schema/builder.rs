//! Schema assembly and lookups.

use std::collections::HashMap;

use herald_lang::OperationKind;

use super::object::ObjectType;
use super::types::{ScalarType, TypeRef};
use crate::error::SchemaError;

/// A type registered in a schema.
#[derive(Debug, Clone)]
pub enum NamedType {
    Scalar(ScalarType),
    Object(ObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Scalar(s) => s.name(),
            NamedType::Object(o) => &o.name,
        }
    }

    /// Scalars are the only input types.
    pub fn is_input(&self) -> bool {
        matches!(self, NamedType::Scalar(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NamedType::Scalar(_))
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            NamedType::Object(o) => Some(o),
            NamedType::Scalar(_) => None,
        }
    }
}

/// A validated, immutable schema.
#[derive(Debug, Clone)]
pub struct Schema {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: HashMap<String, NamedType>,
}

impl Schema {
    /// Start building a schema around its query root type.
    pub fn builder(query: ObjectType) -> SchemaBuilder {
        SchemaBuilder::new(query)
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.object(&self.query_type)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation_type.as_deref().and_then(|n| self.object(n))
    }

    /// The subscription root, if the schema declares one.
    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.subscription_type.as_deref().and_then(|n| self.object(n))
    }

    /// Root type for an operation kind.
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectType> {
        match kind {
            OperationKind::Query => self.query_type(),
            OperationKind::Mutation => self.mutation_type(),
            OperationKind::Subscription => self.subscription_type(),
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name).and_then(NamedType::as_object)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Builder for [`Schema`]; all checks run in [`SchemaBuilder::finish`].
#[derive(Debug)]
pub struct SchemaBuilder {
    query: ObjectType,
    mutation: Option<ObjectType>,
    subscription: Option<ObjectType>,
    others: Vec<ObjectType>,
}

impl SchemaBuilder {
    fn new(query: ObjectType) -> Self {
        Self {
            query,
            mutation: None,
            subscription: None,
            others: Vec::new(),
        }
    }

    pub fn mutation(mut self, root: ObjectType) -> Self {
        self.mutation = Some(root);
        self
    }

    pub fn subscription(mut self, root: ObjectType) -> Self {
        self.subscription = Some(root);
        self
    }

    /// Register a non-root object type.
    pub fn register(mut self, object: ObjectType) -> Self {
        self.others.push(object);
        self
    }

    /// Check every reference and produce the schema.
    pub fn finish(self) -> Result<Schema, SchemaError> {
        let mut types: HashMap<String, NamedType> = ScalarType::ALL
            .into_iter()
            .map(|s| (s.name().to_string(), NamedType::Scalar(s)))
            .collect();

        let query_type = self.query.name.clone();
        let mutation_type = self.mutation.as_ref().map(|m| m.name.clone());
        let subscription_type = self.subscription.as_ref().map(|s| s.name.clone());

        let objects = std::iter::once(self.query)
            .chain(self.mutation)
            .chain(self.subscription)
            .chain(self.others);

        for object in objects {
            if object.fields.is_empty() {
                return Err(SchemaError::EmptyObject(object.name));
            }
            if types.contains_key(&object.name) {
                return Err(SchemaError::DuplicateType(object.name));
            }
            types.insert(object.name.clone(), NamedType::Object(object));
        }

        for object in types.values().filter_map(NamedType::as_object) {
            check_object(object, &types)?;
        }

        tracing::debug!(
            query = %query_type,
            mutation = ?mutation_type,
            subscription = ?subscription_type,
            types = types.len(),
            "schema built"
        );

        Ok(Schema {
            query_type,
            mutation_type,
            subscription_type,
            types,
        })
    }
}

fn check_object(
    object: &ObjectType,
    types: &HashMap<String, NamedType>,
) -> Result<(), SchemaError> {
    for (index, field) in object.fields.iter().enumerate() {
        let path = format!("{}.{}", object.name, field.name);

        if object.fields[..index].iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField {
                type_name: object.name.clone(),
                field: field.name.clone(),
            });
        }
        resolve_ref(&field.field_type, &path, types)?;

        for argument in &field.arguments {
            let arg_path = format!("{}({}:)", path, argument.name);
            let named = resolve_ref(&argument.arg_type, &arg_path, types)?;
            if !named.is_input() {
                return Err(SchemaError::NonInputArgument {
                    argument: arg_path,
                    type_name: argument.arg_type.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn resolve_ref<'a>(
    type_ref: &TypeRef,
    referenced_by: &str,
    types: &'a HashMap<String, NamedType>,
) -> Result<&'a NamedType, SchemaError> {
    types
        .get(type_ref.base_name())
        .ok_or_else(|| SchemaError::UnknownType {
            type_name: type_ref.base_name().to_string(),
            referenced_by: referenced_by.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArgumentDef, FieldDef};

    fn query() -> ObjectType {
        ObjectType::new("Query").with_field(FieldDef::new("hello", TypeRef::scalar(ScalarType::String)))
    }

    #[test]
    fn test_roots() {
        let schema = Schema::builder(query())
            .subscription(
                ObjectType::new("Subscription")
                    .with_field(FieldDef::new("tick", TypeRef::scalar(ScalarType::Int))),
            )
            .finish()
            .unwrap();

        assert_eq!(schema.query_type().map(|q| q.name.as_str()), Some("Query"));
        assert!(schema.mutation_type().is_none());
        assert_eq!(
            schema.root_type(OperationKind::Subscription).map(|s| s.name.as_str()),
            Some("Subscription")
        );
        assert!(matches!(schema.get_type("Int"), Some(NamedType::Scalar(ScalarType::Int))));
    }

    #[test]
    fn test_unknown_type_reference() {
        let err = Schema::builder(
            query().with_field(FieldDef::new("hero", TypeRef::named("Character"))),
        )
        .finish()
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::UnknownType {
                type_name: "Character".into(),
                referenced_by: "Query.hero".into(),
            }
        );
    }

    #[test]
    fn test_object_argument_rejected() {
        let err = Schema::builder(query().with_field(
            FieldDef::new("echo", TypeRef::scalar(ScalarType::String))
                .with_argument(ArgumentDef::new("input", TypeRef::named("Query"))),
        ))
        .finish()
        .unwrap_err();

        assert!(matches!(err, SchemaError::NonInputArgument { .. }));
    }

    #[test]
    fn test_duplicate_names() {
        let err = Schema::builder(query()).register(query()).finish().unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("Query".into()));

        let err = Schema::builder(
            ObjectType::new("String").with_field(FieldDef::new("x", TypeRef::scalar(ScalarType::Int))),
        )
        .finish()
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("String".into()));

        let err = Schema::builder(
            query().with_field(FieldDef::new("hello", TypeRef::scalar(ScalarType::Int))),
        )
        .finish()
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn test_empty_object_rejected() {
        let err = Schema::builder(ObjectType::new("Query")).finish().unwrap_err();
        assert_eq!(err, SchemaError::EmptyObject("Query".into()));
    }
}
