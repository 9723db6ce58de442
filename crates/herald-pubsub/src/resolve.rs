//! Topic resolution: which root field a subscription listens on.

use herald_core::{validate, FieldDef, Schema};
use herald_lang::{Document, Field};

use crate::config::DEFAULT_SOURCE_NAME;
use crate::error::{Error, ValidationErrors};

/// The resolved root field of a subscription operation.
#[derive(Debug, Clone)]
pub struct SubscriptionDefinition {
    /// Name of the subscription root type.
    pub parent_type: String,
    pub field: FieldDef,
}

impl SubscriptionDefinition {
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// The broker topic; always the root field's name.
    pub fn topic(&self) -> &str {
        self.name()
    }
}

/// Parse and validate `query`, then resolve its subscription root field.
pub fn resolve_topic(schema: &Schema, query: &str) -> Result<SubscriptionDefinition, Error> {
    let document = parse_subscription(query, DEFAULT_SOURCE_NAME)?;
    resolve_document(schema, &document)
}

pub(crate) fn parse_subscription(query: &str, source_name: &str) -> Result<Document, Error> {
    herald_lang::parse(query).map_err(|e| Error::syntax(e, source_name, query))
}

/// Resolve the root field of an already parsed document.
pub(crate) fn resolve_document(
    schema: &Schema,
    document: &Document,
) -> Result<SubscriptionDefinition, Error> {
    let errors = validate(schema, document);
    if !errors.is_empty() {
        return Err(Error::Validation(ValidationErrors(errors)));
    }

    let root = root_selection(document);
    let subscription = schema.subscription_type().ok_or(Error::NoSubscriptionType)?;

    let field = root
        .and_then(|f| subscription.field(&f.name.value))
        .ok_or_else(|| Error::UnknownTopicField {
            field: root.map(|f| f.name.value.clone()).unwrap_or_default(),
            type_name: subscription.name.clone(),
        })?;

    Ok(SubscriptionDefinition {
        parent_type: subscription.name.clone(),
        field: field.clone(),
    })
}

/// First selection of the first definition.
fn root_selection(document: &Document) -> Option<&Field> {
    document
        .definitions
        .first()
        .and_then(|op| op.selection_set.selections.first())
        .map(|s| s.as_field())
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{ObjectType, ScalarType, TypeRef};

    fn schema(with_subscription: bool) -> Schema {
        let query = ObjectType::new("Query")
            .with_field(FieldDef::new("ping", TypeRef::scalar(ScalarType::Boolean)));
        let builder = Schema::builder(query);
        let builder = if with_subscription {
            builder.subscription(
                ObjectType::new("Subscription")
                    .with_field(FieldDef::new("tick", TypeRef::scalar(ScalarType::Int)))
                    .with_field(FieldDef::new("tock", TypeRef::scalar(ScalarType::Int))),
            )
        } else {
            builder
        };
        builder.finish().unwrap()
    }

    #[test]
    fn test_resolves_root_field_name() {
        let schema = schema(true);
        for _ in 0..2 {
            let definition = resolve_topic(&schema, "subscription { tock }").unwrap();
            assert_eq!(definition.topic(), "tock");
            assert_eq!(definition.parent_type, "Subscription");
        }
    }

    #[test]
    fn test_alias_does_not_change_topic() {
        let definition = resolve_topic(&schema(true), "subscription { t: tick }").unwrap();
        assert_eq!(definition.topic(), "tick");
    }

    #[test]
    fn test_syntax_error() {
        let err = resolve_topic(&schema(true), "subscription { tick").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_validation_error() {
        let err = resolve_topic(&schema(true), "subscription { meow }").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot query field \"meow\" on type \"Subscription\"."
        );
    }

    #[test]
    fn test_missing_subscription_type() {
        let err = resolve_topic(&schema(false), "subscription { ping }").unwrap_err();
        assert!(matches!(err, Error::NoSubscriptionType));
        assert_eq!(err.to_string(), "No Subscription types found in schema");
    }

    #[test]
    fn test_root_field_outside_subscription_type() {
        let err = resolve_topic(&schema(true), "{ ping }").unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownTopicField { ref field, .. } if field == "ping"
        ));
    }
}
