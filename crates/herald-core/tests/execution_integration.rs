//! Integration tests for validation and execution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use herald_core::{
    execute, validate, ArgumentDef, FieldDef, FieldError, ObjectType, ScalarType, Schema, TypeRef,
};
use serde_json::{json, Map, Value};

struct TestContext {
    schema: Schema,
    resolved: Arc<AtomicUsize>,
}

impl TestContext {
    fn new() -> Self {
        let resolved = Arc::new(AtomicUsize::new(0));
        let counter = resolved.clone();

        let character = ObjectType::new("Character")
            .with_field(FieldDef::new("id", TypeRef::scalar(ScalarType::Id).non_null()))
            .with_field(FieldDef::new("name", TypeRef::scalar(ScalarType::String)))
            .with_field(FieldDef::new(
                "appearsIn",
                TypeRef::list(TypeRef::scalar(ScalarType::Int)),
            ));

        let query = ObjectType::new("Query").with_field(
            FieldDef::new("hero", TypeRef::named("Character"))
                .with_argument(
                    ArgumentDef::new("episode", TypeRef::scalar(ScalarType::Int))
                        .with_default(json!(4)),
                )
                .with_resolver(move |ctx| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        match ctx.arg("episode").and_then(Value::as_i64) {
                            Some(5) => Ok(json!({ "id": 1000, "name": "Luke Skywalker", "appearsIn": [4, 5, 6] })),
                            Some(4) => Ok(json!({ "id": "2001", "name": "R2-D2", "appearsIn": 4 })),
                            _ => Err(FieldError::new("no hero for that episode")),
                        }
                    }
                }),
        );

        let schema = Schema::builder(query).register(character).finish().unwrap();
        Self { schema, resolved }
    }

    async fn run(&self, source: &str, variables: Value) -> Value {
        let document = herald_lang::parse(source).unwrap();
        let errors = validate(&self.schema, &document);
        assert!(errors.is_empty(), "unexpected validation errors: {:?}", errors);

        let variables = match variables {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        execute(&self.schema, &document, Value::Null, None, &variables, None)
            .await
            .unwrap()
            .to_json()
    }
}

#[tokio::test]
async fn test_argument_default_applies() {
    let ctx = TestContext::new();
    let result = ctx.run("{ hero { id name } }", Value::Null).await;
    assert_eq!(result, json!({ "data": { "hero": { "id": "2001", "name": "R2-D2" } } }));
}

#[tokio::test]
async fn test_variables_flow_into_arguments() {
    let ctx = TestContext::new();
    let result = ctx
        .run(
            "query Hero($ep: Int) { hero(episode: $ep) { id appearsIn } }",
            json!({ "ep": 5 }),
        )
        .await;
    assert_eq!(
        result,
        json!({ "data": { "hero": { "id": "1000", "appearsIn": [4, 5, 6] } } })
    );
}

#[tokio::test]
async fn test_single_value_in_list_position_is_an_error() {
    let ctx = TestContext::new();
    let result = ctx.run("{ hero { name appearsIn } }", Value::Null).await;
    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Expected Iterable, but did not find one for field Character.appearsIn.",
                "locations": [{ "line": 1, "column": 15 }],
                "path": ["hero", "appearsIn"]
            }],
            "data": { "hero": { "name": "R2-D2", "appearsIn": null } }
        })
    );
}

#[tokio::test]
async fn test_resolver_error_is_reported_with_path() {
    let ctx = TestContext::new();
    let result = ctx.run("{ hero(episode: 1) { name } }", Value::Null).await;
    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "no hero for that episode",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["hero"]
            }],
            "data": { "hero": null }
        })
    );
}

#[tokio::test]
async fn test_same_response_key_resolves_once() {
    let ctx = TestContext::new();
    let result = ctx.run("{ hero { id } hero { name } }", Value::Null).await;
    assert_eq!(
        result,
        json!({ "data": { "hero": { "id": "2001", "name": "R2-D2" } } })
    );
    assert_eq!(ctx.resolved.load(Ordering::SeqCst), 1);
}
