//! Document validation against a schema.
//!
//! Returns every rule violation found, in document order. An empty list means
//! the document may be executed. A missing root type for an operation kind is
//! left to the executor.

use std::collections::{HashMap, HashSet};

use herald_lang::{
    Document, Field, InputValue, Location, OperationDefinition, OperationKind, SelectionSet, Span,
};
use thiserror::Error;

use crate::execute::coerce_literal;
use crate::schema::{FieldDef, NamedType, ObjectType, Schema, TypeRef};

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub locations: Vec<Location>,
}

/// Check `document` against `schema`.
pub fn validate(schema: &Schema, document: &Document) -> Vec<ValidationError> {
    let mut validator = Validator {
        schema,
        document,
        errors: Vec::new(),
    };

    validator.unique_operation_names();
    validator.lone_anonymous_operation();
    for operation in document.operations() {
        validator.single_root_field(operation);
        validator.operation(operation);
    }

    if !validator.errors.is_empty() {
        tracing::debug!(count = validator.errors.len(), "document failed validation");
    }
    validator.errors
}

struct Validator<'a> {
    schema: &'a Schema,
    document: &'a Document,
    errors: Vec<ValidationError>,
}

/// A variable reference in direct argument position.
struct VariableUsage<'a> {
    name: &'a str,
    span: Span,
    /// Type and default of the argument it is passed to, when known.
    expected: Option<(&'a TypeRef, bool)>,
}

impl<'a> Validator<'a> {
    fn report(&mut self, message: String, spans: &[Span]) {
        let locations = spans.iter().map(|s| self.document.location(*s)).collect();
        self.errors.push(ValidationError { message, locations });
    }

    fn unique_operation_names(&mut self) {
        let document = self.document;
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for operation in document.operations() {
            let Some(name) = &operation.name else { continue };
            if let Some(first) = seen.get(name.value.as_str()) {
                let first = *first;
                self.report(
                    format!("There can be only one operation named \"{}\".", name.value),
                    &[first, name.span],
                );
            } else {
                seen.insert(&name.value, name.span);
            }
        }
    }

    fn lone_anonymous_operation(&mut self) {
        let document = self.document;
        if document.definitions.len() < 2 {
            return;
        }
        for operation in document.operations() {
            if operation.name.is_none() {
                self.report(
                    "This anonymous operation must be the only defined operation.".to_string(),
                    &[operation.span],
                );
            }
        }
    }

    fn single_root_field(&mut self, operation: &OperationDefinition) {
        if operation.kind != OperationKind::Subscription {
            return;
        }
        let selections = &operation.selection_set.selections;
        if selections.len() > 1 {
            let message = match operation.name() {
                Some(name) => format!("Subscription \"{}\" must select only one top level field.", name),
                None => "Anonymous Subscription must select only one top level field.".to_string(),
            };
            let extra: Vec<Span> = selections[1..].iter().map(|s| s.span()).collect();
            self.report(message, &extra);
        }
    }

    fn operation(&mut self, operation: &'a OperationDefinition) {
        self.variable_definitions(operation);

        let schema = self.schema;
        let mut usages = Vec::new();
        match schema.root_type(operation.kind) {
            Some(root) => self.selection_set(root, &operation.selection_set, &mut usages),
            None => collect_all_variables(&operation.selection_set, &mut usages),
        }

        self.variable_usages(operation, &usages);
    }

    fn variable_definitions(&mut self, operation: &OperationDefinition) {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for definition in &operation.variables {
            let name = definition.name.value.as_str();
            if let Some(first) = seen.get(name) {
                let first = *first;
                self.report(
                    format!("There can be only one variable named \"{}\".", name),
                    &[first, definition.name.span],
                );
                continue;
            }
            seen.insert(name, definition.name.span);

            let annotation = &definition.var_type;
            let schema = self.schema;
            match schema.get_type(annotation.value.base_name()) {
                None => self.report(
                    format!("Unknown type \"{}\".", annotation.value.base_name()),
                    &[annotation.span],
                ),
                Some(named) if !named.is_input() => self.report(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        name, annotation.value
                    ),
                    &[annotation.span],
                ),
                Some(_) => {
                    if let Some(default) = &definition.default_value {
                        let ty = TypeRef::from(&annotation.value);
                        if coerce_literal(schema, &default.value, &ty, None).is_none() {
                            self.report(
                                format!(
                                    "Variable \"${}\" of type \"{}\" has invalid default value {}.",
                                    name, ty, default.value
                                ),
                                &[default.span],
                            );
                        }
                    }
                }
            }
        }
    }

    fn selection_set(
        &mut self,
        parent: &'a ObjectType,
        selection_set: &'a SelectionSet,
        usages: &mut Vec<VariableUsage<'a>>,
    ) {
        for selection in &selection_set.selections {
            let field = selection.as_field();
            let name = field.name.value.as_str();

            if name == "__typename" {
                if let Some(sub) = &field.selection_set {
                    self.report(
                        "Field \"__typename\" must not have a selection since type \"String!\" has no subfields."
                            .to_string(),
                        &[sub.span],
                    );
                }
                continue;
            }

            let Some(definition) = parent.field(name) else {
                self.report(
                    format!("Cannot query field \"{}\" on type \"{}\".", name, parent.name),
                    &[field.span],
                );
                collect_field_variables(field, usages);
                if let Some(sub) = &field.selection_set {
                    collect_all_variables(sub, usages);
                }
                continue;
            };

            self.arguments(parent, definition, field, usages);
            self.field_selection(definition, field, usages);
        }
    }

    fn field_selection(
        &mut self,
        definition: &'a FieldDef,
        field: &'a Field,
        usages: &mut Vec<VariableUsage<'a>>,
    ) {
        let schema = self.schema;
        let ty = &definition.field_type;
        match schema.get_type(ty.base_name()) {
            Some(NamedType::Scalar(_)) => {
                if let Some(sub) = &field.selection_set {
                    self.report(
                        format!(
                            "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                            field.name.value, ty
                        ),
                        &[sub.span],
                    );
                    collect_all_variables(sub, usages);
                }
            }
            Some(NamedType::Object(object)) => match &field.selection_set {
                Some(sub) => self.selection_set(object, sub, usages),
                None => self.report(
                    format!(
                        "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                        field.name.value, ty, field.name.value
                    ),
                    &[field.span],
                ),
            },
            None => {}
        }
    }

    fn arguments(
        &mut self,
        parent: &ObjectType,
        definition: &'a FieldDef,
        field: &'a Field,
        usages: &mut Vec<VariableUsage<'a>>,
    ) {
        let mut seen: HashSet<&str> = HashSet::new();
        for argument in &field.arguments {
            let name = argument.name.value.as_str();
            if !seen.insert(name) {
                self.report(
                    format!("There can be only one argument named \"{}\".", name),
                    &[argument.name.span],
                );
                continue;
            }

            let Some(argument_def) = definition.argument(name) else {
                self.report(
                    format!(
                        "Unknown argument \"{}\" on field \"{}\" of type \"{}\".",
                        name, definition.name, parent.name
                    ),
                    &[argument.name.span],
                );
                collect_value_variables(&argument.value.value, argument.value.span, usages);
                continue;
            };

            match &argument.value.value {
                InputValue::Variable(var) => usages.push(VariableUsage {
                    name: var,
                    span: argument.value.span,
                    expected: Some((&argument_def.arg_type, argument_def.default_value.is_some())),
                }),
                literal => {
                    collect_value_variables(literal, argument.value.span, usages);
                    if coerce_literal(self.schema, literal, &argument_def.arg_type, None).is_none() {
                        self.report(
                            format!("Argument \"{}\" has invalid value {}.", name, literal),
                            &[argument.value.span],
                        );
                    }
                }
            }
        }

        for argument_def in &definition.arguments {
            if argument_def.is_required() && field.argument(&argument_def.name).is_none() {
                self.report(
                    format!(
                        "Field \"{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                        definition.name, argument_def.name, argument_def.arg_type
                    ),
                    &[field.span],
                );
            }
        }
    }

    fn variable_usages(&mut self, operation: &OperationDefinition, usages: &[VariableUsage<'a>]) {
        let suffix = |verb: &str| match operation.name() {
            Some(op) => format!(" {} \"{}\".", verb, op),
            None => ".".to_string(),
        };

        let mut reported: HashSet<&str> = HashSet::new();
        for usage in usages {
            let definition = operation.variables.iter().find(|d| d.name.value == usage.name);
            let Some(definition) = definition else {
                if reported.insert(usage.name) {
                    let tail = match operation.name() {
                        Some(op) => format!(" by operation \"{}\".", op),
                        None => ".".to_string(),
                    };
                    self.report(
                        format!("Variable \"${}\" is not defined{}", usage.name, tail),
                        &[usage.span, operation.span],
                    );
                }
                continue;
            };

            let Some((expected, location_default)) = usage.expected else { continue };
            let var_type = TypeRef::from(&definition.var_type.value);
            let schema = self.schema;
            if !schema.get_type(var_type.base_name()).is_some_and(NamedType::is_input) {
                continue;
            }
            let has_default = definition
                .default_value
                .as_ref()
                .is_some_and(|d| !matches!(d.value, InputValue::Null));

            let allowed = match (expected, &var_type) {
                (TypeRef::NonNull(inner), var) if !var.is_non_null() => {
                    (has_default || location_default) && is_subtype(var, inner)
                }
                _ => is_subtype(&var_type, expected),
            };
            if !allowed {
                self.report(
                    format!(
                        "Variable \"${}\" of type \"{}\" used in position expecting type \"{}\".",
                        usage.name, var_type, expected
                    ),
                    &[definition.span, usage.span],
                );
            }
        }

        for definition in &operation.variables {
            let name = definition.name.value.as_str();
            if !usages.iter().any(|u| u.name == name) {
                self.report(
                    format!("Variable \"${}\" is never used{}", name, suffix("in operation")),
                    &[definition.span],
                );
            }
        }
    }
}

fn is_subtype(maybe_sub: &TypeRef, sup: &TypeRef) -> bool {
    match (maybe_sub, sup) {
        (TypeRef::NonNull(a), TypeRef::NonNull(b)) => is_subtype(a, b),
        (_, TypeRef::NonNull(_)) => false,
        (TypeRef::NonNull(a), b) => is_subtype(a, b),
        (TypeRef::List(a), TypeRef::List(b)) => is_subtype(a, b),
        (TypeRef::List(_), _) | (_, TypeRef::List(_)) => false,
        (a, b) => a.base_name() == b.base_name(),
    }
}

fn collect_value_variables<'a>(value: &'a InputValue, span: Span, usages: &mut Vec<VariableUsage<'a>>) {
    let mut names = Vec::new();
    value.variables(&mut names);
    usages.extend(names.into_iter().map(|name| VariableUsage {
        name,
        span,
        expected: None,
    }));
}

fn collect_field_variables<'a>(field: &'a Field, usages: &mut Vec<VariableUsage<'a>>) {
    for argument in &field.arguments {
        collect_value_variables(&argument.value.value, argument.value.span, usages);
    }
}

fn collect_all_variables<'a>(selection_set: &'a SelectionSet, usages: &mut Vec<VariableUsage<'a>>) {
    for selection in &selection_set.selections {
        let field = selection.as_field();
        collect_field_variables(field, usages);
        if let Some(sub) = &field.selection_set {
            collect_all_variables(sub, usages);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArgumentDef, FieldDef, ScalarType};

    fn schema() -> Schema {
        let disturbance = ObjectType::new("Disturbance")
            .with_field(FieldDef::new("magnitude", TypeRef::scalar(ScalarType::Int)))
            .with_field(FieldDef::new("reason", TypeRef::scalar(ScalarType::String)));
        let subscription = ObjectType::new("Subscription")
            .with_field(
                FieldDef::new("disturbance", TypeRef::named("Disturbance"))
                    .with_argument(ArgumentDef::new("reason", TypeRef::scalar(ScalarType::String))),
            )
            .with_field(
                FieldDef::new("tremor", TypeRef::scalar(ScalarType::Int)).with_argument(ArgumentDef::new(
                    "planet",
                    TypeRef::scalar(ScalarType::String).non_null(),
                )),
            );
        let query = ObjectType::new("Query").with_field(FieldDef::new("ping", TypeRef::scalar(ScalarType::Boolean)));

        Schema::builder(query)
            .subscription(subscription)
            .register(disturbance)
            .finish()
            .unwrap()
    }

    fn messages(source: &str) -> Vec<String> {
        let doc = herald_lang::parse(source).unwrap();
        validate(&schema(), &doc).into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_valid_subscription() {
        let errors = messages(
            "subscription Watch($reason: String) { disturbance(reason: $reason) { magnitude reason } }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(
            messages("subscription { meow }"),
            vec!["Cannot query field \"meow\" on type \"Subscription\"."]
        );
    }

    #[test]
    fn test_single_root_field() {
        assert_eq!(
            messages("subscription Both { disturbance { magnitude } tremor(planet: \"Hoth\") }"),
            vec!["Subscription \"Both\" must select only one top level field."]
        );
        assert_eq!(
            messages("subscription { a: tremor(planet: \"Hoth\") b: tremor(planet: \"Dagobah\") }"),
            vec!["Anonymous Subscription must select only one top level field."]
        );
    }

    #[test]
    fn test_leaf_and_composite_selections() {
        assert_eq!(
            messages("subscription { disturbance }"),
            vec!["Field \"disturbance\" of type \"Disturbance\" must have a selection of subfields. Did you mean \"disturbance { ... }\"?"]
        );
        assert_eq!(
            messages("subscription { disturbance { magnitude { value } } }"),
            vec!["Field \"magnitude\" must not have a selection since type \"Int\" has no subfields."]
        );
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            messages("subscription { tremor }"),
            vec!["Field \"tremor\" argument \"planet\" of type \"String!\" is required, but it was not provided."]
        );
        assert_eq!(
            messages("subscription { tremor(planet: 5) }"),
            vec!["Argument \"planet\" has invalid value 5."]
        );
        assert_eq!(
            messages("subscription { tremor(planet: \"Hoth\", depth: 3) }"),
            vec!["Unknown argument \"depth\" on field \"tremor\" of type \"Subscription\"."]
        );
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            messages("subscription Watch { disturbance(reason: $why) { reason } }"),
            vec!["Variable \"$why\" is not defined by operation \"Watch\"."]
        );
        assert_eq!(
            messages("subscription ($why: String) { disturbance { reason } }"),
            vec!["Variable \"$why\" is never used."]
        );
        assert_eq!(
            messages("subscription ($p: String) { tremor(planet: $p) }"),
            vec!["Variable \"$p\" of type \"String\" used in position expecting type \"String!\"."]
        );
        assert!(messages("subscription ($p: String = \"Hoth\") { tremor(planet: $p) }").is_empty());
        assert_eq!(
            messages("subscription ($d: Disturbance) { disturbance(reason: $d) { reason } }"),
            vec!["Variable \"$d\" cannot be non-input type \"Disturbance\"."]
        );
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(
            messages("query A { ping } query A { ping }"),
            vec!["There can be only one operation named \"A\"."]
        );
        assert_eq!(
            messages("{ ping } query B { ping }"),
            vec!["This anonymous operation must be the only defined operation."]
        );
    }

    #[test]
    fn test_missing_root_type_is_not_a_validation_error() {
        let query = ObjectType::new("Query").with_field(FieldDef::new("ping", TypeRef::scalar(ScalarType::Boolean)));
        let schema = Schema::builder(query).finish().unwrap();
        let doc = herald_lang::parse("subscription { ping }").unwrap();
        assert!(validate(&schema, &doc).is_empty());
    }

    #[test]
    fn test_error_locations() {
        let doc = herald_lang::parse("subscription {\n  meow\n}").unwrap();
        let errors = validate(&schema(), &doc);
        assert_eq!(errors[0].locations, vec![Location { line: 2, column: 3 }]);
    }
}
