//! Argument and leaf-value coercion.
//!
//! Output coercion converts raw resolver values into the scalar or enum
//! representation a field declares. Argument coercion turns document
//! literals into plain JSON values, substituting variables and applying
//! declared defaults.

use crate::schema::{EnumDef, InputObjectDef, InputValueDef, Schema, TypeDef, TypeRef};
use graphwalk_document::{InputValue, Variables};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// A coercion failure. Reported by the executor as a field-level error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CoercionError(pub String);

/// Coerces a resolved value into the representation declared by a leaf type.
///
/// Built-in scalars follow the usual serialization rules; custom scalars
/// pass through untouched; enum values must name a declared member.
pub fn coerce_leaf(def: &TypeDef, value: Value) -> Result<Value, CoercionError> {
    match def {
        TypeDef::Scalar(scalar) => coerce_scalar(&scalar.name, value),
        TypeDef::Enum(enum_def) => coerce_enum(enum_def, value),
        other => Err(CoercionError(format!(
            "type '{}' is not a leaf type",
            other.name()
        ))),
    }
}

fn coerce_scalar(name: &str, value: Value) -> Result<Value, CoercionError> {
    match name {
        "Int" => match &value {
            Value::Number(n) => match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => Ok(value),
                _ => Err(CoercionError(format!(
                    "Int cannot represent value: {value}"
                ))),
            },
            _ => Err(CoercionError(format!(
                "Int cannot represent value: {value}"
            ))),
        },
        "Float" => match &value {
            Value::Number(n) if n.as_f64().is_some() => Ok(value),
            _ => Err(CoercionError(format!(
                "Float cannot represent value: {value}"
            ))),
        },
        "String" => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(CoercionError(format!(
                "String cannot represent value: {other}"
            ))),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(value),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            other => Err(CoercionError(format!(
                "Boolean cannot represent value: {other}"
            ))),
        },
        "ID" => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) if n.as_i64().is_some() => Ok(Value::String(n.to_string())),
            other => Err(CoercionError(format!(
                "ID cannot represent value: {other}"
            ))),
        },
        // Custom scalars pass through untouched.
        _ => Ok(value),
    }
}

fn coerce_enum(def: &EnumDef, value: Value) -> Result<Value, CoercionError> {
    match &value {
        Value::String(name) if def.has_value(name) => Ok(value),
        other => Err(CoercionError(format!(
            "enum '{}' cannot represent value: {}",
            def.name, other
        ))),
    }
}

/// Coerces provided arguments against a field's declared argument
/// definitions.
///
/// Variables substitute their pre-coerced values; absent arguments take the
/// declared default. A missing value for a non-null argument is an error.
pub fn coerce_arguments(
    schema: &Schema,
    definitions: &IndexMap<String, InputValueDef>,
    provided: &[(String, InputValue)],
    variables: &Variables,
) -> Result<HashMap<String, Value>, CoercionError> {
    let mut coerced = HashMap::new();
    for (name, def) in definitions {
        let literal = provided.iter().find(|(n, _)| n == name).map(|(_, v)| v);
        match coerce_provided(schema, def, literal, variables) {
            Ok(Some(value)) => {
                coerced.insert(name.clone(), value);
            }
            Ok(None) => {}
            Err(error) => return Err(CoercionError(format!("argument '{name}': {error}"))),
        }
    }
    Ok(coerced)
}

/// Coerces one provided value against an input definition, falling back to
/// the default. `Ok(None)` means the value stays absent.
fn coerce_provided(
    schema: &Schema,
    def: &InputValueDef,
    literal: Option<&InputValue>,
    variables: &Variables,
) -> Result<Option<Value>, CoercionError> {
    let resolved = match literal {
        None => None,
        // A referenced but unsupplied variable counts as not provided.
        Some(InputValue::Variable(name)) => variables.get(name).cloned(),
        Some(other) => Some(coerce_input(schema, &def.ty, other, variables)?),
    };

    match resolved {
        Some(value) => {
            if def.ty.is_non_null() && value.is_null() {
                return Err(CoercionError(format!(
                    "null provided for non-null type '{}'",
                    def.ty
                )));
            }
            Ok(Some(value))
        }
        None => match &def.default_value {
            Some(default) => Ok(Some(default.clone())),
            None if def.ty.is_non_null() => Err(CoercionError(format!(
                "missing required value of type '{}'",
                def.ty
            ))),
            None => Ok(None),
        },
    }
}

fn coerce_input(
    schema: &Schema,
    ty: &TypeRef,
    literal: &InputValue,
    variables: &Variables,
) -> Result<Value, CoercionError> {
    // Nested variable references substitute directly; absent ones are null.
    if let InputValue::Variable(name) = literal {
        let value = variables.get(name).cloned().unwrap_or(Value::Null);
        if ty.is_non_null() && value.is_null() {
            return Err(CoercionError(format!(
                "null provided for non-null type '{ty}'"
            )));
        }
        return Ok(value);
    }

    match ty {
        TypeRef::NonNull(inner) => {
            if literal.is_null() {
                return Err(CoercionError(format!(
                    "null provided for non-null type '{ty}'"
                )));
            }
            coerce_input(schema, inner, literal, variables)
        }
        TypeRef::List(inner) => match literal {
            InputValue::Null => Ok(Value::Null),
            InputValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(coerce_input(schema, inner, item, variables)?);
                }
                Ok(Value::Array(out))
            }
            // A single value coerces to a one-element list.
            single => Ok(Value::Array(vec![coerce_input(
                schema, inner, single, variables,
            )?])),
        },
        TypeRef::Named(name) => {
            if literal.is_null() {
                return Ok(Value::Null);
            }
            match schema.get_type(name) {
                Some(TypeDef::Scalar(scalar)) => {
                    coerce_input_scalar(&scalar.name, literal, variables)
                }
                Some(TypeDef::Enum(enum_def)) => match literal {
                    InputValue::Enum(value) if enum_def.has_value(value) => {
                        Ok(Value::String(value.clone()))
                    }
                    other => Err(CoercionError(format!(
                        "enum '{}' cannot represent value: {}",
                        enum_def.name,
                        literal_to_json(other, variables)
                    ))),
                },
                Some(TypeDef::InputObject(input_def)) => {
                    coerce_input_object(schema, input_def, literal, variables)
                }
                Some(other) => Err(CoercionError(format!(
                    "type '{}' cannot be used as input",
                    other.name()
                ))),
                None => Err(CoercionError(format!("unknown input type '{name}'"))),
            }
        }
    }
}

fn coerce_input_scalar(
    name: &str,
    literal: &InputValue,
    variables: &Variables,
) -> Result<Value, CoercionError> {
    match name {
        "Int" => match literal {
            InputValue::Int(i) if i32::try_from(*i).is_ok() => Ok(Value::from(*i)),
            other => Err(CoercionError(format!(
                "Int cannot represent value: {}",
                literal_to_json(other, variables)
            ))),
        },
        "Float" => match literal {
            InputValue::Float(f) => Ok(Value::from(*f)),
            #[allow(clippy::cast_precision_loss)]
            InputValue::Int(i) => Ok(Value::from(*i as f64)),
            other => Err(CoercionError(format!(
                "Float cannot represent value: {}",
                literal_to_json(other, variables)
            ))),
        },
        "String" => match literal {
            InputValue::String(s) => Ok(Value::String(s.clone())),
            other => Err(CoercionError(format!(
                "String cannot represent value: {}",
                literal_to_json(other, variables)
            ))),
        },
        "Boolean" => match literal {
            InputValue::Boolean(b) => Ok(Value::Bool(*b)),
            other => Err(CoercionError(format!(
                "Boolean cannot represent value: {}",
                literal_to_json(other, variables)
            ))),
        },
        "ID" => match literal {
            InputValue::String(s) => Ok(Value::String(s.clone())),
            InputValue::Int(i) => Ok(Value::String(i.to_string())),
            other => Err(CoercionError(format!(
                "ID cannot represent value: {}",
                literal_to_json(other, variables)
            ))),
        },
        // Custom scalars accept any literal shape.
        _ => Ok(literal_to_json(literal, variables)),
    }
}

fn coerce_input_object(
    schema: &Schema,
    def: &InputObjectDef,
    literal: &InputValue,
    variables: &Variables,
) -> Result<Value, CoercionError> {
    let InputValue::Object(fields) = literal else {
        return Err(CoercionError(format!(
            "input object '{}' requires an object value",
            def.name
        )));
    };

    // Unknown provided fields are ignored; validation is external.
    let mut out = serde_json::Map::new();
    for (name, field_def) in &def.fields {
        let provided = fields.iter().find(|(n, _)| n == name).map(|(_, v)| v);
        if let Some(value) = coerce_provided(schema, field_def, provided, variables)
            .map_err(|error| CoercionError(format!("field '{}.{name}': {error}", def.name)))?
        {
            out.insert(name.clone(), value);
        }
    }
    Ok(Value::Object(out))
}

fn literal_to_json(literal: &InputValue, variables: &Variables) -> Value {
    match literal {
        InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        InputValue::Int(i) => Value::from(*i),
        InputValue::Float(f) => Value::from(*f),
        InputValue::String(s) => Value::String(s.clone()),
        InputValue::Boolean(b) => Value::Bool(*b),
        InputValue::Null => Value::Null,
        InputValue::Enum(name) => Value::String(name.clone()),
        InputValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| literal_to_json(item, variables))
                .collect(),
        ),
        InputValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), literal_to_json(value, variables)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumDef, FieldDef, ObjectDef, ScalarDef, SchemaBuilder};
    use serde_json::json;

    fn test_schema() -> Schema {
        SchemaBuilder::new()
            .add_type(TypeDef::Scalar(ScalarDef::new("JSON")))
            .add_type(TypeDef::Enum(
                EnumDef::new("Color").add_value("RED").add_value("GREEN"),
            ))
            .add_type(TypeDef::InputObject(
                InputObjectDef::new("Filter")
                    .add_field(InputValueDef::new(
                        "name",
                        TypeRef::non_null(TypeRef::named("String")),
                    ))
                    .add_field(
                        InputValueDef::new("limit", TypeRef::named("Int")).with_default(10),
                    ),
            ))
            .add_type(TypeDef::Object(
                ObjectDef::new("Query").add_field(FieldDef::new("x", TypeRef::named("Int"))),
            ))
            .build()
    }

    fn args(defs: Vec<InputValueDef>) -> IndexMap<String, InputValueDef> {
        defs.into_iter()
            .map(|def| (def.name.clone(), def))
            .collect()
    }

    #[test]
    fn test_leaf_int() {
        let def = TypeDef::Scalar(ScalarDef::new("Int"));
        assert_eq!(coerce_leaf(&def, json!(42)).unwrap(), json!(42));
        assert!(coerce_leaf(&def, json!(1.5)).is_err());
        assert!(coerce_leaf(&def, json!("42")).is_err());
        // Out of 32-bit range.
        assert!(coerce_leaf(&def, json!(3_000_000_000_i64)).is_err());
    }

    #[test]
    fn test_leaf_float_accepts_integers() {
        let def = TypeDef::Scalar(ScalarDef::new("Float"));
        assert_eq!(coerce_leaf(&def, json!(1.5)).unwrap(), json!(1.5));
        assert_eq!(coerce_leaf(&def, json!(3)).unwrap(), json!(3));
        assert!(coerce_leaf(&def, json!("nope")).is_err());
    }

    #[test]
    fn test_leaf_string_conversions() {
        let def = TypeDef::Scalar(ScalarDef::new("String"));
        assert_eq!(coerce_leaf(&def, json!("hi")).unwrap(), json!("hi"));
        assert_eq!(coerce_leaf(&def, json!(3)).unwrap(), json!("3"));
        assert_eq!(coerce_leaf(&def, json!(true)).unwrap(), json!("true"));
        assert!(coerce_leaf(&def, json!({})).is_err());
    }

    #[test]
    fn test_leaf_id_from_int() {
        let def = TypeDef::Scalar(ScalarDef::new("ID"));
        assert_eq!(coerce_leaf(&def, json!("abc")).unwrap(), json!("abc"));
        assert_eq!(coerce_leaf(&def, json!(7)).unwrap(), json!("7"));
        assert!(coerce_leaf(&def, json!(1.5)).is_err());
    }

    #[test]
    fn test_leaf_custom_scalar_passthrough() {
        let def = TypeDef::Scalar(ScalarDef::new("JSON"));
        let blob = json!({"nested": [1, 2, 3]});
        assert_eq!(coerce_leaf(&def, blob.clone()).unwrap(), blob);
    }

    #[test]
    fn test_leaf_enum_membership() {
        let def = TypeDef::Enum(EnumDef::new("Color").add_value("RED").add_value("GREEN"));
        assert_eq!(coerce_leaf(&def, json!("RED")).unwrap(), json!("RED"));
        assert!(coerce_leaf(&def, json!("BLUE")).is_err());
        assert!(coerce_leaf(&def, json!(1)).is_err());
    }

    #[test]
    fn test_arguments_literal_and_default() {
        let schema = test_schema();
        let defs = args(vec![
            InputValueDef::new("first", TypeRef::named("Int")).with_default(5),
            InputValueDef::new("label", TypeRef::named("String")),
        ]);
        let provided = vec![("label".to_string(), InputValue::from("hi"))];

        let coerced = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap();
        assert_eq!(coerced.get("first"), Some(&json!(5)));
        assert_eq!(coerced.get("label"), Some(&json!("hi")));
    }

    #[test]
    fn test_arguments_missing_required() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new(
            "id",
            TypeRef::non_null(TypeRef::named("ID")),
        )]);

        let error = coerce_arguments(&schema, &defs, &[], &Variables::new()).unwrap_err();
        assert!(error.to_string().contains("id"));
    }

    #[test]
    fn test_arguments_variable_substitution() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new(
            "first",
            TypeRef::non_null(TypeRef::named("Int")),
        )]);
        let provided = vec![("first".to_string(), InputValue::variable("count"))];

        let mut variables = Variables::new();
        variables.insert("count".to_string(), json!(3));
        let coerced = coerce_arguments(&schema, &defs, &provided, &variables).unwrap();
        assert_eq!(coerced.get("first"), Some(&json!(3)));

        // Unsupplied variable for a non-null argument without default.
        let error = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap_err();
        assert!(error.to_string().contains("first"));
    }

    #[test]
    fn test_arguments_null_for_non_null() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new(
            "id",
            TypeRef::non_null(TypeRef::named("ID")),
        )]);
        let provided = vec![("id".to_string(), InputValue::Null)];

        assert!(coerce_arguments(&schema, &defs, &provided, &Variables::new()).is_err());
    }

    #[test]
    fn test_arguments_single_value_wraps_to_list() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new(
            "ids",
            TypeRef::list(TypeRef::named("Int")),
        )]);
        let provided = vec![("ids".to_string(), InputValue::Int(1))];

        let coerced = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap();
        assert_eq!(coerced.get("ids"), Some(&json!([1])));
    }

    #[test]
    fn test_arguments_list_elements() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new(
            "ids",
            TypeRef::list(TypeRef::named("Int")),
        )]);
        let provided = vec![("ids".to_string(), InputValue::from(vec![1, 2, 3]))];

        let coerced = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap();
        assert_eq!(coerced.get("ids"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_arguments_enum_literal() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new("color", TypeRef::named("Color"))]);

        let provided = vec![("color".to_string(), InputValue::enum_value("RED"))];
        let coerced = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap();
        assert_eq!(coerced.get("color"), Some(&json!("RED")));

        let provided = vec![("color".to_string(), InputValue::enum_value("BLUE"))];
        assert!(coerce_arguments(&schema, &defs, &provided, &Variables::new()).is_err());
    }

    #[test]
    fn test_arguments_input_object() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new("filter", TypeRef::named("Filter"))]);
        let provided = vec![(
            "filter".to_string(),
            InputValue::Object(vec![("name".to_string(), InputValue::from("ada"))]),
        )];

        let coerced = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap();
        // Declared default for `limit` fills in.
        assert_eq!(
            coerced.get("filter"),
            Some(&json!({"name": "ada", "limit": 10}))
        );
    }

    #[test]
    fn test_arguments_input_object_missing_required_field() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new("filter", TypeRef::named("Filter"))]);
        let provided = vec![(
            "filter".to_string(),
            InputValue::Object(vec![("limit".to_string(), InputValue::Int(1))]),
        )];

        let error = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap_err();
        assert!(error.to_string().contains("Filter.name"));
    }

    #[test]
    fn test_arguments_int_range() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new("n", TypeRef::named("Int"))]);
        let provided = vec![("n".to_string(), InputValue::Int(3_000_000_000))];

        assert!(coerce_arguments(&schema, &defs, &provided, &Variables::new()).is_err());
    }

    #[test]
    fn test_arguments_custom_scalar_literal() {
        let schema = test_schema();
        let defs = args(vec![InputValueDef::new("blob", TypeRef::named("JSON"))]);
        let provided = vec![(
            "blob".to_string(),
            InputValue::Object(vec![("k".to_string(), InputValue::from(vec![1, 2]))]),
        )];

        let coerced = coerce_arguments(&schema, &defs, &provided, &Variables::new()).unwrap();
        assert_eq!(coerced.get("blob"), Some(&json!({"k": [1, 2]})));
    }
}
