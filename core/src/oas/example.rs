#![deny(missing_docs)]

//! # Example Synthesis
//!
//! Builds a representative value from a JSON-schema-like node so request
//! bodies can be pre-filled. Nothing here validates; every input yields a value.

use serde_json::{Map, Number, Value};

/// Produces an example value for `schema`.
///
/// With `prefer_example`, an explicit `example`, then `default`, then the
/// first `enum` entry wins over synthesis. Otherwise the declared `type`
/// decides: string `""`, number/integer `0`, boolean `false`, array `[]`,
/// object a map of its synthesized properties, anything else `""`.
pub fn synthesize(schema: &Value, prefer_example: bool) -> Value {
    let Value::Object(node) = schema else {
        return Value::String(String::new());
    };

    if prefer_example {
        if let Some(example) = declared_example(node) {
            return example.clone();
        }
    }

    if let Some(branches) = node.get("allOf").and_then(Value::as_array) {
        let mut merged = Map::new();
        for branch in branches {
            if let Value::Object(fields) = synthesize(branch, prefer_example) {
                merged.extend(fields);
            }
        }
        merged.extend(synthesize_properties(node, prefer_example));
        return Value::Object(merged);
    }

    if let Some(first) = first_alternative(node) {
        return synthesize(first, prefer_example);
    }

    match schema_type(node) {
        Some("string") => Value::String(String::new()),
        Some("number") | Some("integer") => Value::Number(Number::from(0)),
        Some("boolean") => Value::Bool(false),
        Some("array") => Value::Array(Vec::new()),
        Some("object") => Value::Object(synthesize_properties(node, prefer_example)),
        _ => Value::String(String::new()),
    }
}

/// Flattens the properties of `schema` into one ordered map.
///
/// `allOf` branches contribute all their properties, `oneOf`/`anyOf` only the
/// first branch. Used for form-shaped bodies where each property becomes a row.
pub fn flatten_properties(schema: &Value) -> Map<String, Value> {
    let Value::Object(node) = schema else {
        return Map::new();
    };

    let mut props = Map::new();
    if let Some(branches) = node.get("allOf").and_then(Value::as_array) {
        for branch in branches {
            props.extend(flatten_properties(branch));
        }
    }
    if let Some(first) = first_alternative(node) {
        props.extend(flatten_properties(first));
    }
    if let Some(own) = node.get("properties").and_then(Value::as_object) {
        props.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    props
}

/// The effective `type` keyword of a schema node.
///
/// Handles OpenAPI 3.1 type arrays and infers `object` from `properties`.
pub fn schema_type(node: &Map<String, Value>) -> Option<&str> {
    match node.get("type") {
        Some(Value::String(ty)) => Some(ty.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ if node.contains_key("properties") => Some("object"),
        _ => None,
    }
}

/// Renders an example value as a single form/parameter cell.
pub fn example_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn declared_example(node: &Map<String, Value>) -> Option<&Value> {
    node.get("example")
        .filter(|v| !v.is_null())
        .or_else(|| node.get("default").filter(|v| !v.is_null()))
        .or_else(|| {
            node.get("enum")
                .and_then(Value::as_array)
                .and_then(|values| values.first())
        })
}

fn first_alternative(node: &Map<String, Value>) -> Option<&Value> {
    node.get("oneOf")
        .or_else(|| node.get("anyOf"))
        .and_then(Value::as_array)
        .and_then(|branches| branches.first())
}

fn synthesize_properties(node: &Map<String, Value>, prefer_example: bool) -> Map<String, Value> {
    node.get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), synthesize(prop, prefer_example)))
                .collect()
        })
        .unwrap_or_default()
}
