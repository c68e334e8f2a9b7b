#![deny(missing_docs)]

//! # Document Loading
//!
//! Parses raw JSON/YAML text and recognizes which dialect a document is written in.

use crate::error::{AppError, AppResult};
use serde_json::Value;
use std::fmt;

/// The supported input dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Swagger / OpenAPI 2.0 (`swagger`, `definitions`).
    OpenApi2,
    /// OpenAPI 3.0.x (`openapi`, `components`).
    OpenApi3,
    /// Postman Collection v2.1 (`info`, `item`).
    Postman,
}

impl Dialect {
    /// Whether documents of this dialect carry `$ref` pointers worth resolving.
    pub fn has_references(&self) -> bool {
        !matches!(self, Dialect::Postman)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::OpenApi2 => write!(f, "OpenAPI 2.0"),
            Dialect::OpenApi3 => write!(f, "OpenAPI 3.0"),
            Dialect::Postman => write!(f, "Postman Collection v2.1"),
        }
    }
}

/// Parses JSON or YAML text into a document value.
///
/// Text that looks like JSON is attempted as JSON first. YAML is a superset, so
/// a flow mapping such as `{openapi: 3.0.3}` still parses; when both fail the
/// JSON error is reported.
pub fn parse_document(text: &str) -> AppResult<Value> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(text).or_else(|json_err| {
            serde_yaml::from_str(text).map_err(|_| {
                AppError::Parse(format!("Failed to parse JSON document: {}", json_err))
            })
        });
    }
    serde_yaml::from_str(text)
        .map_err(|e| AppError::Parse(format!("Failed to parse YAML document: {}", e)))
}

/// Determines the dialect of a parsed document.
///
/// Fails with [`AppError::InvalidSpecification`] when the document matches none.
pub fn detect_dialect(document: &Value) -> AppResult<Dialect> {
    let Some(root) = document.as_object() else {
        return Err(AppError::InvalidSpecification(
            "document root is not an object".into(),
        ));
    };

    if root.contains_key("components") || root.contains_key("openapi") {
        return Ok(Dialect::OpenApi3);
    }
    if root.contains_key("definitions") || root.contains_key("swagger") {
        return Ok(Dialect::OpenApi2);
    }
    if root.get("info").is_some_and(Value::is_object)
        && root.get("item").is_some_and(Value::is_array)
    {
        return Ok(Dialect::Postman);
    }

    Err(AppError::InvalidSpecification(
        "expected an OpenAPI 2.0/3.0 document or a Postman v2.1 collection".into(),
    ))
}

/// The document title: `info.title` for OpenAPI, `info.name` for Postman.
pub fn document_title(document: &Value, dialect: Dialect) -> String {
    let key = match dialect {
        Dialect::Postman => "name",
        Dialect::OpenApi2 | Dialect::OpenApi3 => "title",
    };
    document
        .get("info")
        .and_then(|info| info.get(key))
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or("Untitled")
        .to_string()
}

/// The document-level description, or an empty string.
pub fn document_description(document: &Value) -> String {
    document
        .get("info")
        .and_then(|info| info.get("description"))
        .map(text_or_content)
        .unwrap_or_default()
}

/// Reads a description that is either a string or a `{ "content": ... }` object.
pub(crate) fn text_or_content(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}
