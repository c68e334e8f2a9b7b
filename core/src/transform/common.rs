#![deny(missing_docs)]

//! # Shared Transformer Helpers
//!
//! Grouping, URL templating, parameter routing, security wiring and body
//! construction used by the OpenAPI transformers.

use crate::model::{
    ApiKeyPlacement, AuditStamp, BodyMode, CollectionItem, FormDataFile, ItemType, KeyValue,
    RequestAuth, RequestMetaData,
};
use crate::oas::example::{example_as_text, flatten_properties, schema_type, synthesize};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Folder key used when an operation declares no tag.
pub const DEFAULT_FOLDER: &str = "default";

/// Base URL used when the document declares no host or server.
pub const FALLBACK_BASE_URL: &str = "http://localhost:{{port}}";

/// Transformer output: folder key -> folder item, in first-seen order.
pub type FolderMap = IndexMap<String, CollectionItem>;

/// Document-wide values every operation of an OpenAPI document needs.
pub(crate) struct OperationContext<'a> {
    /// `components.securitySchemes` or `securityDefinitions`.
    pub schemes: Option<&'a Value>,
    /// Document-level `security`.
    pub security: Option<&'a Value>,
    /// Tag name -> tag description.
    pub tag_descriptions: HashMap<String, String>,
    /// Audit stamp for every created node.
    pub stamp: &'a AuditStamp,
}

impl<'a> OperationContext<'a> {
    pub(crate) fn new(
        document: &'a Value,
        schemes: Option<&'a Value>,
        stamp: &'a AuditStamp,
    ) -> Self {
        Self {
            schemes,
            security: document.get("security"),
            tag_descriptions: tag_descriptions(document),
            stamp,
        }
    }

    /// Adds `item` to the folder for `key`, creating the folder on first use.
    pub(crate) fn insert(&self, folders: &mut FolderMap, key: &str, item: CollectionItem) {
        folders
            .entry(key.to_string())
            .or_insert_with(|| {
                let description = self.tag_descriptions.get(key).cloned().unwrap_or_default();
                CollectionItem::folder(key, self.stamp).with_description(description)
            })
            .items
            .push(item);
    }
}

fn tag_descriptions(document: &Value) -> HashMap<String, String> {
    document
        .get("tags")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|tag| {
            let name = tag.get("name")?.as_str()?;
            let description = tag.get("description").and_then(Value::as_str)?;
            Some((name.to_string(), description.to_string()))
        })
        .collect()
}

/// First declared tag, else [`DEFAULT_FOLDER`].
pub(crate) fn grouping_key(operation: &Value) -> String {
    operation
        .get("tags")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .filter(|tag| !tag.is_empty())
        .unwrap_or(DEFAULT_FOLDER)
        .to_string()
}

/// `summary`, else `operationId`, else the raw path.
pub(crate) fn operation_name(operation: &Value, path: &str) -> String {
    ["summary", "operationId"]
        .iter()
        .filter_map(|key| operation.get(*key).and_then(Value::as_str))
        .find(|name| !name.trim().is_empty())
        .unwrap_or(path)
        .to_string()
}

pub(crate) fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// A path split into its URL and the parameter rows its template implies.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct PathTemplate {
    pub url: String,
    pub path_params: Vec<KeyValue>,
    pub query_params: Vec<KeyValue>,
}

/// Records `{name}` placeholders of `raw` as path params.
///
/// With `inline_query`, a segment carrying `key=value` pairs is also read as
/// example query parameters. The URL text itself is kept as declared.
pub(crate) fn template_path(raw: &str, inline_query: bool) -> PathTemplate {
    let mut template = PathTemplate {
        url: raw.to_string(),
        ..PathTemplate::default()
    };

    for segment in raw.split('/') {
        let mut rest = segment;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let name = &rest[open + 1..open + close];
            if !name.is_empty() && !template.path_params.iter().any(|p| p.key == name) {
                template.path_params.push(KeyValue::new(name, ""));
            }
            rest = &rest[open + close + 1..];
        }

        if inline_query && segment.contains('=') {
            let query = segment.split_once('?').map_or(segment, |(_, q)| q);
            for pair in query.split('&') {
                if let Some((key, value)) = pair.split_once('=') {
                    if !key.is_empty() {
                        template.query_params.push(KeyValue::new(key, value));
                    }
                }
            }
        }
    }

    template
}

/// Prefixes every request URL in the tree with `base`.
pub(crate) fn apply_base_url(items: &mut [CollectionItem], base: &str) {
    for item in items {
        match item.item_type {
            ItemType::Folder => apply_base_url(&mut item.items, base),
            ItemType::Request => {
                if let Some(request) = item.request.as_mut() {
                    request.url = join_url(base, &request.url);
                }
            }
            ItemType::WebSocket => {}
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Merges path-level and operation-level parameter lists.
///
/// An operation parameter replaces a path-level one with the same `name` and `in`.
pub(crate) fn merge_parameters(path_level: Option<&Value>, operation: Option<&Value>) -> Vec<Value> {
    let identity = |p: &Value| (str_field(p, "name"), str_field(p, "in"));

    let mut merged: Vec<Value> = path_level
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for param in operation.and_then(Value::as_array).into_iter().flatten() {
        let id = identity(param);
        match merged.iter_mut().find(|existing| identity(&**existing) == id) {
            Some(existing) => *existing = param.clone(),
            None => merged.push(param.clone()),
        }
    }
    merged
}

/// The example text of a parameter (`example`, `x-example`, or its schema's example).
pub(crate) fn parameter_value(param: &Value) -> String {
    if let Some(example) = param
        .get("example")
        .or_else(|| param.get("x-example"))
        .or_else(|| param.get("default"))
    {
        return example_as_text(example);
    }
    match param.get("schema") {
        Some(schema) if declares_example(schema) => example_as_text(&synthesize(schema, true)),
        _ => String::new(),
    }
}

fn declares_example(schema: &Value) -> bool {
    schema.as_object().is_some_and(|node| {
        ["example", "default", "enum"]
            .iter()
            .any(|key| node.contains_key(*key))
    })
}

/// Routes a parameter into headers, query params or path params by its `in`.
///
/// Returns false for locations this helper does not own (`body`, `formData`, `cookie`).
pub(crate) fn route_parameter(request: &mut RequestMetaData, param: &Value) -> bool {
    let name = str_field(param, "name");
    if name.is_empty() {
        debug!("Skipping parameter without a name");
        return true;
    }
    let value = parameter_value(param);

    match param.get("in").and_then(Value::as_str).unwrap_or_default() {
        "header" => request.headers.push(KeyValue::new(name, value)),
        "query" => request.query_params.push(KeyValue::new(name, value)),
        "path" => match request.path_params.iter_mut().find(|p| p.key == name) {
            Some(existing) => {
                if existing.value.is_empty() {
                    existing.value = value;
                }
            }
            None => request.path_params.push(KeyValue::new(name, value)),
        },
        _ => return false,
    }
    true
}

/// Wires security requirements into auth, headers and query params.
///
/// `requirements` is a list of `{ schemeName: [scopes] }` objects. The first
/// supported scheme decides the auth variant; every `apiKey` scheme also adds
/// its header or query placeholder.
pub(crate) fn apply_security(
    request: &mut RequestMetaData,
    requirements: Option<&Value>,
    schemes: Option<&Value>,
) {
    let names = requirements
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|requirement| requirement.keys());

    for name in names {
        let Some(scheme) = schemes.and_then(|s| s.get(name)) else {
            warn!(scheme = %name, "Security requirement references an undefined scheme");
            continue;
        };

        let auth = match str_field(scheme, "type").as_str() {
            "apiKey" => api_key_auth(request, scheme),
            "basic" => Some(basic_auth()),
            "http" => match str_field(scheme, "scheme").to_ascii_lowercase().as_str() {
                "basic" => Some(basic_auth()),
                "bearer" => Some(RequestAuth::Bearer {
                    token: String::new(),
                }),
                other => {
                    warn!(scheme = %name, "Unsupported HTTP auth scheme '{}'", other);
                    None
                }
            },
            other => {
                warn!(scheme = %name, "Unsupported security scheme type '{}'", other);
                None
            }
        };

        if let Some(auth) = auth {
            if request.auth == RequestAuth::None {
                request.auth = auth;
            }
        }
    }
}

fn basic_auth() -> RequestAuth {
    RequestAuth::Basic {
        username: String::new(),
        password: String::new(),
    }
}

fn api_key_auth(request: &mut RequestMetaData, scheme: &Value) -> Option<RequestAuth> {
    let key = str_field(scheme, "name");
    let add_to = match scheme.get("in").and_then(Value::as_str) {
        Some("query") => {
            request.query_params.push(KeyValue::new(key.clone(), ""));
            ApiKeyPlacement::QueryParameter
        }
        Some("header") | None => {
            request.headers.push(KeyValue::new(key.clone(), ""));
            ApiKeyPlacement::Header
        }
        Some(other) => {
            warn!("Unsupported API key location '{}'", other);
            return None;
        }
    };
    Some(RequestAuth::ApiKey {
        auth_key: key,
        auth_value: String::new(),
        add_to,
    })
}

/// Body shapes the transformers know how to pre-fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
    OctetStream,
}

impl BodyKind {
    /// Classifies a media type, ignoring parameters such as `charset`.
    pub(crate) fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(Self::Json),
            ct if ct.starts_with("application/") && ct.ends_with("+json") => Some(Self::Json),
            "application/x-www-form-urlencoded" => Some(Self::UrlEncoded),
            "multipart/form-data" => Some(Self::Multipart),
            "application/octet-stream" => Some(Self::OctetStream),
            _ => None,
        }
    }

    /// Preference when several content types are declared.
    fn rank(&self) -> u8 {
        match self {
            Self::Json => 0,
            Self::UrlEncoded => 1,
            Self::Multipart => 2,
            Self::OctetStream => 3,
        }
    }
}

/// Picks the preferred known media type out of a `content` map.
pub(crate) fn select_media(content: &Map<String, Value>) -> Option<(BodyKind, &Value)> {
    content
        .iter()
        .filter_map(|(ct, media)| BodyKind::from_content_type(ct).map(|kind| (kind, media)))
        .min_by_key(|(kind, _)| kind.rank())
}

/// Fills the body of `request` for `kind` from `schema` (or an explicit example).
pub(crate) fn fill_body(
    request: &mut RequestMetaData,
    kind: BodyKind,
    schema: Option<&Value>,
    example: Option<&Value>,
) {
    let schema = schema.unwrap_or(&Value::Null);
    match kind {
        BodyKind::Json => {
            let value = match example {
                Some(example) => example.clone(),
                None => synthesize(schema, true),
            };
            request.body.raw = serde_json::to_string_pretty(&value).unwrap_or_default();
            request.selected_request_body_type = BodyMode::Json;
        }
        BodyKind::UrlEncoded => {
            request.body.urlencoded = flatten_properties(schema)
                .iter()
                .map(|(name, prop)| KeyValue::new(name.clone(), property_text(prop)))
                .collect();
            request.selected_request_body_type = BodyMode::UrlEncoded;
        }
        BodyKind::Multipart => {
            for (name, prop) in &flatten_properties(schema) {
                if is_binary(prop) {
                    request.body.formdata.file.push(FormDataFile::new(name.clone()));
                } else if is_text_part(prop) {
                    request
                        .body
                        .formdata
                        .text
                        .push(KeyValue::new(name.clone(), property_text(prop)));
                }
            }
            request.selected_request_body_type = BodyMode::FormData;
        }
        BodyKind::OctetStream => {
            request.body.formdata.file.push(FormDataFile::new(""));
            request.selected_request_body_type = BodyMode::FormData;
        }
    }
}

/// Text cell for a form property: its declared example, else empty.
fn property_text(prop: &Value) -> String {
    if declares_example(prop) {
        example_as_text(&synthesize(prop, true))
    } else {
        String::new()
    }
}

/// Multipart text parts carry strings and objects; untyped properties count as text.
fn is_text_part(prop: &Value) -> bool {
    prop.as_object()
        .map_or(true, |node| matches!(schema_type(node), None | Some("string" | "object")))
}

/// `format: binary`, a Swagger `type: file`, or an array of either.
pub(crate) fn is_binary(prop: &Value) -> bool {
    let Some(node) = prop.as_object() else {
        return false;
    };
    if node.get("format").and_then(Value::as_str) == Some("binary") {
        return true;
    }
    match schema_type(node) {
        Some("file") => true,
        Some("array") => node.get("items").is_some_and(is_binary),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_grouping_key() {
        assert_eq!(grouping_key(&json!({ "tags": ["pet", "store"] })), "pet");
        assert_eq!(grouping_key(&json!({ "tags": [] })), "default");
        assert_eq!(grouping_key(&json!({})), "default");
    }

    #[test]
    fn test_template_path_records_placeholders() {
        let template = template_path("/users/{userId}/files/{fileId}.json", false);
        assert_eq!(template.url, "/users/{userId}/files/{fileId}.json");
        assert_eq!(
            template.path_params,
            vec![KeyValue::new("userId", ""), KeyValue::new("fileId", "")]
        );
        assert!(template.query_params.is_empty());
    }

    #[test]
    fn test_template_path_inline_query() {
        let template = template_path("/pets/findByStatus?status=sold&limit=10", true);
        assert_eq!(
            template.query_params,
            vec![KeyValue::new("status", "sold"), KeyValue::new("limit", "10")]
        );

        let ignored = template_path("/pets/findByStatus?status=sold", false);
        assert!(ignored.query_params.is_empty());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://api.io/v1/", "/pets"), "https://api.io/v1/pets");
        assert_eq!(join_url("https://api.io", "pets"), "https://api.io/pets");
        assert_eq!(join_url("https://api.io", ""), "https://api.io");
    }

    #[test]
    fn test_merge_parameters_operation_wins() {
        let path_level = json!([
            { "name": "id", "in": "path", "description": "path-level" },
            { "name": "trace", "in": "header" }
        ]);
        let op_level = json!([
            { "name": "id", "in": "path", "description": "op-level" },
            { "name": "id", "in": "query" }
        ]);
        let merged = merge_parameters(Some(&path_level), Some(&op_level));
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0]["description"], json!("op-level"));
    }

    #[test]
    fn test_route_parameter_by_location() {
        let mut req = RequestMetaData::new(HttpMethod::Get, "/pets/{id}");
        req.path_params.push(KeyValue::new("id", ""));

        assert!(route_parameter(&mut req, &json!({ "name": "X-Req", "in": "header" })));
        assert!(route_parameter(
            &mut req,
            &json!({ "name": "limit", "in": "query", "schema": { "type": "integer", "default": 20 } })
        ));
        assert!(route_parameter(&mut req, &json!({ "name": "id", "in": "path", "example": 7 })));
        assert!(!route_parameter(&mut req, &json!({ "name": "body", "in": "body" })));

        assert_eq!(req.headers, vec![KeyValue::new("X-Req", "")]);
        assert_eq!(req.query_params, vec![KeyValue::new("limit", "20")]);
        assert_eq!(req.path_params, vec![KeyValue::new("id", "7")]);
    }

    #[test]
    fn test_apply_security_api_key_header_and_query() {
        let schemes = json!({
            "headerKey": { "type": "apiKey", "name": "X-API-KEY", "in": "header" },
            "queryKey": { "type": "apiKey", "name": "api_key", "in": "query" }
        });
        let mut req = RequestMetaData::new(HttpMethod::Get, "/");
        apply_security(&mut req, Some(&json!([{ "queryKey": [] }])), Some(&schemes));
        assert_eq!(req.query_params, vec![KeyValue::new("api_key", "")]);
        assert_eq!(
            req.auth,
            RequestAuth::ApiKey {
                auth_key: "api_key".into(),
                auth_value: String::new(),
                add_to: ApiKeyPlacement::QueryParameter,
            }
        );

        let mut req = RequestMetaData::new(HttpMethod::Get, "/");
        apply_security(&mut req, Some(&json!([{ "headerKey": [] }])), Some(&schemes));
        assert_eq!(req.headers, vec![KeyValue::new("X-API-KEY", "")]);
    }

    #[test]
    fn test_apply_security_http_schemes() {
        let schemes = json!({
            "bearer": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
            "oauth": { "type": "oauth2", "flows": {} }
        });
        let mut req = RequestMetaData::new(HttpMethod::Get, "/");
        apply_security(
            &mut req,
            Some(&json!([{ "oauth": ["read"] }, { "bearer": [] }])),
            Some(&schemes),
        );
        assert_eq!(req.auth, RequestAuth::Bearer { token: String::new() });
    }

    #[test]
    fn test_select_media_prefers_json() {
        let content = json!({
            "application/xml": {},
            "multipart/form-data": { "schema": {} },
            "application/json; charset=utf-8": { "schema": {} }
        });
        let (kind, _) = select_media(content.as_object().unwrap()).unwrap();
        assert_eq!(kind, BodyKind::Json);

        let content = json!({ "text/plain": {} });
        assert!(select_media(content.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_fill_body_multipart_splits_files() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "example": "report" },
                "meta": { "type": "object" },
                "upload": { "type": "string", "format": "binary" }
            }
        });
        let mut req = RequestMetaData::new(HttpMethod::Post, "/upload");
        fill_body(&mut req, BodyKind::Multipart, Some(&schema), None);
        assert_eq!(req.selected_request_body_type, BodyMode::FormData);
        assert_eq!(
            req.body.formdata.text,
            vec![KeyValue::new("name", "report"), KeyValue::new("meta", "")]
        );
        assert_eq!(req.body.formdata.file, vec![FormDataFile::new("upload")]);
    }

    #[test]
    fn test_fill_body_multipart_skips_scalar_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "count": { "type": "integer" },
                "flag": { "type": "boolean" },
                "name": { "type": "string" },
                "note": {}
            }
        });
        let mut req = RequestMetaData::new(HttpMethod::Post, "/upload");
        fill_body(&mut req, BodyKind::Multipart, Some(&schema), None);
        let names: Vec<_> = req.body.formdata.text.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(names, vec!["name", "note"]);
        assert!(req.body.formdata.file.is_empty());
    }

    #[test]
    fn test_fill_body_json_serializes_example_object() {
        let schema = json!({ "type": "object", "properties": { "id": { "type": "integer" } } });
        let mut req = RequestMetaData::new(HttpMethod::Post, "/pets");
        fill_body(&mut req, BodyKind::Json, Some(&schema), None);
        let parsed: Value = serde_json::from_str(&req.body.raw).unwrap();
        assert_eq!(parsed, json!({ "id": 0 }));
        assert_eq!(req.selected_request_body_type, BodyMode::Json);
    }

    #[test]
    fn test_fill_body_octet_stream() {
        let mut req = RequestMetaData::new(HttpMethod::Put, "/blob");
        fill_body(&mut req, BodyKind::OctetStream, None, None);
        assert_eq!(req.body.formdata.file, vec![FormDataFile::new("")]);
    }
}
