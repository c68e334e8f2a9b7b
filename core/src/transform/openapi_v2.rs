#![deny(missing_docs)]

//! # OpenAPI 2.0 (Swagger) Transformer
//!
//! Same folder/request shape as the OpenAPI 3 transformer, with the Swagger
//! differences: bodies come from `in: body` / `in: formData` parameters,
//! security schemes live under `securityDefinitions`, the base URL is
//! `scheme://host + basePath`, and a path segment holding `key=value` pairs is
//! read as example query parameters.

use crate::error::{AppError, AppResult};
use crate::model::{
    AuditStamp, BodyMode, CollectionItem, FormDataFile, HttpMethod, KeyValue, RequestMetaData,
};
use crate::transform::common::{
    apply_base_url, apply_security, fill_body, grouping_key, is_binary, merge_parameters,
    operation_name, parameter_value, route_parameter, str_field, template_path, BodyKind,
    FolderMap, OperationContext, FALLBACK_BASE_URL,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Transforms a (reference-resolved) Swagger 2.0 document into tag folders.
pub fn transform(document: &Value, stamp: &AuditStamp) -> AppResult<FolderMap> {
    let root = document
        .as_object()
        .filter(|root| root.contains_key("definitions") || root.contains_key("swagger"))
        .ok_or_else(|| AppError::InvalidSpecification("not an OpenAPI 2 document".into()))?;

    let ctx = OperationContext::new(document, document.get("securityDefinitions"), stamp);
    let consumes = document.get("consumes");
    let mut folders = FolderMap::new();

    for (path, path_item) in root.get("paths").and_then(Value::as_object).into_iter().flatten() {
        if path.starts_with("x-") {
            continue;
        }
        let Some(operations) = path_item.as_object() else {
            warn!(path = %path, "Skipping malformed path item");
            continue;
        };

        for (key, operation) in operations {
            let Some(method) = HttpMethod::parse(key) else {
                continue;
            };
            if !operation.is_object() {
                warn!(path = %path, method = %method, "Skipping malformed operation");
                continue;
            }

            let consumes = operation.get("consumes").or(consumes);
            let item = build_request(
                path,
                method,
                operation,
                path_item.get("parameters"),
                consumes,
                &ctx,
            );
            let folder = grouping_key(operation);
            debug!(path = %path, method = %method, folder = %folder, "Transformed operation");
            ctx.insert(&mut folders, &folder, item);
        }
    }

    let base = base_url(document);
    for folder in folders.values_mut() {
        apply_base_url(&mut folder.items, &base);
    }

    Ok(folders)
}

fn build_request(
    path: &str,
    method: HttpMethod,
    operation: &Value,
    path_parameters: Option<&Value>,
    consumes: Option<&Value>,
    ctx: &OperationContext<'_>,
) -> CollectionItem {
    let template = template_path(path, true);
    let mut request = RequestMetaData::new(method, template.url);
    request.operation_id = str_field(operation, "operationId");
    request.path_params = template.path_params;
    request.query_params = template.query_params;

    let mut form_params = Vec::new();
    for param in merge_parameters(path_parameters, operation.get("parameters")) {
        if route_parameter(&mut request, &param) {
            continue;
        }
        match param.get("in").and_then(Value::as_str) {
            Some("body") => {
                if let Some(schema) = param.get("schema") {
                    fill_body(&mut request, BodyKind::Json, Some(schema), None);
                }
            }
            Some("formData") => form_params.push(param),
            other => debug!(path, location = ?other, "Parameter location not mapped"),
        }
    }

    if !form_params.is_empty() {
        fill_form_body(&mut request, &form_params, consumes);
    }

    let security = operation.get("security").or(ctx.security);
    apply_security(&mut request, security, ctx.schemes);
    request.fill_placeholders();

    CollectionItem::request(operation_name(operation, path), request, ctx.stamp)
        .with_description(str_field(operation, "description"))
}

/// Builds a form body from `in: formData` parameters.
///
/// Multipart when the operation consumes `multipart/form-data` or any
/// parameter is a file; urlencoded otherwise.
fn fill_form_body(request: &mut RequestMetaData, params: &[Value], consumes: Option<&Value>) {
    let declares_multipart = consumes
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .any(|ct| ct.starts_with("multipart/form-data"));
    let multipart = declares_multipart || params.iter().any(is_binary);

    for param in params {
        let name = str_field(param, "name");
        if multipart && is_binary(param) {
            request.body.formdata.file.push(FormDataFile::new(name));
        } else if multipart {
            request
                .body
                .formdata
                .text
                .push(KeyValue::new(name, parameter_value(param)));
        } else {
            request
                .body
                .urlencoded
                .push(KeyValue::new(name, parameter_value(param)));
        }
    }

    request.selected_request_body_type = if multipart {
        BodyMode::FormData
    } else {
        BodyMode::UrlEncoded
    };
}

/// `scheme://host + basePath`, or the placeholder when no host is declared.
fn base_url(document: &Value) -> String {
    let host = str_field(document, "host");
    if host.is_empty() {
        return FALLBACK_BASE_URL.to_string();
    }
    let scheme = document
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|schemes| schemes.first())
        .and_then(Value::as_str)
        .unwrap_or("https");
    let base_path = str_field(document, "basePath");
    format!("{scheme}://{host}{}", base_path.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiKeyPlacement, RequestAuth};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stamp() -> AuditStamp {
        AuditStamp::now("tester")
    }

    fn only_request(folders: &FolderMap, folder: &str) -> RequestMetaData {
        folders[folder].items[0].request.clone().unwrap()
    }

    #[test]
    fn test_base_url_from_host() {
        let doc = json!({
            "swagger": "2.0",
            "host": "petstore.swagger.io",
            "basePath": "/v2",
            "schemes": ["http"],
            "paths": { "/pet/{petId}": { "get": { "tags": ["pet"] } } }
        });
        let folders = transform(&doc, &stamp()).unwrap();
        let request = only_request(&folders, "pet");
        assert_eq!(request.url, "http://petstore.swagger.io/v2/pet/{petId}");
        assert_eq!(request.path_params, vec![KeyValue::new("petId", "")]);
    }

    #[test]
    fn test_no_host_uses_placeholder() {
        let doc = json!({ "swagger": "2.0", "paths": { "/a": { "get": {} } } });
        let folders = transform(&doc, &stamp()).unwrap();
        assert_eq!(only_request(&folders, "default").url, "http://localhost:{{port}}/a");
    }

    #[test]
    fn test_inline_query_segment() {
        let doc = json!({
            "swagger": "2.0",
            "paths": { "/search/q=term": { "get": {} } }
        });
        let folders = transform(&doc, &stamp()).unwrap();
        let request = only_request(&folders, "default");
        assert_eq!(request.query_params, vec![KeyValue::new("q", "term")]);
        assert_eq!(request.url, "http://localhost:{{port}}/search/q=term");
    }

    #[test]
    fn test_body_parameter_synthesizes_json() {
        let doc = json!({
            "swagger": "2.0",
            "definitions": {},
            "paths": { "/pet": { "post": {
                "parameters": [{ "in": "body", "name": "body", "schema": {
                    "type": "object",
                    "properties": { "name": { "type": "string", "example": "doggie" }, "photoUrls": { "type": "array" } }
                } }]
            } } }
        });
        let folders = transform(&doc, &stamp()).unwrap();
        let request = only_request(&folders, "default");
        assert_eq!(request.selected_request_body_type, BodyMode::Json);
        let body: Value = serde_json::from_str(&request.body.raw).unwrap();
        assert_eq!(body, json!({ "name": "doggie", "photoUrls": [] }));
    }

    #[test]
    fn test_form_data_parameters() {
        let doc = json!({
            "swagger": "2.0",
            "paths": {
                "/pet/{petId}": { "post": {
                    "consumes": ["application/x-www-form-urlencoded"],
                    "parameters": [
                        { "name": "petId", "in": "path", "type": "integer" },
                        { "name": "name", "in": "formData", "type": "string" },
                        { "name": "status", "in": "formData", "type": "string", "default": "sold" }
                    ]
                } },
                "/pet/{petId}/uploadImage": { "post": {
                    "parameters": [
                        { "name": "additionalMetadata", "in": "formData", "type": "string" },
                        { "name": "file", "in": "formData", "type": "file" }
                    ]
                } }
            }
        });
        let folders = transform(&doc, &stamp()).unwrap();
        let form = folders["default"].items[0].request.clone().unwrap();
        assert_eq!(form.selected_request_body_type, BodyMode::UrlEncoded);
        assert_eq!(
            form.body.urlencoded,
            vec![KeyValue::new("name", ""), KeyValue::new("status", "sold")]
        );

        let upload = folders["default"].items[1].request.clone().unwrap();
        assert_eq!(upload.selected_request_body_type, BodyMode::FormData);
        assert_eq!(
            upload.body.formdata.text,
            vec![KeyValue::new("additionalMetadata", "")]
        );
        assert_eq!(upload.body.formdata.file, vec![FormDataFile::new("file")]);
    }

    #[test]
    fn test_api_key_security_definition() {
        let doc = json!({
            "swagger": "2.0",
            "securityDefinitions": { "api_key": { "type": "apiKey", "name": "api_key", "in": "header" } },
            "paths": { "/store/inventory": { "get": { "security": [{ "api_key": [] }] } } }
        });
        let folders = transform(&doc, &stamp()).unwrap();
        let request = only_request(&folders, "default");
        assert_eq!(request.headers, vec![KeyValue::new("api_key", "")]);
        assert_eq!(
            request.auth,
            RequestAuth::ApiKey {
                auth_key: "api_key".into(),
                auth_value: String::new(),
                add_to: ApiKeyPlacement::Header,
            }
        );
    }
}
