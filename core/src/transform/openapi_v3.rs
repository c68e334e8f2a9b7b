#![deny(missing_docs)]

//! # OpenAPI 3.0 Transformer
//!
//! Turns every path/method pair of an OpenAPI 3.0 document into a request item,
//! grouped into one folder per first tag.
//!
//! - Parameters: path-level merged with operation-level, routed by `in`.
//! - Bodies: `requestBody.content`, preferring JSON, then urlencoded, multipart, octet-stream.
//! - Auth: `security` (operation over document) against `components.securitySchemes`.
//! - Base URL: the first `servers` entry, else a localhost placeholder.

use crate::error::{AppError, AppResult};
use crate::model::{AuditStamp, CollectionItem, HttpMethod, RequestMetaData};
use crate::transform::common::{
    apply_base_url, apply_security, fill_body, grouping_key, merge_parameters, operation_name,
    route_parameter, select_media, str_field, template_path, FolderMap, OperationContext,
    FALLBACK_BASE_URL,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Transforms a (reference-resolved) OpenAPI 3 document into tag folders.
pub fn transform(document: &Value, stamp: &AuditStamp) -> AppResult<FolderMap> {
    let root = document
        .as_object()
        .filter(|root| root.contains_key("components") || root.contains_key("openapi"))
        .ok_or_else(|| {
            AppError::InvalidSpecification("not an OpenAPI 3 document".into())
        })?;

    let schemes = document
        .get("components")
        .and_then(|components| components.get("securitySchemes"));
    let ctx = OperationContext::new(document, schemes, stamp);
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

            let item = build_request(path, method, operation, path_item.get("parameters"), &ctx);
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
    ctx: &OperationContext<'_>,
) -> CollectionItem {
    let template = template_path(path, false);
    let mut request = RequestMetaData::new(method, template.url);
    request.operation_id = str_field(operation, "operationId");
    request.path_params = template.path_params;

    for param in merge_parameters(path_parameters, operation.get("parameters")) {
        if !route_parameter(&mut request, &param) {
            debug!(path, param = %str_field(&param, "name"), "Parameter location not mapped");
        }
    }

    let content = operation
        .get("requestBody")
        .and_then(|body| body.get("content"))
        .and_then(Value::as_object);
    if let Some((kind, media)) = content.and_then(select_media) {
        fill_body(&mut request, kind, media.get("schema"), media.get("example"));
    }

    let security = operation.get("security").or(ctx.security);
    apply_security(&mut request, security, ctx.schemes);
    request.fill_placeholders();

    CollectionItem::request(operation_name(operation, path), request, ctx.stamp)
        .with_description(str_field(operation, "description"))
}

/// First server URL with variables replaced by their defaults.
///
/// Relative server URLs (e.g. `/v1`) hang off the placeholder base.
fn base_url(document: &Value) -> String {
    let Some(server) = document
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
    else {
        return FALLBACK_BASE_URL.to_string();
    };

    let mut url = str_field(server, "url");
    if let Some(variables) = server.get("variables").and_then(Value::as_object) {
        for (name, variable) in variables {
            url = url.replace(&format!("{{{name}}}"), &str_field(variable, "default"));
        }
    }

    if url.is_empty() {
        FALLBACK_BASE_URL.to_string()
    } else if url.starts_with('/') {
        format!("{FALLBACK_BASE_URL}{}", url.trim_end_matches('/'))
    } else {
        url
    }
}
